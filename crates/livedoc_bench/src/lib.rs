//! Benchmark utilities.

use livedoc_core::{fields, Document, DocumentId, Fields};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

/// Subjects used by generated grades.
pub const SUBJECTS: [&str; 6] = [
    "Math",
    "History",
    "Biology",
    "Physics",
    "Art",
    "Literature",
];

/// Generate the fields of a random grade for one of `students` students.
pub fn random_grade(rng: &mut impl Rng, students: usize) -> Fields {
    let subject = SUBJECTS.choose(rng).copied().unwrap_or("Math");
    fields([
        ("studentId", json!(format!("u{}", rng.gen_range(0..students.max(1))))),
        ("subject", json!(subject)),
        ("value", json!(rng.gen_range(4..=12) as f64 / 2.0)),
        ("term", json!(rng.gen_range(1..=2))),
        (
            "date",
            json!(format!(
                "2024-{:02}-{:02}",
                rng.gen_range(1..=12),
                rng.gen_range(1..=28)
            )),
        ),
    ])
}

/// Generate `count` grade documents spread over `students` students.
pub fn generate_grades(count: usize, students: usize) -> Vec<Document> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| Document::new(DocumentId::generate(), random_grade(&mut rng, students)))
        .collect()
}
