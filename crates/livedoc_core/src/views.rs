//! Derived views over a snapshot.
//!
//! Pure functions recomputed from the current sequence of a binding every
//! time they are needed. Nothing here caches: snapshots are small and a
//! recomputation is always consistent with the sequence it was given.

use crate::document::Document;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Documents sharing one value of the grouping field.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    /// Value of the grouping field.
    pub key: String,
    /// Members, in snapshot order.
    pub documents: Vec<&'a Document>,
}

/// Average of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverage {
    /// Value of the grouping field.
    pub key: String,
    /// Mean of the numeric field over the group.
    pub average: f64,
    /// Number of values averaged.
    pub count: usize,
}

/// Groups documents by a field, in order of first appearance.
///
/// Documents without a scalar value for `field` are left out.
pub fn group_by<'a>(docs: &'a [Document], field: &str) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    for doc in docs {
        let Some(key) = doc.field_text(field) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.documents.push(doc),
            None => groups.push(Group {
                key,
                documents: vec![doc],
            }),
        }
    }
    groups
}

/// Mean of a numeric field; `None` when no document has a number there.
pub fn average<'a, I>(docs: I, field: &str) -> Option<f64>
where
    I: IntoIterator<Item = &'a Document>,
{
    let (sum, count) = docs
        .into_iter()
        .filter_map(|doc| doc.get_f64(field))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean of all values, ignoring groups.
pub fn overall_average(docs: &[Document], field: &str) -> Option<f64> {
    average(docs, field)
}

/// Per-group averages of `value_field`, grouped by `group_field`.
///
/// Groups with no numeric values are omitted.
pub fn group_averages(docs: &[Document], group_field: &str, value_field: &str) -> Vec<GroupAverage> {
    group_by(docs, group_field)
        .into_iter()
        .filter_map(|group| {
            let count = group
                .documents
                .iter()
                .filter(|d| d.get_f64(value_field).is_some())
                .count();
            average(group.documents.iter().copied(), value_field).map(|average| GroupAverage {
                key: group.key,
                average,
                count,
            })
        })
        .collect()
}

/// Mean of the group means, each group weighted equally.
pub fn average_of_groups(groups: &[GroupAverage]) -> Option<f64> {
    if groups.is_empty() {
        return None;
    }
    Some(groups.iter().map(|g| g.average).sum::<f64>() / groups.len() as f64)
}

/// Case-insensitive substring search across several text fields.
///
/// An empty needle matches everything.
pub fn search<'a>(docs: &'a [Document], needle: &str, fields: &[&str]) -> Vec<&'a Document> {
    let needle = needle.to_lowercase();
    docs.iter()
        .filter(|doc| {
            needle.is_empty()
                || fields.iter().any(|field| {
                    doc.field_text(field)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
        })
        .collect()
}

/// Splits documents by the value of a status-like field.
///
/// Documents without the field land under the empty key.
pub fn partition_by<'a>(docs: &'a [Document], field: &str) -> BTreeMap<String, Vec<&'a Document>> {
    let mut parts: BTreeMap<String, Vec<&'a Document>> = BTreeMap::new();
    for doc in docs {
        let key = doc.field_text(field).unwrap_or_default();
        parts.entry(key).or_default().push(doc);
    }
    parts
}

/// Counts documents whose `field` renders as `value`.
pub fn count_where(docs: &[Document], field: &str, value: &str) -> usize {
    docs.iter()
        .filter(|doc| doc.field_text(field).as_deref() == Some(value))
        .count()
}

/// Documents whose date field is at or after `now`.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
/// Documents with a missing or unparseable date are left out.
pub fn upcoming<'a>(docs: &'a [Document], field: &str, now: DateTime<Utc>) -> Vec<&'a Document> {
    docs.iter()
        .filter(|doc| {
            doc.get_str(field)
                .and_then(parse_instant)
                .is_some_and(|at| at >= now)
        })
        .collect()
}

/// The `n` newest documents by a timestamp field, newest first.
pub fn most_recent<'a>(docs: &'a [Document], field: &str, n: usize) -> Vec<&'a Document> {
    let mut dated: Vec<(DateTime<Utc>, &Document)> = docs
        .iter()
        .filter_map(|doc| doc.get_str(field).and_then(parse_instant).map(|at| (at, doc)))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
    dated.into_iter().take(n).map(|(_, doc)| doc).collect()
}

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` date.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Quality band of a mark on the 2..6 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeBand {
    /// Below 4.
    Poor,
    /// From 4 up to 5.5.
    Satisfactory,
    /// 5.5 and above.
    Excellent,
}

impl GradeBand {
    /// Classifies an average or a single mark.
    pub fn classify(value: f64) -> Self {
        if value >= 5.5 {
            GradeBand::Excellent
        } else if value >= 4.0 {
            GradeBand::Satisfactory
        } else {
            GradeBand::Poor
        }
    }
}
