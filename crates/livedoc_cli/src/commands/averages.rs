//! Averages command implementation.

use super::{open_binding, runtime, CliResult};
use livedoc_core::views::{
    average_of_groups, group_averages, overall_average, GradeBand, GroupAverage,
};
use livedoc_core::{Document, Query};
use serde::Serialize;
use std::path::Path;

/// Averages of one bound snapshot.
#[derive(Debug, Serialize)]
pub struct AveragesReport {
    /// Number of documents in the snapshot.
    pub documents: usize,
    /// Per-group averages, in order of first appearance.
    pub groups: Vec<GroupAverage>,
    /// Mean of all values.
    pub overall: Option<f64>,
    /// Mean of the group means.
    pub mean_of_groups: Option<f64>,
    /// Band of the mean of the group means.
    pub band: Option<GradeBand>,
}

impl AveragesReport {
    /// Computes the report for a snapshot.
    pub fn compute(docs: &[Document], group_by: &str, field: &str) -> Self {
        let groups = group_averages(docs, group_by, field);
        let mean_of_groups = average_of_groups(&groups);
        Self {
            documents: docs.len(),
            overall: overall_average(docs, field),
            band: mean_of_groups.map(GradeBand::classify),
            mean_of_groups,
            groups,
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        for group in &self.groups {
            out.push_str(&format!(
                "{:<20} {:>6.2}  ({} values)\n",
                group.key, group.average, group.count
            ));
        }
        match (self.overall, self.mean_of_groups) {
            (Some(overall), Some(mean)) => {
                out.push_str(&format!("overall          {overall:>10.2}\n"));
                out.push_str(&format!("mean of groups   {mean:>10.2}\n"));
            }
            _ => out.push_str("no numeric values\n"),
        }
        out
    }
}

/// Runs the averages command.
pub fn run(
    fixture: &Path,
    collection: &str,
    query: Query,
    group_by: &str,
    field: &str,
    format: &str,
) -> CliResult<()> {
    let rt = runtime()?;
    let report = rt.block_on(async {
        let (_store, binding) = open_binding(fixture, collection, query).await?;
        CliResult::Ok(AveragesReport::compute(binding.documents(), group_by, field))
    })?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", report.render_text()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedoc_core::fields;
    use serde_json::json;

    fn grade(id: &str, subject: &str, value: f64) -> Document {
        Document::new(id, fields([("subject", json!(subject)), ("value", json!(value))]))
    }

    #[test]
    fn report_over_two_subjects() {
        let docs = vec![
            grade("g1", "Math", 5.5),
            grade("g2", "Math", 4.0),
            grade("g3", "History", 6.0),
        ];
        let report = AveragesReport::compute(&docs, "subject", "value");
        assert_eq!(report.documents, 3);
        assert_eq!(report.groups[0].average, 4.75);
        assert_eq!(report.mean_of_groups, Some(5.375));
        assert_eq!(report.band, Some(GradeBand::Satisfactory));

        let text = report.render_text();
        assert!(text.contains("Math"));
        assert!(text.contains("4.75"));
    }

    #[test]
    fn empty_snapshot() {
        let report = AveragesReport::compute(&[], "subject", "value");
        assert!(report.groups.is_empty());
        assert_eq!(report.band, None);
        assert_eq!(report.render_text(), "no numeric values\n");
    }
}
