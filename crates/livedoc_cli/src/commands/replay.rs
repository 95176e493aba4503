//! Replay command implementation.
//!
//! A script is a JSON array of operations applied in order through a live
//! binding:
//!
//! ```json
//! [
//!   { "op": "create", "fields": { "title": "Essay", "status": "pending" } },
//!   { "op": "update", "id": "h1", "fields": { "status": "submitted" } },
//!   { "op": "delete", "id": "h1" }
//! ]
//! ```
//!
//! After every operation the binding applies whatever the store delivered,
//! so the report shows exactly which writes changed the bound snapshot.

use super::{open_binding, render_documents, runtime, CliResult};
use livedoc_binding::LiveBinding;
use livedoc_core::{DocumentId, Fields, Query};
use livedoc_store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One scripted write.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ScriptOp {
    /// Create a document.
    Create {
        /// Field values.
        fields: Fields,
    },
    /// Merge fields into a document.
    Update {
        /// Target document.
        id: DocumentId,
        /// Field values.
        fields: Fields,
    },
    /// Delete a document.
    Delete {
        /// Target document.
        id: DocumentId,
    },
}

impl ScriptOp {
    fn label(&self) -> String {
        match self {
            ScriptOp::Create { .. } => "create".to_string(),
            ScriptOp::Update { id, .. } => format!("update {id}"),
            ScriptOp::Delete { id } => format!("delete {id}"),
        }
    }
}

/// Outcome of one scripted write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// 1-based position in the script.
    pub step: usize,
    /// Operation and target.
    pub op: String,
    /// `ok`, `ok <id>` or the error message.
    pub outcome: String,
    /// Whether the bound snapshot changed.
    pub changed: bool,
    /// Store sequence of the current snapshot.
    pub sequence: Option<u64>,
    /// Size of the current snapshot.
    pub documents: usize,
}

/// Parses a script.
pub fn parse_script(text: &str) -> CliResult<Vec<ScriptOp>> {
    Ok(serde_json::from_str(text)?)
}

/// Applies `ops` through `binding`, one at a time.
///
/// Failed writes are reported and the replay continues.
pub async fn replay<S: DocumentStore>(
    binding: &mut LiveBinding<S>,
    ops: Vec<ScriptOp>,
) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(ops.len());
    for (index, op) in ops.into_iter().enumerate() {
        let label = op.label();
        let outcome = match op {
            ScriptOp::Create { fields } => binding.create(fields).await.map(|id| format!("ok {id}")),
            ScriptOp::Update { id, fields } => {
                binding.update(&id, fields).await.map(|()| "ok".to_string())
            }
            ScriptOp::Delete { id } => binding.delete(&id).await.map(|()| "ok".to_string()),
        };
        let changed = binding.pump() > 0;
        reports.push(StepReport {
            step: index + 1,
            op: label,
            outcome: outcome.unwrap_or_else(|err| format!("error: {err}")),
            changed,
            sequence: binding.sequence(),
            documents: binding.documents().len(),
        });
    }
    reports
}

/// Runs the replay command.
pub fn run(
    fixture: &Path,
    collection: &str,
    query: Query,
    script: &Path,
    format: &str,
) -> CliResult<()> {
    let ops = parse_script(&std::fs::read_to_string(script)?)?;
    let rt = runtime()?;
    let (reports, final_docs) = rt.block_on(async {
        let (_store, mut binding) = open_binding(fixture, collection, query).await?;
        let reports = replay(&mut binding, ops).await;
        CliResult::Ok((reports, binding.snapshot()))
    })?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        _ => {
            for report in &reports {
                let change = match (report.changed, report.sequence) {
                    (true, Some(sequence)) => {
                        format!("seq {sequence}: {} documents", report.documents)
                    }
                    _ => "no change".to_string(),
                };
                println!("[{}] {} -> {}; {change}", report.step, report.op, report.outcome);
            }
            print!("{}", render_documents(&final_docs));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedoc_store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn parses_tagged_operations() {
        let ops = parse_script(
            r#"[{"op": "create", "fields": {"title": "Essay"}},
                {"op": "update", "id": "h1", "fields": {"status": "submitted"}},
                {"op": "delete", "id": "h1"}]"#,
        )
        .unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2], ScriptOp::Delete { id: "h1".into() });
        assert!(parse_script(r#"[{"op": "upsert"}]"#).is_err());
    }

    #[tokio::test]
    async fn replay_reports_each_step() {
        let store = Arc::new(
            MemoryStore::from_fixture_str(r#"{"homework": [{"id": "h1", "status": "pending"}]}"#)
                .unwrap(),
        );
        let mut binding = LiveBinding::new(Arc::clone(&store));
        binding.subscribe("homework", Query::new().where_eq("status", "pending"));
        binding.settle().await;

        let ops = parse_script(
            r#"[{"op": "update", "id": "h1", "fields": {"status": "submitted"}},
                {"op": "update", "id": "x", "fields": {"status": "submitted"}},
                {"op": "create", "fields": {"status": "graded"}},
                {"op": "create", "fields": {"status": "pending"}}]"#,
        )
        .unwrap();
        let reports = replay(&mut binding, ops).await;

        let summary: Vec<(bool, usize)> =
            reports.iter().map(|r| (r.changed, r.documents)).collect();
        assert_eq!(summary, [(true, 0), (false, 0), (false, 0), (true, 1)]);
        assert!(reports[1].outcome.starts_with("error: document x not found"));
        assert!(reports[3].outcome.starts_with("ok "));
        assert_eq!(reports[3].sequence, Some(store.sequence()));
    }
}
