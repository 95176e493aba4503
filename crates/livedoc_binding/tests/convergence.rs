//! Property tests: a binding always converges on the store's matching set.

use livedoc_binding::{BindingConfig, LiveBinding};
use livedoc_core::{fields, Direction, Document, DocumentId, Query};
use livedoc_store::MemoryStore;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Create { student: u8, value: u8 },
    Update { slot: usize, value: u8 },
    Delete { slot: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, 2u8..7).prop_map(|(student, value)| Op::Create { student, value }),
        (0usize..8, 2u8..7).prop_map(|(slot, value)| Op::Update { slot, value }),
        (0usize..8).prop_map(|slot| Op::Delete { slot }),
    ]
}

fn expected(store: &MemoryStore, created: &[DocumentId], query: &Query) -> Vec<Document> {
    let docs: Vec<Document> = created
        .iter()
        .filter_map(|id| store.document("grades", id).ok().flatten())
        .collect();
    query.apply(&docs)
}

proptest! {
    #[test]
    fn binding_matches_store_after_every_delivery(ops in prop::collection::vec(op(), 1..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let query = Query::new()
                .where_eq("studentId", "s0")
                .order_by("value", Direction::Ascending);
            let mut binding = LiveBinding::new(Arc::clone(&store)).with_config(BindingConfig::quiet());
            binding.subscribe("grades", query.clone());
            binding.settle().await;

            let mut created: Vec<DocumentId> = Vec::new();
            for op in ops {
                match op {
                    Op::Create { student, value } => {
                        let id = binding
                            .create(fields([
                                ("studentId", json!(format!("s{student}"))),
                                ("value", json!(value)),
                            ]))
                            .await
                            .unwrap();
                        created.push(id);
                    }
                    Op::Update { slot, value } => {
                        if let Some(id) = created.get(slot) {
                            // Updating a deleted document is allowed to fail.
                            let _ = binding.update(id, fields([("value", json!(value))])).await;
                        }
                    }
                    Op::Delete { slot } => {
                        if let Some(id) = created.get(slot) {
                            binding.delete(id).await.unwrap();
                        }
                    }
                }
                binding.pump();
                prop_assert_eq!(binding.documents().to_vec(), expected(&store, &created, &query));
            }
            Ok(())
        })?;
    }
}
