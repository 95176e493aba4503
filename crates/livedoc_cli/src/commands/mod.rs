//! CLI command implementations.

pub mod averages;
pub mod query;
pub mod replay;

use livedoc_binding::{BindingState, LiveBinding};
use livedoc_core::{Direction, Document, Filter, Query};
use livedoc_store::MemoryStore;
use std::path::Path;
use std::sync::Arc;

/// Boxed error returned by every command.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Builds a query from `--where`, `--order-by` and `--limit` arguments.
pub fn build_query(
    filters: &[String],
    order_by: Option<&str>,
    limit: Option<usize>,
) -> CliResult<Query> {
    let mut query = Query::new();
    for expr in filters {
        query = query.filter(expr.parse::<Filter>()?);
    }
    if let Some(order) = order_by {
        let (field, direction) = parse_order(order)?;
        query = query.order_by(field, direction);
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query.validate()?;
    Ok(query)
}

/// Parses `field`, `field:asc` or `field:desc`.
pub fn parse_order(order: &str) -> CliResult<(String, Direction)> {
    let (field, direction) = match order.rsplit_once(':') {
        Some((field, "asc")) => (field, Direction::Ascending),
        Some((field, "desc")) => (field, Direction::Descending),
        Some((_, other)) => return Err(format!("unknown sort direction `{other}`").into()),
        None => (order, Direction::Ascending),
    };
    if field.is_empty() {
        return Err("order-by field must not be empty".into());
    }
    Ok((field.to_string(), direction))
}

/// Loads a fixture and binds `collection` under `query`.
///
/// Waits for the first delivery; a failed subscription is returned as an
/// error.
pub async fn open_binding(
    fixture: &Path,
    collection: &str,
    query: Query,
) -> CliResult<(Arc<MemoryStore>, LiveBinding<MemoryStore>)> {
    let store = Arc::new(MemoryStore::load_fixture(fixture)?);
    tracing::debug!(
        fixture = %fixture.display(),
        documents = store.len(collection),
        "fixture loaded"
    );

    let mut binding = LiveBinding::new(Arc::clone(&store));
    binding.subscribe(collection, query);
    if binding.settle().await == BindingState::Error {
        if let Some(err) = binding.error() {
            return Err(err.clone().into());
        }
    }
    Ok((store, binding))
}

/// Builds the single-threaded runtime every command runs on.
pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// One line per document: id followed by `field=value` pairs.
pub fn render_documents(docs: &[Document]) -> String {
    let mut out = String::new();
    for doc in docs {
        out.push_str(doc.id.as_str());
        for (name, value) in &doc.fields {
            out.push_str("  ");
            out.push_str(name);
            out.push('=');
            out.push_str(&value.to_string());
        }
        out.push('\n');
    }
    out
}
