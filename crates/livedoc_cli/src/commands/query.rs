//! Query command implementation.

use super::{open_binding, render_documents, runtime, CliResult};
use livedoc_core::Query;
use std::path::Path;

/// Runs the query command.
pub fn run(fixture: &Path, collection: &str, query: Query, format: &str) -> CliResult<()> {
    let rt = runtime()?;
    let output = rt.block_on(async {
        let (_store, binding) = open_binding(fixture, collection, query).await?;
        render(binding.documents(), format)
    })?;
    print!("{output}");
    Ok(())
}

fn render(docs: &[livedoc_core::Document], format: &str) -> CliResult<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(docs)? + "\n"),
        _ => {
            let mut out = render_documents(docs);
            out.push_str(&format!("({} documents)\n", docs.len()));
            Ok(out)
        }
    }
}
