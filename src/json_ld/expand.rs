use anyhow::{Context as AnyhowContext, Result};
use serde_json::Value as JsonValue;

use super::Term;
use super::context::Context;
use super::vocab::is_keyword;

/// Expand every property key of a node object through the node's own
/// `@context`. Keywords are skipped. Keys come back in document order.
pub(crate) fn expand_keys(document: &JsonValue) -> Result<Vec<(String, Term)>> {
    let context = Context::try_from(document)?;
    let node = document
        .as_object()
        .context("document should be a JSON object")?;
    Ok(node
        .keys()
        .filter(|key| !is_keyword(key))
        .map(|key| (key.to_owned(), context.expand_iri(key)))
        .filter(|(_, expanded)| !expanded.is_keyword())
        .collect())
}
