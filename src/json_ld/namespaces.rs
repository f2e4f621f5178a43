//! Namespace prefixes declared by a bundle context.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::vocab::{CONTEXT, GEN_DELIMS, VOCAB};

/// Prefix to namespace IRI table, extracted from a JSON-LD context
/// document. Namespace IRIs are stored normalized, see
/// [`normalize_namespace`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NamespaceContext {
    prefixes: BTreeMap<String, String>,
    vocab: Option<String>,
}

impl NamespaceContext {
    /// Keep the bare prefix entries of the document's `@context`. Entries
    /// whose key contains a colon are property aliases, not namespaces.
    pub(crate) fn extract(document: &JsonValue) -> NamespaceContext {
        let mut result = NamespaceContext::default();
        for context in local_contexts(document) {
            for (key, value) in context {
                if key == VOCAB.as_str() {
                    result.vocab = value.as_str().map(normalize_namespace);
                    continue;
                }
                if let Some(iri) = namespace_iri(context, key, value) {
                    result
                        .prefixes
                        .insert(key.to_owned(), normalize_namespace(iri));
                }
            }
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.vocab.is_none()
    }

    /// Every compact form the expanded `iri` may have been written as,
    /// most specific first: `prefix:local` for each namespace the IRI
    /// starts with (longest namespace first, then by prefix), the
    /// vocabulary relative term, then the IRI itself.
    pub(crate) fn candidates(&self, iri: &str) -> Vec<String> {
        let mut matches: Vec<(&String, &String)> = self
            .prefixes
            .iter()
            .filter(|(_, namespace)| iri.len() > namespace.len() && iri.starts_with(*namespace))
            .collect();
        matches.sort_by(|(a_prefix, a_ns), (b_prefix, b_ns)| {
            b_ns.len().cmp(&a_ns.len()).then_with(|| a_prefix.cmp(b_prefix))
        });

        let mut result: Vec<String> = matches
            .into_iter()
            .map(|(prefix, namespace)| format!("{prefix}:{}", &iri[namespace.len()..]))
            .collect();
        if let Some(local) = self
            .vocab
            .as_deref()
            .and_then(|vocab| iri.strip_prefix(vocab))
            .filter(|local| !local.is_empty())
        {
            result.push(local.to_owned());
        }
        result.push(iri.to_owned());
        result
    }
}

/// Rewrite the namespace entries of a context document to their normalized
/// IRIs so that JSON-LD expansion agrees with [`NamespaceContext`].
pub(crate) fn normalize_context_document(document: &JsonValue) -> JsonValue {
    let mut document = document.clone();
    let Some(context) = document.get_mut(CONTEXT.as_str()) else {
        return document;
    };
    match context {
        JsonValue::Object(map) => normalize_local_context(map),
        JsonValue::Array(array) => {
            for map in array.iter_mut().filter_map(JsonValue::as_object_mut) {
                normalize_local_context(map);
            }
        }
        _ => {}
    }
    document
}

fn normalize_local_context(context: &mut Map<String, JsonValue>) {
    let rewrites: Vec<(String, String)> = context
        .iter()
        .filter_map(|(key, value)| {
            namespace_iri(context, key, value).map(|iri| (key.to_owned(), normalize_namespace(iri)))
        })
        .collect();
    for (prefix, iri) in rewrites {
        match context.get_mut(&prefix) {
            Some(JsonValue::Object(definition)) => {
                definition.insert("@id".to_owned(), JsonValue::String(iri));
            }
            Some(value) => *value = JsonValue::String(iri),
            None => {}
        }
    }
    if let Some(JsonValue::String(vocab)) = context.get_mut(VOCAB.as_str()) {
        *vocab = normalize_namespace(vocab);
    }
}

/// A namespace IRI has to end with a gen-delim to be usable as a prefix,
/// otherwise a `/` is appended.
pub(crate) fn normalize_namespace(iri: &str) -> String {
    if iri.ends_with(GEN_DELIMS) {
        iri.to_owned()
    } else {
        format!("{iri}/")
    }
}

fn local_contexts(document: &JsonValue) -> Vec<&Map<String, JsonValue>> {
    match document.get(CONTEXT.as_str()) {
        Some(JsonValue::Object(map)) => vec![map],
        Some(JsonValue::Array(array)) => array.iter().filter_map(JsonValue::as_object).collect(),
        _ => vec![],
    }
}

/// The namespace IRI declared by a context entry, if the entry is a
/// namespace declaration at all.
fn namespace_iri<'a>(
    context: &Map<String, JsonValue>,
    key: &str,
    value: &'a JsonValue,
) -> Option<&'a str> {
    if key.starts_with('@') || key.contains(':') {
        return None;
    }
    let iri = match value {
        JsonValue::String(iri) => iri.as_str(),
        JsonValue::Object(definition) => definition.get("@id")?.as_str()?,
        _ => return None,
    };
    // "title": "dc11:title" aliases a term through another prefix
    let (scheme, _) = iri.split_once(':')?;
    if scheme.is_empty() || context.contains_key(scheme) || !is_scheme(scheme) {
        return None;
    }
    Some(iri)
}

fn is_scheme(scheme: &str) -> bool {
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
