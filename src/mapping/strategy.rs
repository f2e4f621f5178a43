use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};

use crate::json_ld::{CONTEXT, NamespaceContext, expand_keys, normalize_context_document};

use super::AttributeMapping;

/// Resolves an expanded property IRI to the attribute it belongs to.
pub(crate) trait Resolver: Send {
    fn resolve(&self, iri: &str) -> Option<&str>;
}

/// How incoming IRIs are matched against the declared terms.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Strategy {
    /// Compact the incoming IRI with the namespace prefixes and look the
    /// compact term up.
    #[default]
    Direct,
    /// Expand every declared term through the bundle context and look the
    /// incoming IRI up among the expansions.
    MappingSet,
}

impl Strategy {
    pub(crate) fn build(
        self,
        mapping: &AttributeMapping,
        context_document: &JsonValue,
    ) -> Result<Box<dyn Resolver>> {
        Ok(match self {
            Strategy::Direct => Box::new(DirectMatch::new(
                mapping,
                NamespaceContext::extract(context_document),
            )),
            Strategy::MappingSet => Box::new(MappingSet::new(
                mapping,
                &normalize_context_document(context_document),
            )?),
        })
    }
}

pub(crate) struct DirectMatch {
    namespaces: NamespaceContext,
    /// Term to the declared position and name of its attribute.
    terms: HashMap<String, (usize, String)>,
}

impl DirectMatch {
    pub(crate) fn new(mapping: &AttributeMapping, namespaces: NamespaceContext) -> DirectMatch {
        let mut terms = HashMap::new();
        for (position, (attribute, declared)) in mapping.iter().enumerate() {
            for term in declared {
                terms
                    .entry(term.to_owned())
                    .or_insert_with(|| (position, attribute.to_owned()));
            }
        }
        DirectMatch { namespaces, terms }
    }
}

impl Resolver for DirectMatch {
    /// Several compact forms of one IRI may be declared; the attribute
    /// declared first wins.
    fn resolve(&self, iri: &str) -> Option<&str> {
        self.namespaces
            .candidates(iri)
            .iter()
            .filter_map(|candidate| self.terms.get(candidate))
            .min_by_key(|(position, _)| *position)
            .map(|(_, attribute)| attribute.as_str())
    }
}

pub(crate) struct MappingSet {
    expanded: Vec<String>,
    positions: Vec<usize>,
    attributes: Vec<String>,
}

impl MappingSet {
    /// Expands a synthetic document keyed by every declared term, sorted by
    /// term, so that expanded IRIs and attribute names line up by position.
    /// Terms expanding to the same IRI keep the attribute declared first.
    pub(crate) fn new(mapping: &AttributeMapping, context_document: &JsonValue) -> Result<MappingSet> {
        let mut declared: Vec<(&str, usize, &str)> = mapping
            .iter()
            .enumerate()
            .flat_map(|(position, (attribute, terms))| {
                terms
                    .iter()
                    .map(move |term| (term.as_str(), position, attribute))
            })
            .collect();
        // stable, so the first declared attribute stays first for a shared term
        declared.sort_by(|a, b| a.0.cmp(b.0));
        declared.dedup_by(|later, earlier| later.0 == earlier.0);

        let mut synthetic = Map::new();
        synthetic.insert(
            CONTEXT.as_str().to_owned(),
            context_document
                .get(CONTEXT.as_str())
                .cloned()
                .unwrap_or(JsonValue::Null),
        );
        for (term, _, _) in &declared {
            synthetic.insert((*term).to_owned(), json!([{ "@value": "" }]));
        }

        let by_term: HashMap<&str, (usize, &str)> = declared
            .iter()
            .map(|(term, position, attribute)| (*term, (*position, *attribute)))
            .collect();
        let mut result = MappingSet {
            expanded: Vec::with_capacity(declared.len()),
            positions: Vec::with_capacity(declared.len()),
            attributes: Vec::with_capacity(declared.len()),
        };
        for (key, iri) in expand_keys(&JsonValue::Object(synthetic))? {
            let Some(&(position, attribute)) = by_term.get(key.as_str()) else {
                continue;
            };
            match result.expanded.iter().position(|known| known == iri.as_str()) {
                Some(index) if result.positions[index] <= position => {}
                Some(index) => {
                    result.positions[index] = position;
                    result.attributes[index] = attribute.to_owned();
                }
                None => {
                    result.expanded.push(iri.as_str().to_owned());
                    result.positions.push(position);
                    result.attributes.push(attribute.to_owned());
                }
            }
        }
        Ok(result)
    }
}

impl Resolver for MappingSet {
    fn resolve(&self, iri: &str) -> Option<&str> {
        let position = self.expanded.iter().position(|expanded| expanded == iri)?;
        self.attributes.get(position).map(String::as_str)
    }
}
