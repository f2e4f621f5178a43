use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue, json};

use crate::config::RdfMapping;
use crate::json_ld::{CONTEXT, normalize_namespace};

/// Build the JSON-LD context of a bundle: every namespace prefix, plus a
/// compact alias for each mapped property carrying its datatype.
/// Namespaces are served normalized, so that expanding a declared term with
/// this context gives the IRI the resolvers match.
pub(super) fn generate_context(
    namespaces: &BTreeMap<String, String>,
    mapping: Option<&RdfMapping>,
) -> JsonValue {
    let mut context = Map::new();
    for (prefix, iri) in namespaces {
        context.insert(prefix.to_owned(), JsonValue::String(normalize_namespace(iri)));
    }
    let properties = mapping
        .into_iter()
        .flat_map(|mapping| mapping.fields.values())
        .flat_map(|field| {
            field
                .properties
                .iter()
                .map(move |property| (property, field.datatype.as_ref()))
        });
    for (property, datatype) in properties {
        // bare names would shadow namespace prefixes
        if !property.contains(':') || context.contains_key(property) {
            continue;
        }
        let definition = match datatype {
            Some(datatype) => json!({ "@type": datatype }),
            None => json!({ "@id": property }),
        };
        context.insert(property.to_owned(), definition);
    }

    let mut document = Map::new();
    document.insert(CONTEXT.as_str().to_owned(), JsonValue::Object(context));
    JsonValue::Object(document)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;

    use crate::config::test_config;
    use crate::json_ld::{Context, Term};

    use super::generate_context;

    #[test]
    fn context_with_aliases() {
        let config = test_config();
        let mapping = config.bundles[0].rdf_mapping.as_ref();
        let context = generate_context(&config.namespaces, mapping);
        assert_eq!(
            context,
            json!({
                "@context": {
                    "dc11": "http://purl.org/dc/elements/1.1/",
                    "dcterms": "http://purl.org/dc/terms/",
                    "pcdm": "http://pcdm.org/models#",
                    "rdfs": "http://www.w3.org/2000/01/rdf-schema#",
                    "schema": "http://schema.org/",
                    "xsd": "http://www.w3.org/2001/XMLSchema#",
                    "dc11:title": { "@type": "xsd:string" },
                    "rdfs:label": { "@type": "xsd:string" },
                    "dcterms:description": { "@id": "dcterms:description" },
                    "schema:dateCreated": { "@id": "schema:dateCreated" }
                }
            })
        );
    }

    #[test]
    fn context_without_mapping() {
        let config = test_config();
        let context = generate_context(&config.namespaces, None);
        assert_eq!(context["@context"].as_object().map(|c| c.len()), Some(6));
    }

    #[test]
    fn generated_context_is_processable() -> Result<()> {
        let config = test_config();
        let mapping = config.bundles[0].rdf_mapping.as_ref();
        let context = Context::try_from(&generate_context(&config.namespaces, mapping))?;
        assert_eq!(
            context.expand_iri("dc11:title"),
            Term::new_iri("http://purl.org/dc/elements/1.1/title")
        );
        assert_eq!(
            context.expand_iri("schema:dateCreated"),
            Term::new_iri("http://schema.org/dateCreated")
        );
        Ok(())
    }
}
