use serde_json::{Map, Value as JsonValue, json};

use crate::catalog::{Catalog, FieldSource, parse_bundle_id};
use crate::json_ld::{CONTEXT, TYPE};
use crate::store::Record;

/// Compact JSON-LD form of a stored record. Each attribute is keyed by the
/// first RDF term its field declares; attributes without one are left out.
pub(super) fn render_record(catalog: &Catalog, url: &str, record: &Record) -> JsonValue {
    let mut document = Map::new();
    let Some((record_type, bundle)) = parse_bundle_id(&record.bundle_id) else {
        return json!({ "@id": url });
    };

    if let Some(context) = catalog
        .context_document(record_type, bundle)
        .and_then(|mut generated| generated.get_mut(CONTEXT.as_str()).map(JsonValue::take))
    {
        document.insert(CONTEXT.as_str().to_owned(), context);
    }
    document.insert("@id".to_owned(), JsonValue::String(url.to_owned()));

    let Some(mapping) = catalog.rdf_mapping(record_type, bundle) else {
        return JsonValue::Object(document);
    };
    if !mapping.types.is_empty() {
        document.insert(TYPE.as_str().to_owned(), json!(mapping.types));
    }
    for (attribute, value) in &record.attributes {
        let Some(term) = mapping
            .field(attribute)
            .and_then(|field| field.properties.first())
        else {
            continue;
        };
        document.insert(term.clone(), JsonValue::String(value.clone()));
    }
    JsonValue::Object(document)
}
