use serde_json::Value as JsonValue;

use crate::json_ld::VALUE;

use super::CreationError;

/// Reads the scalar payload of the first value object of a property,
/// `value[0]["@value"]`. An explicit `null` payload is `None`: the
/// attribute is left without a value.
pub(crate) fn extract_scalar(
    property: &str,
    value: &JsonValue,
) -> Result<Option<String>, CreationError> {
    let scalar = value
        .as_array()
        .and_then(|values| values.first())
        .and_then(|first| first.get(VALUE.as_str()));
    match scalar {
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(n @ JsonValue::Number(_)) => Ok(Some(n.to_string())),
        Some(JsonValue::Bool(b)) => Ok(Some(b.to_string())),
        Some(JsonValue::Null) => Ok(None),
        _ => Err(CreationError::Resolution {
            property: property.to_owned(),
        }),
    }
}
