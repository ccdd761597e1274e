//! Rendering of stored client metadata into the FDX registration response.

use serde_json::{Map, Value};

use crate::errors::RegistrationError;

use super::types::RegistrationResponse;

/// Promote embedded JSON-object strings to structured values.
///
/// Stored metadata flattens complex attributes (registry references among
/// them) into strings; any list-valued entry whose elements look like JSON
/// objects is re-parsed in place so the rendered response carries nested
/// JSON rather than JSON-inside-a-string. Elements that fail to parse stay
/// as they were.
pub(crate) fn promote_embedded_json(metadata: &mut Map<String, Value>) {
    for value in metadata.values_mut() {
        if let Value::Array(elements) = value {
            for element in elements.iter_mut() {
                if let Some(promoted) = promote_json_string(element) {
                    *element = promoted;
                }
            }
        }
    }
}

fn promote_json_string(value: &Value) -> Option<Value> {
    let text = value.as_str()?;
    if !text.contains('{') {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(parsed @ Value::Object(_)) => Some(parsed),
        _ => None,
    }
}

/// Serialize the metadata map through the FDX registration response schema,
/// dropping stored attributes the schema does not carry.
pub(crate) fn render_response(metadata: Map<String, Value>) -> Result<String, RegistrationError> {
    let response: RegistrationResponse = serde_json::from_value(Value::Object(metadata))
        .map_err(|err| RegistrationError::ResponseSerialization(err.to_string()))?;
    serde_json::to_string(&response)
        .map_err(|err| RegistrationError::ResponseSerialization(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const REGISTRY_REFERENCE: &str = r#"{
        "registered_entity_name": "Data recipient company legal name",
        "registered_entity_id": "4HCHXIURY78NNH6JH",
        "registry": "GLIEF"
    }"#;

    #[test]
    fn test_json_strings_in_lists_promoted_to_objects() {
        let mut metadata = json!({
            "registry_references": [REGISTRY_REFERENCE],
            "contacts": ["support@example.net"]
        })
        .as_object()
        .unwrap()
        .clone();

        promote_embedded_json(&mut metadata);

        let references = metadata["registry_references"].as_array().unwrap();
        assert!(references[0].is_object());
        assert_eq!(
            references[0]["registered_entity_id"],
            json!("4HCHXIURY78NNH6JH")
        );
        // Plain strings stay as they were.
        assert_eq!(metadata["contacts"], json!(["support@example.net"]));
    }

    #[test]
    fn test_unparseable_braced_string_left_alone() {
        let mut metadata = json!({
            "notes": ["{not json"]
        })
        .as_object()
        .unwrap()
        .clone();

        promote_embedded_json(&mut metadata);
        assert_eq!(metadata["notes"], json!(["{not json"]));
    }

    #[test]
    fn test_rendered_response_is_nested_json() {
        let mut metadata = json!({
            "client_id": "AAAAAA",
            "client_name": "My Example Client",
            "registry_references": [REGISTRY_REFERENCE]
        })
        .as_object()
        .unwrap()
        .clone();

        promote_embedded_json(&mut metadata);
        let rendered = render_response(metadata).unwrap();

        assert!(rendered.contains("\"registry\":\"GLIEF\""));
        assert!(!rendered.contains("\\\"registry\\\""));
    }
}
