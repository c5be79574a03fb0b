//! Canonical success-response schema selection

use serde_json::{Map, Value};

use crate::spec::{Operation, SpecVersion};

/// Status codes probed for a response schema, highest priority first.
pub const SUCCESS_PRIORITY: &[&str] = &["200", "201", "204", "default"];

const JSON_MEDIA_TYPE: &str = "application/json";

/// Pick the schema the response body is asserted against.
///
/// `None` means no candidate in [`SUCCESS_PRIORITY`] carries a JSON schema;
/// the operation cannot be validated.
#[must_use]
pub fn select_schema<'a>(operation: &Operation<'a>, version: &SpecVersion) -> Option<&'a Value> {
    let responses = operation.responses()?;
    SUCCESS_PRIORITY
        .iter()
        .filter_map(|code| responses.get(*code))
        .find_map(|response| match version {
            SpecVersion::V2 => schema_of(response),
            SpecVersion::V3(_) => response
                .get("content")
                .and_then(Value::as_object)
                .and_then(json_media_schema),
        })
}

/// `application/json` first, then any other JSON media type in document order.
fn json_media_schema(content: &Map<String, Value>) -> Option<&Value> {
    content
        .get(JSON_MEDIA_TYPE)
        .and_then(schema_of)
        .or_else(|| {
            content
                .iter()
                .filter(|(media_type, _)| is_json_media_type(media_type))
                .find_map(|(_, media)| schema_of(media))
        })
}

/// `schema: null` counts as absent.
fn schema_of(holder: &Value) -> Option<&Value> {
    holder.get("schema").filter(|schema| !schema.is_null())
}

/// `application/json`, `application/problem+json`, `text/json; charset=utf-8`, ...
#[must_use]
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some((_, subtype)) => subtype == "json" || subtype.ends_with("+json"),
        None => false,
    }
}
