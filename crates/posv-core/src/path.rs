//! Path normalization and request path resolution
//!
//! Both sides of a match are reduced to the same canonical form: every
//! parameter segment becomes [`PLACEHOLDER`], literal segments stay as-is.
//!
//! ```text
//! /users/{id}/posts   →  /users/{}/posts
//! /users/:id/posts    →  /users/{}/posts
//! ["{{host}}", "pets"] → /{}/pets
//! ```

use serde_json::Value;

use crate::error::ItemError;

/// Token that replaces every parameter segment.
pub const PLACEHOLDER: &str = "{}";

/// Normalize a path template so structurally equivalent paths compare equal.
#[must_use]
pub fn normalize(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_parameter(segment) {
                PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `:id` or `{id}`. The bare placeholder `{}` is not a parameter.
fn is_parameter(segment: &str) -> bool {
    let colon = segment.len() > 1 && segment.starts_with(':');
    let braces = segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}');
    colon || braces
}

/// `{{baseUrl}}`-style segments hold environment values, not path structure.
fn is_host_variable(segment: &str) -> bool {
    segment.starts_with("{{")
}

/// Turn a recorded request's `url.path` array into a concrete path string.
///
/// Segments may be plain strings or `{"value": "..."}` objects.
///
/// # Errors
///
/// Returns [`ItemError::InvalidRequestShape`] if `segments` is not an array or
/// holds something other than a string segment.
pub fn resolve_request_path(segments: &Value) -> Result<String, ItemError> {
    let Some(list) = segments.as_array() else {
        return Err(ItemError::InvalidRequestShape(
            "url.path is missing or not an array".into(),
        ));
    };

    let mut parts = Vec::with_capacity(list.len());
    for (idx, segment) in list.iter().enumerate() {
        let text = match segment {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj.get("value").and_then(Value::as_str).ok_or_else(|| {
                ItemError::InvalidRequestShape(format!("url.path[{idx}] has no string value"))
            })?,
            other => {
                return Err(ItemError::InvalidRequestShape(format!(
                    "url.path[{idx}] is not a string: {other}"
                )));
            }
        };
        parts.push(if is_host_variable(text) {
            PLACEHOLDER
        } else {
            text
        });
    }

    Ok(format!("/{}", parts.join("/")))
}
