//! Local `$ref` dereferencing
//!
//! Produces a self-contained document: every `{"$ref": "#/..."}` object is
//! replaced by the value its JSON pointer names. Remote references are left
//! untouched. A reference met again while it is still being expanded is a
//! cycle and becomes the empty schema `{}`.

use serde_json::{Map, Value};

/// Resolve every local `$ref` in `document` against `document` itself.
#[must_use]
pub fn dereference(document: &Value) -> Value {
    let mut expanding = Vec::new();
    resolve_inner(document, document, &mut expanding)
}

/// `expanding` holds the references on the current expansion path.
fn resolve_inner<'a>(value: &'a Value, root: &'a Value, expanding: &mut Vec<&'a str>) -> Value {
    match value {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                if expanding.contains(&reference) {
                    tracing::debug!(reference, "circular $ref replaced by an empty schema");
                    return Value::Object(Map::new());
                }
                return match lookup(reference, root) {
                    Some(target) => {
                        expanding.push(reference);
                        let resolved = resolve_inner(target, root, expanding);
                        expanding.pop();
                        resolved
                    }
                    None => {
                        tracing::debug!(reference, "unresolved $ref left in place");
                        value.clone()
                    }
                };
            }
            let resolved: Map<String, Value> = obj
                .iter()
                .map(|(k, v)| (k.clone(), resolve_inner(v, root, expanding)))
                .collect();
            Value::Object(resolved)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| resolve_inner(v, root, expanding))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// `#/components/schemas/Pet` → the value at `/components/schemas/Pet`.
fn lookup<'a>(reference: &str, root: &'a Value) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(root);
    }
    root.pointer(&percent_decode(pointer))
}

/// URI fragments may percent-encode pointer characters (`%7B` for `{`).
fn percent_decode(fragment: &str) -> String {
    let bytes = fragment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' && idx + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[idx + 1..idx + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                idx += 3;
                continue;
            }
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| fragment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_component_schemas() {
        let doc = json!({
            "paths": {"/pets": {"get": {"responses": {"200": {
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pets"}}}
            }}}}},
            "components": {"schemas": {
                "Pets": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}},
                "Pet": {"type": "object"}
            }}
        });
        let resolved = dereference(&doc);
        assert_eq!(
            resolved["paths"]["/pets"]["get"]["responses"]["200"]["content"]["application/json"]["schema"],
            json!({"type": "array", "items": {"type": "object"}})
        );
    }

    #[test]
    fn resolves_swagger2_definitions_and_responses() {
        let doc = json!({
            "swagger": "2.0",
            "paths": {"/a": {"get": {"responses": {"200": {"$ref": "#/responses/Ok"}}}}},
            "responses": {"Ok": {"schema": {"$ref": "#/definitions/A"}}},
            "definitions": {"A": {"type": "string"}}
        });
        let resolved = dereference(&doc);
        assert_eq!(
            resolved["paths"]["/a"]["get"]["responses"]["200"],
            json!({"schema": {"type": "string"}})
        );
    }

    #[test]
    fn escaped_pointer_segments() {
        let doc = json!({
            "paths": {"/pets/{id}": {"get": {"x": 1}}},
            "ref": {"$ref": "#/paths/~1pets~1%7Bid%7D/get"}
        });
        assert_eq!(dereference(&doc)["ref"], json!({"x": 1}));
    }

    #[test]
    fn remote_and_missing_refs_left_in_place() {
        let doc = json!({
            "a": {"$ref": "other.yaml#/Pet"},
            "b": {"$ref": "#/nowhere"}
        });
        assert_eq!(dereference(&doc), doc);
    }

    #[test]
    fn circular_ref_becomes_empty_schema() {
        let doc = json!({
            "definitions": {"Node": {"type": "object", "properties": {
                "next": {"$ref": "#/definitions/Node"}
            }}},
            "root": {"$ref": "#/definitions/Node"}
        });
        let resolved = dereference(&doc);
        assert_eq!(
            resolved["root"],
            json!({"type": "object", "properties": {"next": {}}})
        );
    }

    #[test]
    fn deep_acyclic_chain_is_fully_resolved() {
        let mut schemas = Map::new();
        for idx in 0..40 {
            schemas.insert(
                format!("S{idx}"),
                json!({"type": "object", "properties": {
                    "child": {"$ref": format!("#/components/schemas/S{}", idx + 1)}
                }}),
            );
        }
        schemas.insert("S40".into(), json!({"type": "string", "title": "leaf"}));
        let doc = json!({
            "components": {"schemas": schemas},
            "root": {"$ref": "#/components/schemas/S0"}
        });

        let resolved = dereference(&doc);
        let text = resolved["root"].to_string();
        assert!(!text.contains("$ref"));
        let mut node = &resolved["root"];
        for _ in 0..40 {
            node = &node["properties"]["child"];
        }
        assert_eq!(node["title"], "leaf");
    }

    #[test]
    fn many_self_references_stay_small() {
        let doc = json!({
            "definitions": {"Node": {"type": "object", "properties": {
                "a": {"$ref": "#/definitions/Node"},
                "b": {"$ref": "#/definitions/Node"},
                "c": {"$ref": "#/definitions/Node"},
                "d": {"type": "array", "items": {"$ref": "#/definitions/Node"}}
            }}},
            "root": {"$ref": "#/definitions/Node"}
        });
        let resolved = dereference(&doc);
        let root = &resolved["root"];
        assert!(!root.to_string().contains("$ref"));
        assert!(root.to_string().len() < 200);
        assert_eq!(root["properties"]["a"], json!({}));
        assert_eq!(root["properties"]["d"]["items"], json!({}));
    }

    #[test]
    fn mutual_recursion_is_cut_at_the_repeat() {
        let doc = json!({
            "definitions": {
                "A": {"properties": {"b": {"$ref": "#/definitions/B"}}},
                "B": {"properties": {"a": {"$ref": "#/definitions/A"}}}
            },
            "root": {"$ref": "#/definitions/A"}
        });
        assert_eq!(
            dereference(&doc)["root"],
            json!({"properties": {"b": {"properties": {"a": {}}}}})
        );
    }

    #[test]
    fn sibling_refs_to_the_same_schema_both_expand() {
        let doc = json!({
            "definitions": {"Id": {"type": "integer"}},
            "pair": {"left": {"$ref": "#/definitions/Id"}, "right": {"$ref": "#/definitions/Id"}}
        });
        assert_eq!(
            dereference(&doc)["pair"],
            json!({"left": {"type": "integer"}, "right": {"type": "integer"}})
        );
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(percent_decode("/a%7Bb%7D"), "/a{b}");
        assert_eq!(percent_decode("/100%"), "/100%");
        assert_eq!(percent_decode("/%zz"), "/%zz");
    }
}
