//! Postman collection tree
//!
//! Folders and requests share one JSON shape in the source format and are told
//! apart by the presence of a child `item` list. Fields this crate does not
//! interpret are kept in `extra` so the document round-trips.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{InputError, ItemError};

/// Root document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub item: Vec<Item>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    /// Decode a collection document.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidCollection`] if `item` is missing or not an
    /// array, or if a node cannot be decoded.
    pub fn from_value(document: Value) -> Result<Self, InputError> {
        match document.get("item") {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(InputError::InvalidCollection(
                    "the \"item\" property is not an array".into(),
                ));
            }
            None => {
                return Err(InputError::InvalidCollection(
                    "the \"item\" property is missing".into(),
                ));
            }
        }
        serde_json::from_value(document).map_err(|e| InputError::InvalidCollection(e.to_string()))
    }

    /// Number of request leaves in the whole tree.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.item.iter().map(Item::request_count).sum()
    }

    /// Collection name from `info.name`, if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.extra
            .get("info")
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
    }
}

/// A node of the request tree.
///
/// Decoding never fails: a node that is neither a folder nor a readable
/// request is kept verbatim as [`Item::Unreadable`] and reported per item.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Item {
    Folder(FolderItem),
    Request(RequestItem),
    Unreadable(UnreadableItem),
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

impl Item {
    /// Classify one node. An `item` array makes a folder, anything else is a request.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::Unreadable(UnreadableItem::new(value, "node is not an object"));
        };
        match fields.remove("item") {
            Some(Value::Array(children)) => {
                let name = match fields.remove("name") {
                    Some(Value::String(name)) => Some(name),
                    Some(other) => {
                        fields.insert("name".into(), other);
                        None
                    }
                    None => None,
                };
                Self::Folder(FolderItem {
                    name,
                    item: children.into_iter().map(Self::from_value).collect(),
                    extra: fields,
                })
            }
            Some(other) => {
                fields.insert("item".into(), other);
                Self::Unreadable(UnreadableItem::new(
                    Value::Object(fields),
                    "the \"item\" property is not an array",
                ))
            }
            None => {
                let raw = Value::Object(fields);
                match RequestItem::deserialize(&raw) {
                    Ok(request) => Self::Request(request),
                    Err(e) => {
                        tracing::debug!(error = %e, "request node kept verbatim");
                        Self::Unreadable(UnreadableItem::new(raw, e.to_string()))
                    }
                }
            }
        }
    }

    fn request_count(&self) -> usize {
        match self {
            Self::Folder(folder) => folder.item.iter().map(Self::request_count).sum(),
            Self::Request(_) | Self::Unreadable(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub item: Vec<Item>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A node that could not be decoded. Written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UnreadableItem {
    pub raw: Value,
    #[serde(skip)]
    pub reason: String,
}

impl UnreadableItem {
    fn new(raw: Value, reason: impl Into<String>) -> Self {
        Self {
            raw,
            reason: reason.into(),
        }
    }

    /// The node's `name` when it is a string.
    #[must_use]
    pub fn label(&self) -> String {
        self.raw
            .get("name")
            .and_then(Value::as_str)
            .map_or_else(|| "<unreadable item>".to_string(), str::to_string)
    }
}

/// One recorded HTTP call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Decoded on demand by [`RequestItem::details`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Vec<Event>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

static NO_PATH: Value = Value::Null;

/// Method and URL pieces of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDetails<'a> {
    pub method: &'a str,
    /// `url.path`, not yet resolved
    pub path: &'a Value,
    /// `url.raw`, for diagnostics
    pub raw_url: Option<&'a str>,
}

impl RequestItem {
    /// Extract method and path segments.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::InvalidRequestShape`] if the request or its method
    /// is missing.
    pub fn details(&self) -> Result<RequestDetails<'_>, ItemError> {
        let request = self
            .request
            .as_ref()
            .filter(|r| r.is_object())
            .ok_or_else(|| ItemError::InvalidRequestShape("request is not an object".into()))?;
        let method = request
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| ItemError::InvalidRequestShape("request.method is missing".into()))?;
        let url = request.get("url");
        let path = url.and_then(|u| u.get("path")).unwrap_or(&NO_PATH);
        let raw_url = url.and_then(|u| match u {
            Value::String(s) => Some(s.as_str()),
            other => other.get("raw").and_then(Value::as_str),
        });
        Ok(RequestDetails {
            method,
            path,
            raw_url,
        })
    }

    /// `"GET {{host}}/pets/1"`. Best effort, never fails.
    #[must_use]
    pub fn label(&self) -> String {
        match self.details() {
            Ok(d) => format!("{} {}", d.method, d.raw_url.unwrap_or("<no url>")),
            Err(_) => self.name.clone().unwrap_or_else(|| "<unnamed request>".into()),
        }
    }

    /// The single `listen == "test"` event, if any.
    #[must_use]
    pub fn test_event(&self) -> Option<&Event> {
        self.event.as_ref()?.iter().find(|e| e.is_test())
    }

    /// The test event, created empty when absent.
    pub fn test_event_mut(&mut self) -> &mut Event {
        let events = self.event.get_or_insert_with(Vec::new);
        let idx = match events.iter().position(Event::is_test) {
            Some(idx) => idx,
            None => {
                events.push(Event::test(Vec::new()));
                events.len() - 1
            }
        };
        &mut events[idx]
    }
}

pub const TEST_LISTEN: &str = "test";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub listen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// A new JavaScript test event.
    #[must_use]
    pub fn test(exec: Vec<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("type".into(), Value::String("text/javascript".into()));
        Self {
            listen: TEST_LISTEN.into(),
            script: Some(Script {
                exec,
                extra,
            }),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn is_test(&self) -> bool {
        self.listen == TEST_LISTEN
    }

    /// Script lines, empty when no script is attached.
    #[must_use]
    pub fn exec(&self) -> &[String] {
        self.script
            .as_ref()
            .map(|s| s.exec.as_slice())
            .unwrap_or_default()
    }

    pub fn exec_mut(&mut self) -> &mut Vec<String> {
        &mut self
            .script
            .get_or_insert_with(|| Script {
                exec: Vec::new(),
                extra: Map::new(),
            })
            .exec
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, deserialize_with = "exec_lines")]
    pub exec: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `exec` is usually a line array but a single string is also valid.
fn exec_lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Exec {
        Lines(Vec<String>),
        Text(String),
    }

    Ok(match Exec::deserialize(deserializer)? {
        Exec::Lines(lines) => lines,
        Exec::Text(text) => text.lines().map(str::to_string).collect(),
    })
}
