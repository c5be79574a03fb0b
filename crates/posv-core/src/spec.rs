//! Resolved OpenAPI / Swagger document view
//!
//! The document arrives fully `$ref`-resolved. Only `paths` and the version
//! marker are interpreted; everything else is carried as raw JSON.

use serde_json::{Map, Value};

use crate::error::InputError;

/// HTTP method keys of a path item. Other keys (`parameters`, `summary`, ...) are not operations.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Response shape discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecVersion {
    /// Swagger 2.0: `responses.<code>.schema`
    V2,
    /// OpenAPI 3.x: `responses.<code>.content.<media type>.schema`
    V3(String),
}

impl SpecVersion {
    /// Parse the `openapi` / `swagger` field value.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnsupportedSpecVersion`] for anything other than
    /// `"2.0"` or a version starting with `"3"`.
    pub fn parse(version: &str) -> Result<Self, InputError> {
        if version == "2.0" {
            Ok(Self::V2)
        } else if version.starts_with('3') {
            Ok(Self::V3(version.to_string()))
        } else {
            Err(InputError::UnsupportedSpecVersion(version.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::V2 => "2.0",
            Self::V3(v) => v,
        }
    }
}

impl std::fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated API specification.
#[derive(Debug, Clone)]
pub struct Specification {
    version: SpecVersion,
    paths: Map<String, Value>,
}

impl Specification {
    /// Build from a resolved document.
    ///
    /// # Errors
    ///
    /// Fails if `paths` is missing, not an object or empty, if no version
    /// marker is present, or if the version is unsupported.
    pub fn from_value(document: Value) -> Result<Self, InputError> {
        let Value::Object(mut root) = document else {
            return Err(InputError::InvalidSpec("document is not an object".into()));
        };

        let version = match root.get("openapi").or_else(|| root.get("swagger")) {
            Some(Value::String(version)) => SpecVersion::parse(version)?,
            // An unquoted `openapi: 3.0` in YAML arrives as a number
            Some(other) => return Err(InputError::UnsupportedSpecVersion(other.to_string())),
            None => return Err(InputError::MissingVersion),
        };

        let paths = match root.remove("paths") {
            Some(Value::Object(paths)) => paths,
            Some(_) => {
                return Err(InputError::InvalidSpec(
                    "the \"paths\" property is not an object".into(),
                ));
            }
            None => {
                return Err(InputError::InvalidSpec(
                    "the \"paths\" property is missing".into(),
                ));
            }
        };
        if paths.is_empty() {
            return Err(InputError::InvalidSpec(
                "the \"paths\" property has no entries".into(),
            ));
        }

        Ok(Self { version, paths })
    }

    #[must_use]
    pub fn version(&self) -> &SpecVersion {
        &self.version
    }

    /// Path templates in document order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Operation for `method` (any case) under an exact path template.
    #[must_use]
    pub fn operation(&self, template: &str, method: &str) -> Option<Operation<'_>> {
        let method = method.to_ascii_lowercase();
        if !HTTP_METHODS.contains(&method.as_str()) {
            return None;
        }
        let (template, path_item) = self.paths.get_key_value(template)?;
        let raw = path_item.get(&method)?;
        Some(Operation {
            method,
            template,
            raw,
        })
    }

    /// Number of operations across all path templates.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.paths
            .values()
            .filter_map(Value::as_object)
            .map(|item| item.keys().filter(|k| HTTP_METHODS.contains(&k.as_str())).count())
            .sum()
    }
}

/// One method's contract entry under one path template.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation<'a> {
    method: String,
    template: &'a str,
    raw: &'a Value,
}

impl<'a> Operation<'a> {
    /// Lower-case HTTP method
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path template as written in the specification
    #[must_use]
    pub fn template(&self) -> &'a str {
        self.template
    }

    /// `responses` keyed by status code (including `"default"`), document order.
    #[must_use]
    pub fn responses(&self) -> Option<&'a Map<String, Value>> {
        self.raw.get("responses").and_then(Value::as_object)
    }

    /// `"GET /pets/{id}"`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method.to_uppercase(), self.template)
    }
}
