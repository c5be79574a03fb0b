//! JSON / YAML document reading

use std::path::Path;

use serde_json::Value;

use crate::LoadError;

/// Input formats accepted for collections and specifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Format by file extension; `None` when the extension says nothing.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Content sniffing: a leading `{` or `[` means JSON, anything else YAML.
    #[must_use]
    pub fn sniff(content: &str) -> Self {
        match content.trim_start().chars().next() {
            Some('{' | '[') => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse a document, trusting the extension first and sniffing otherwise.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] on a syntax error.
pub fn parse_document(path: &Path, content: &str) -> Result<Value, LoadError> {
    let format = Format::from_path(path).unwrap_or_else(|| Format::sniff(content));
    match format {
        Format::Json => serde_json::from_str(content)
            .map_err(|e| LoadError::Parse(path.to_path_buf(), format!("Invalid JSON: {e}"))),
        Format::Yaml => serde_yml::from_str(content)
            .map_err(|e| LoadError::Parse(path.to_path_buf(), format!("Invalid YAML: {e}"))),
    }
}

/// Read and parse a JSON or YAML file.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read and [`LoadError::Parse`]
/// on a syntax error.
pub fn read_document(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| LoadError::Io(path.to_path_buf(), e.to_string()))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "read document");
    parse_document(path, &content)
}
