//! Writing the annotated collection and the run summary
//!
//! ```text
//! <output_dir>/
//! └── <collection stem>_with_validation.json
//! ```

use std::path::{Path, PathBuf};

use posv_core::{Collection, CoverageReport};
use serde_json::Value;

use crate::LoadError;

/// Suffix appended to the collection's file stem.
pub const OUTPUT_SUFFIX: &str = "_with_validation";

/// `dist/pets.json` → `<output_dir>/pets_with_validation.json`.
#[must_use]
pub fn output_path(collection_path: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = collection_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("collection");
    let file_name = format!("{stem}{OUTPUT_SUFFIX}.json");
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Write the annotated collection as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the directory or file cannot be written.
pub fn write_collection(path: &Path, collection: &Collection) -> Result<(), LoadError> {
    let value = serde_json::to_value(collection)
        .map_err(|e| LoadError::Io(path.to_path_buf(), e.to_string()))?;
    write_json(path, &value)
}

/// Write the run report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the directory or file cannot be written.
pub fn write_summary(path: &Path, report: &CoverageReport) -> Result<(), LoadError> {
    let value = serde_json::to_value(report)
        .map_err(|e| LoadError::Io(path.to_path_buf(), e.to_string()))?;
    write_json(path, &value)
}

fn write_json(path: &Path, value: &Value) -> Result<(), LoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| LoadError::Io(parent.to_path_buf(), e.to_string()))?;
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| LoadError::Io(path.to_path_buf(), e.to_string()))?;
    std::fs::write(path, content).map_err(|e| LoadError::Io(path.to_path_buf(), e.to_string()))?;
    tracing::debug!(path = %path.display(), "wrote document");
    Ok(())
}
