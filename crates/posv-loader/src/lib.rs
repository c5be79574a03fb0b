//! posv-loader: file-level collaborators of the annotation engine
//!
//! Reads collections and specifications from JSON or YAML, dereferences local
//! `$ref` pointers, and writes the annotated collection back out.

pub mod deref;
pub mod document;
pub mod output;

use std::path::{Path, PathBuf};

use posv_core::{Collection, InputError, Specification};

pub use deref::dereference;
pub use document::{Format, parse_document, read_document};
pub use output::{output_path, write_collection, write_summary};

/// Load a collection file.
///
/// # Errors
///
/// Fails on I/O or syntax errors, or if the document has no `item` array.
pub fn load_collection(path: &Path) -> Result<Collection, LoadError> {
    let document = read_document(path)?;
    let collection = Collection::from_value(document)?;
    tracing::debug!(
        path = %path.display(),
        requests = collection.request_count(),
        "collection loaded"
    );
    Ok(collection)
}

/// Load a specification file and resolve its local references.
///
/// # Errors
///
/// Fails on I/O or syntax errors, a missing or empty `paths` object, or a
/// missing or unsupported version marker.
pub fn load_specification(path: &Path) -> Result<Specification, LoadError> {
    let document = read_document(path)?;
    let spec = Specification::from_value(dereference(&document))?;
    tracing::debug!(
        path = %path.display(),
        version = %spec.version(),
        paths = spec.path_count(),
        "specification loaded"
    );
    Ok(spec)
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Error reading file {0}: {1}")]
    Parse(PathBuf, String),
    #[error(transparent)]
    Input(#[from] InputError),
}
