//! Error tiers: fatal input errors abort a run, item errors only skip one request.

/// The collection or specification is not well-formed enough to process at all.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid collection: {0}")]
    InvalidCollection(String),
    #[error("Invalid specification: {0}")]
    InvalidSpec(String),
    #[error("Specification version is missing (expected an \"openapi\" or \"swagger\" field)")]
    MissingVersion,
    #[error("Unsupported specification version: {0}")]
    UnsupportedSpecVersion(String),
}

/// A single request could not be processed. The walk continues.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("Invalid request shape: {0}")]
    InvalidRequestShape(String),
}
