//! posv-core: match Postman requests to OpenAPI operations and author
//! response-validation assertions for them
//!
//! No I/O happens here. Callers hand in an already-parsed, `$ref`-resolved
//! specification and a collection tree; the tree is annotated in place and a
//! coverage report comes back.

pub mod assertion;
pub mod collection;
pub mod config;
pub mod coverage;
pub mod error;
pub mod matcher;
pub mod path;
pub mod render;
pub mod select;
pub mod spec;
pub mod walker;

pub use assertion::{Assertion, AssertionKind, MergeStrategy, Synthesizer};
pub use collection::{Collection, Event, FolderItem, Item, RequestItem, UnreadableItem};
pub use config::{Config, ConfigError};
pub use coverage::{CoverageCounters, CoverageReport, ItemOutcome, ItemReport};
pub use error::{InputError, ItemError};
pub use matcher::{Lookup, MatchPolicy, SpecMatcher};
pub use path::{normalize, resolve_request_path};
pub use render::{PostmanRenderer, Renderer};
pub use select::select_schema;
pub use spec::{Operation, SpecVersion, Specification};
pub use walker::{CollectionWalker, Options, annotate};
