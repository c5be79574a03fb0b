//! Assertion synthesis
//!
//! Builds assertion descriptors from a matched operation and merges their
//! rendered form into a request's single test event. Every injected block is
//! wrapped in tagged markers:
//!
//! ```text
//! // posv:begin schema-check
//! { ... }
//! // posv:end schema-check
//! ```
//!
//! so that [`MergeStrategy::Replace`] can find and swap blocks from an earlier run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::RequestItem;
use crate::render::{PostmanRenderer, Renderer};

/// Purpose tag of an injected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionKind {
    SchemaCheck,
    StatusCheck,
}

impl AssertionKind {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::SchemaCheck => "schema-check",
            Self::StatusCheck => "status-check",
        }
    }
}

impl std::fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Runtime-independent assertion descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// Response body validates against `schema`, all violations reported.
    ResponseSchema { schema: Value },
    /// Response status is one of `codes`.
    StatusCode { codes: Vec<String> },
}

impl Assertion {
    #[must_use]
    pub fn response_schema(schema: &Value) -> Self {
        Self::ResponseSchema {
            schema: schema.clone(),
        }
    }

    /// Every `2..` response key, in document order. `None` when there is none.
    #[must_use]
    pub fn status_codes(responses: &Map<String, Value>) -> Option<Self> {
        let codes: Vec<String> = responses
            .keys()
            .filter(|code| code.starts_with('2'))
            .cloned()
            .collect();
        (!codes.is_empty()).then_some(Self::StatusCode { codes })
    }

    #[must_use]
    pub const fn kind(&self) -> AssertionKind {
        match self {
            Self::ResponseSchema { .. } => AssertionKind::SchemaCheck,
            Self::StatusCode { .. } => AssertionKind::StatusCheck,
        }
    }
}

/// What happens to blocks injected by an earlier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Always append; re-runs accumulate duplicate blocks.
    #[default]
    Append,
    /// Drop earlier blocks with the same tag, then append.
    Replace,
}

/// Compile-check a schema before it is embedded.
///
/// Uses draft 7, the dialect Ajv compiles by default. Returns the compile
/// error, if any; the assertion is still generated.
#[must_use]
pub fn lint_schema(schema: &Value) -> Option<String> {
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .build(schema)
        .err()
        .map(|e| e.to_string())
}

/// Merges rendered assertions into request items.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer<R = PostmanRenderer> {
    renderer: R,
    merge: MergeStrategy,
}

impl Synthesizer<PostmanRenderer> {
    #[must_use]
    pub fn postman(merge: MergeStrategy) -> Self {
        Self::new(PostmanRenderer, merge)
    }
}

impl<R: Renderer> Synthesizer<R> {
    #[must_use]
    pub fn new(renderer: R, merge: MergeStrategy) -> Self {
        Self { renderer, merge }
    }

    /// Attach one assertion to the item's test event, creating the event if needed.
    pub fn attach(&self, item: &mut RequestItem, assertion: &Assertion) {
        let kind = assertion.kind();
        let (begin, end) = self.markers(kind);

        let mut block = Vec::new();
        block.push(begin);
        block.extend(self.renderer.render(assertion));
        block.push(end);

        let exec = item.test_event_mut().exec_mut();
        if self.merge == MergeStrategy::Replace {
            let removed = self.remove_blocks(exec, kind);
            if removed > 0 {
                tracing::debug!(%kind, removed, "replaced earlier assertion blocks");
            }
        }
        exec.extend(block);
    }

    /// Schema-conformance assertion.
    pub fn add_schema_assertion(&self, item: &mut RequestItem, schema: &Value) {
        self.attach(item, &Assertion::response_schema(schema));
    }

    /// Status-code assertion over the operation's 2xx codes.
    ///
    /// Returns `false` and leaves the item untouched when no 2xx code is declared.
    pub fn add_status_assertion(
        &self,
        item: &mut RequestItem,
        responses: &Map<String, Value>,
    ) -> bool {
        match Assertion::status_codes(responses) {
            Some(assertion) => {
                self.attach(item, &assertion);
                true
            }
            None => false,
        }
    }

    /// Number of blocks opened with this tag.
    #[must_use]
    pub fn count_blocks(&self, exec: &[String], kind: AssertionKind) -> usize {
        let (begin, _) = self.markers(kind);
        exec.iter().filter(|line| line.trim() == begin).count()
    }

    fn markers(&self, kind: AssertionKind) -> (String, String) {
        let comment = self.renderer.line_comment();
        (
            format!("{comment} posv:begin {kind}"),
            format!("{comment} posv:end {kind}"),
        )
    }

    /// Remove every `begin ... end` block with this tag. Unterminated blocks are kept.
    fn remove_blocks(&self, exec: &mut Vec<String>, kind: AssertionKind) -> usize {
        let (begin, end) = self.markers(kind);
        let mut kept = Vec::with_capacity(exec.len());
        let mut removed = 0;
        let mut idx = 0;

        while idx < exec.len() {
            if exec[idx].trim() == begin {
                if let Some(offset) = exec[idx..].iter().position(|l| l.trim() == end) {
                    idx += offset + 1;
                    removed += 1;
                    continue;
                }
            }
            kept.push(exec[idx].clone());
            idx += 1;
        }

        *exec = kept;
        removed
    }
}
