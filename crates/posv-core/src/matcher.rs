//! Request → specification operation matching
//!
//! Both paths are normalized, then compared segment by segment. A placeholder
//! segment on either side stands for exactly one non-empty segment; literal
//! segments must be equal. When several templates match, the most specific
//! one wins (full-length over prefix, longer shared run, more literal
//! segments); remaining ties go to the template listed first in the document.

use serde::{Deserialize, Serialize};

use crate::path::{PLACEHOLDER, normalize};
use crate::spec::{Operation, Specification};

/// How a request path is compared against path templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Same number of segments, every segment matching.
    #[default]
    Strict,
    /// Also accept when one path is a segment-prefix of the other.
    Prefix,
}

/// Ranking of a candidate template; greater is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Specificity {
    full_length: bool,
    shared: usize,
    literal: usize,
}

impl MatchPolicy {
    fn rank(self, request: &[&str], template: &[&str]) -> Option<Specificity> {
        let full_length = request.len() == template.len();
        if !full_length && self == Self::Strict {
            return None;
        }

        let shared = request.len().min(template.len());
        let mut literal = 0;
        for (r, t) in request.iter().zip(template) {
            if r == t && *r != PLACEHOLDER {
                literal += 1;
            } else if !segment_matches(r, t) {
                return None;
            }
        }

        Some(Specificity {
            full_length,
            shared,
            literal,
        })
    }
}

fn segment_matches(request: &str, template: &str) -> bool {
    request == template
        || (template == PLACEHOLDER && !request.is_empty())
        || (request == PLACEHOLDER && !template.is_empty())
}

/// Result of looking up one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Matched(Operation<'a>),
    /// No template matched the path.
    PathNotFound,
    /// A template matched but does not define the method.
    MethodNotDefined { template: &'a str },
}

impl<'a> Lookup<'a> {
    #[must_use]
    pub fn into_operation(self) -> Option<Operation<'a>> {
        match self {
            Self::Matched(op) => Some(op),
            _ => None,
        }
    }
}

struct Entry<'a> {
    normalized: String,
    template: &'a str,
}

impl Entry<'_> {
    fn segments(&self) -> Vec<&str> {
        self.normalized.split('/').collect()
    }
}

/// Normalized path table built once per specification.
pub struct SpecMatcher<'a> {
    spec: &'a Specification,
    policy: MatchPolicy,
    table: Vec<Entry<'a>>,
}

impl<'a> SpecMatcher<'a> {
    #[must_use]
    pub fn new(spec: &'a Specification, policy: MatchPolicy) -> Self {
        let mut table: Vec<Entry<'a>> = Vec::with_capacity(spec.path_count());
        for template in spec.templates() {
            let normalized = normalize(template);
            if let Some(first) = table.iter().find(|e| e.normalized == normalized) {
                tracing::debug!(
                    template,
                    shadowed_by = first.template,
                    "path template is equivalent to an earlier one and is unreachable"
                );
            }
            table.push(Entry {
                normalized,
                template,
            });
        }
        Self {
            spec,
            policy,
            table,
        }
    }

    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Look up a request by method and concrete path.
    #[must_use]
    pub fn lookup(&self, method: &str, path: &str) -> Lookup<'a> {
        let normalized = normalize(path);
        let request: Vec<&str> = normalized.split('/').collect();

        let mut best: Option<(Specificity, &'a str)> = None;
        for entry in &self.table {
            let Some(rank) = self.policy.rank(&request, &entry.segments()) else {
                continue;
            };
            // Strictly greater keeps the earliest template on ties
            if best.is_none_or(|(top, _)| rank > top) {
                best = Some((rank, entry.template));
            }
        }

        let Some((_, template)) = best else {
            return Lookup::PathNotFound;
        };
        match self.spec.operation(template, method) {
            Some(op) => Lookup::Matched(op),
            None => Lookup::MethodNotDefined { template },
        }
    }

    /// [`Self::lookup`] collapsed to "operation or no match".
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<Operation<'a>> {
        self.lookup(method, path).into_operation()
    }
}
