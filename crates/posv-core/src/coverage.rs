//! Coverage counters and the end-of-run report

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-run request tallies. Owned by exactly one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CoverageCounters {
    pub total: u64,
    pub validated: u64,
    pub unvalidated: u64,
}

impl CoverageCounters {
    pub fn record_validated(&mut self) {
        self.total += 1;
        self.validated += 1;
    }

    pub fn record_unvalidated(&mut self) {
        self.total += 1;
        self.unvalidated += 1;
    }

    /// Fold another run's counters into this one.
    pub fn merge(&mut self, other: Self) {
        self.total += other.total;
        self.validated += other.validated;
        self.unvalidated += other.unvalidated;
    }

    /// `validated / total * 100`, `0.0` for an empty run.
    #[must_use]
    pub fn coverage_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.validated as f64 / self.total as f64 * 100.0
        }
    }
}

/// Why a request did or did not get assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Schema assertion attached.
    Validated {
        /// Matched operation, e.g. `"GET /pets/{id}"`
        operation: String,
        /// Whether a status-code assertion was attached as well
        status_check: bool,
        /// Non-fatal remarks (schema compile warnings, skipped status check)
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    /// No path template matched.
    PathNotFound,
    /// A template matched but does not define the method.
    MethodNotDefined { template: String },
    /// Operation matched but has no JSON success schema.
    NoSchema { operation: String },
    /// The request itself could not be read.
    Malformed { reason: String },
}

impl ItemOutcome {
    #[must_use]
    pub const fn is_validated(&self) -> bool {
        matches!(self, Self::Validated { .. })
    }

    /// One-line human description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Validated {
                operation,
                status_check,
                ..
            } => {
                if *status_check {
                    format!("schema and status checks added ({operation})")
                } else {
                    format!("schema check added ({operation})")
                }
            }
            Self::PathNotFound => "no matching path in specification".to_string(),
            Self::MethodNotDefined { template } => {
                format!("method not defined for {template}")
            }
            Self::NoSchema { operation } => {
                format!("no 200/201/204/default JSON schema for {operation}")
            }
            Self::Malformed { reason } => format!("skipped: {reason}"),
        }
    }
}

/// Result for one request leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ItemReport {
    /// Folder names from the root down to the request's parent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<String>,
    /// `"GET {{baseUrl}}/pets/1"`
    pub request: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// End-of-run summary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CoverageReport {
    /// Version marker of the specification (`"2.0"`, `"3.0.3"`, ...)
    pub spec_version: String,
    #[serde(flatten)]
    pub counters: CoverageCounters,
    /// `validated / total * 100`, 0 when nothing was processed
    pub coverage_percent: f64,
    pub items: Vec<ItemReport>,
}

impl CoverageReport {
    #[must_use]
    pub fn new(spec_version: String, counters: CoverageCounters, items: Vec<ItemReport>) -> Self {
        Self {
            spec_version,
            coverage_percent: counters.coverage_percent(),
            counters,
            items,
        }
    }

    /// Requests that did not get assertions.
    pub fn unvalidated_items(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| !i.outcome.is_validated())
    }

    /// Summary table for the terminal.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let rows = [
            ("Total Requests", self.counters.total.to_string()),
            ("Validated Requests", self.counters.validated.to_string()),
            ("Unvalidated Requests", self.counters.unvalidated.to_string()),
            ("Schema Coverage (%)", format!("{:.2}%", self.coverage_percent)),
        ];
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

        let mut lines = Vec::new();
        lines.push("--- Validation Summary ---".to_string());
        lines.push(format!("Specification version: {}", self.spec_version));
        for (metric, value) in rows {
            lines.push(format!("  {metric:<width$}  {value}"));
        }
        lines.join("\n")
    }
}

/// JSON Schema of the machine-readable run report.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(CoverageReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
