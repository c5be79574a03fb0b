//! Depth-first collection walk
//!
//! Every request leaf is resolved, matched, and either annotated or counted as
//! unvalidated. Nothing that goes wrong with a single request stops the walk.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assertion::{MergeStrategy, Synthesizer, lint_schema};
use crate::collection::{Collection, Item, RequestItem};
use crate::coverage::{CoverageCounters, CoverageReport, ItemOutcome, ItemReport};
use crate::matcher::{Lookup, MatchPolicy, SpecMatcher};
use crate::path::resolve_request_path;
use crate::select::select_schema;
use crate::spec::Specification;

/// Per-run behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Also assert the response status is one of the declared 2xx codes.
    #[serde(default)]
    pub status_code_check: bool,
    #[serde(default)]
    pub match_policy: MatchPolicy,
    #[serde(default)]
    pub merge: MergeStrategy,
}

pub struct CollectionWalker<'a> {
    spec: &'a Specification,
    matcher: SpecMatcher<'a>,
    synthesizer: Synthesizer,
    options: Options,
}

impl<'a> CollectionWalker<'a> {
    #[must_use]
    pub fn new(spec: &'a Specification, options: Options) -> Self {
        Self {
            spec,
            matcher: SpecMatcher::new(spec, options.match_policy),
            synthesizer: Synthesizer::postman(options.merge),
            options,
        }
    }

    /// Walk `items`, mutating matched requests and tallying into `counters`.
    pub fn walk(&self, items: &mut [Item], counters: &mut CoverageCounters) -> Vec<ItemReport> {
        let mut reports = Vec::new();
        let mut folders = Vec::new();
        self.walk_inner(items, counters, &mut folders, &mut reports);
        reports
    }

    fn walk_inner(
        &self,
        items: &mut [Item],
        counters: &mut CoverageCounters,
        folders: &mut Vec<String>,
        reports: &mut Vec<ItemReport>,
    ) {
        for item in items {
            match item {
                Item::Folder(folder) => {
                    folders.push(folder.name.clone().unwrap_or_default());
                    self.walk_inner(&mut folder.item, counters, folders, reports);
                    folders.pop();
                }
                Item::Request(request) => {
                    let label = request.label();
                    let outcome = self.process(request);

                    if outcome.is_validated() {
                        counters.record_validated();
                        info!(request = %label, "✓ {}", outcome.describe());
                    } else {
                        counters.record_unvalidated();
                        warn!(request = %label, "✗ {}", outcome.describe());
                    }

                    reports.push(ItemReport {
                        folders: folders.clone(),
                        request: label,
                        outcome,
                    });
                }
                Item::Unreadable(node) => {
                    let label = node.label();
                    counters.record_unvalidated();
                    warn!(request = %label, "✗ skipped: {}", node.reason);
                    reports.push(ItemReport {
                        folders: folders.clone(),
                        request: label,
                        outcome: ItemOutcome::Malformed {
                            reason: node.reason.clone(),
                        },
                    });
                }
            }
        }
    }

    fn process(&self, request: &mut RequestItem) -> ItemOutcome {
        let (method, path) = match request
            .details()
            .and_then(|d| Ok((d.method.to_string(), resolve_request_path(d.path)?)))
        {
            Ok(found) => found,
            Err(e) => {
                return ItemOutcome::Malformed {
                    reason: e.to_string(),
                };
            }
        };

        let operation = match self.matcher.lookup(&method, &path) {
            Lookup::Matched(op) => op,
            Lookup::PathNotFound => return ItemOutcome::PathNotFound,
            Lookup::MethodNotDefined { template } => {
                return ItemOutcome::MethodNotDefined {
                    template: template.to_string(),
                };
            }
        };

        let Some(schema) = select_schema(&operation, self.spec.version()) else {
            return ItemOutcome::NoSchema {
                operation: operation.label(),
            };
        };

        let mut warnings = Vec::new();
        if let Some(problem) = lint_schema(schema) {
            warnings.push(format!("schema may not compile: {problem}"));
        }
        self.synthesizer.add_schema_assertion(request, schema);

        let mut status_check = false;
        if self.options.status_code_check {
            status_check = operation
                .responses()
                .is_some_and(|responses| self.synthesizer.add_status_assertion(request, responses));
            if !status_check {
                warnings.push("no 2xx status code declared, status check skipped".to_string());
            }
        }

        ItemOutcome::Validated {
            operation: operation.label(),
            status_check,
            warnings,
        }
    }
}

/// Annotate a whole collection in place and summarize the run.
pub fn annotate(
    collection: &mut Collection,
    spec: &Specification,
    options: Options,
) -> CoverageReport {
    info!(version = %spec.version(), paths = spec.path_count(), "specification loaded");

    let mut counters = CoverageCounters::default();
    let walker = CollectionWalker::new(spec, options);
    let items = walker.walk(&mut collection.item, &mut counters);

    CoverageReport::new(spec.version().to_string(), counters, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::AssertionKind;
    use serde_json::{Value, json};

    fn spec() -> Specification {
        Specification::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/pets/{id}": {
                    "get": {"responses": {
                        "200": {"content": {"application/json": {"schema": {"type": "object"}}}},
                        "201": {"description": "created"},
                        "404": {"description": "missing"}
                    }}
                },
                "/health": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/errors": {"get": {"responses": {
                    "default": {"content": {"application/json": {"schema": {"type": "object"}}}}
                }}}
            }
        }))
        .unwrap()
    }

    fn request(method: &str, path: Value) -> Value {
        json!({"name": "r", "request": {"method": method, "url": {"raw": "x", "path": path}}})
    }

    fn collection(items: Vec<Value>) -> Collection {
        Collection::from_value(json!({"item": items})).unwrap()
    }

    fn leaf(collection: &Collection, idx: usize) -> &RequestItem {
        match &collection.item[idx] {
            Item::Request(r) => r,
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn matched_request_gains_schema_block() {
        let spec = spec();
        let mut c = collection(vec![request("GET", json!(["pets", "1"]))]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.total, 1);
        assert_eq!(report.counters.validated, 1);
        assert_eq!(report.coverage_percent, 100.0);

        let item = leaf(&c, 0);
        let events = item.event.as_ref().unwrap();
        assert_eq!(events.len(), 1);
        let synth = Synthesizer::postman(MergeStrategy::Append);
        assert_eq!(synth.count_blocks(events[0].exec(), AssertionKind::SchemaCheck), 1);
        assert_eq!(synth.count_blocks(events[0].exec(), AssertionKind::StatusCheck), 0);
    }

    #[test]
    fn unknown_path_is_unvalidated() {
        let spec = spec();
        let mut c = collection(vec![request("GET", json!(["unknown"]))]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.unvalidated, 1);
        assert_eq!(report.counters.validated, 0);
        assert_eq!(report.items[0].outcome, ItemOutcome::PathNotFound);
        assert!(leaf(&c, 0).event.is_none());
    }

    #[test]
    fn status_check_uses_2xx_codes() {
        let spec = spec();
        let mut c = collection(vec![request("GET", json!(["pets", "{{id}}"]))]);
        let options = Options {
            status_code_check: true,
            ..Options::default()
        };
        let report = annotate(&mut c, &spec, options);

        assert!(matches!(
            &report.items[0].outcome,
            ItemOutcome::Validated { status_check: true, .. }
        ));
        let exec = leaf(&c, 0).test_event().unwrap().exec();
        assert!(exec.iter().any(|l| l.contains("oneOf([200, 201])")));
        assert!(!exec.iter().any(|l| l.contains("404")));
    }

    #[test]
    fn no_schema_and_wrong_method_are_unvalidated() {
        let spec = spec();
        let mut c = collection(vec![
            request("GET", json!(["health"])),
            request("POST", json!(["pets", "1"])),
        ]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.unvalidated, 2);
        assert_eq!(
            report.items[0].outcome,
            ItemOutcome::NoSchema {
                operation: "GET /health".into()
            }
        );
        assert_eq!(
            report.items[1].outcome,
            ItemOutcome::MethodNotDefined {
                template: "/pets/{id}".into()
            }
        );
    }

    #[test]
    fn malformed_request_does_not_abort() {
        let spec = spec();
        let mut c = collection(vec![
            json!({"name": "broken", "request": {"method": "GET", "url": "http://x/pets/1"}}),
            json!({"name": "no request"}),
            request("GET", json!(["pets", "2"])),
        ]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.total, 3);
        assert_eq!(report.counters.unvalidated, 2);
        assert_eq!(report.counters.validated, 1);
        assert!(matches!(report.items[0].outcome, ItemOutcome::Malformed { .. }));
        assert_eq!(report.items[1].request, "no request");
    }

    #[test]
    fn bad_child_does_not_hide_folder_siblings() {
        let spec = spec();
        let mut c = collection(vec![json!({"name": "pets", "item": [
            request("GET", json!(["pets", "1"])),
            {"name": 42, "request": {"method": "GET", "url": {"path": ["pets", "2"]}}},
            "not a node",
            request("GET", json!(["pets", "3"]))
        ]})]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.total, 4);
        assert_eq!(report.counters.validated, 2);
        assert_eq!(report.counters.unvalidated, 2);
        assert!(report.items.iter().all(|i| i.folders == ["pets"]));
        assert!(matches!(report.items[1].outcome, ItemOutcome::Malformed { .. }));
        assert!(matches!(
            &report.items[2].outcome,
            ItemOutcome::Malformed { reason } if reason.contains("not an object")
        ));

        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back["item"][0]["item"][1]["name"], 42);
        assert_eq!(back["item"][0]["item"][2], "not a node");
    }

    #[test]
    fn unreadable_top_level_request_is_not_fatal() {
        let spec = spec();
        let mut c = collection(vec![
            json!({"name": 42, "request": {"method": "GET", "url": {"path": ["pets", "1"]}}}),
            json!({"name": "odd folder", "item": {"not": "a list"}}),
            request("GET", json!(["pets", "1"])),
        ]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.total, 3);
        assert_eq!(report.counters.validated, 1);
        assert_eq!(report.items[1].request, "odd folder");
        assert!(matches!(
            &report.items[1].outcome,
            ItemOutcome::Malformed { reason } if reason.contains("not an array")
        ));
    }

    #[test]
    fn event_without_listen_is_tolerated() {
        let spec = spec();
        let mut node = request("GET", json!(["pets", "1"]));
        node["event"] = json!([{"script": {"exec": ["keep()"]}}]);
        let mut c = collection(vec![node]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.validated, 1);
        let events = leaf(&c, 0).event.as_ref().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].exec(), ["keep()"]);
        let back = serde_json::to_value(&c).unwrap();
        assert!(back["item"][0]["event"][0].get("listen").is_none());
    }

    #[test]
    fn nested_folders_are_walked_depth_first() {
        let spec = spec();
        let mut c = collection(vec![
            json!({"name": "outer", "item": [
                {"name": "inner", "item": [request("GET", json!(["pets", "1"]))]},
                request("GET", json!(["errors"]))
            ]}),
            request("GET", json!(["nope"])),
        ]);
        let report = annotate(&mut c, &spec, Options::default());

        assert_eq!(report.counters.total, 3);
        assert_eq!(report.counters.validated, 2);
        assert_eq!(report.items[0].folders, ["outer", "inner"]);
        assert_eq!(report.items[1].folders, ["outer"]);
        assert!(report.items[2].folders.is_empty());
    }

    #[test]
    fn counters_are_run_scoped() {
        let spec = spec();
        let walker = CollectionWalker::new(&spec, Options::default());
        let mut c = collection(vec![request("GET", json!(["pets", "1"]))]);

        let mut first = CoverageCounters::default();
        walker.walk(&mut c.item, &mut first);
        let mut second = CoverageCounters::default();
        walker.walk(&mut c.item, &mut second);

        assert_eq!(first, second);
        assert_eq!(second.total, 1);
    }

    #[test]
    fn empty_collection_reports_zero_coverage() {
        let spec = spec();
        let mut c = collection(vec![]);
        let report = annotate(&mut c, &spec, Options::default());
        assert_eq!(report.counters.total, 0);
        assert_eq!(report.coverage_percent, 0.0);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: Options = serde_json::from_value(json!({"match_policy": "prefix"})).unwrap();
        assert_eq!(options.match_policy, MatchPolicy::Prefix);
        assert!(!options.status_code_check);
        assert_eq!(options.merge, MergeStrategy::Append);
    }
}
