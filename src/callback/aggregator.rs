//! Aggregating callback that folds engine events into [`ExecutionStats`].
//!
//! One aggregator serves exactly one run: counters start at zero when it is
//! built and are never reset. After every per-host event the optional
//! notifier is called with the current statistics, which is how a live
//! progress display stays up to date.

use std::fmt;

use serde_json::Value as JsonValue;

use super::logger::SharedLogger;
use super::types::{ExecutionStats, HostResult, OutcomeKind};
use super::ResultCallback;

/// Function called with a snapshot of the statistics after each host event.
pub type StatsNotifier = Box<dyn FnMut(&ExecutionStats) + Send>;

const WARNINGS_KEY: &str = "warnings";
const DEPRECATIONS_KEY: &str = "deprecations";

/// Collects per-host results for a single playbook run.
pub struct ResultAggregator {
    stats: ExecutionStats,
    notifier: Option<StatsNotifier>,
    logger: SharedLogger,
}

impl ResultAggregator {
    /// Creates an aggregator logging through `logger`.
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            stats: ExecutionStats::new(),
            notifier: None,
            logger,
        }
    }

    /// Installs a function called with the statistics after every host event.
    pub fn with_notifier<F>(mut self, notifier: F) -> Self
    where
        F: FnMut(&ExecutionStats) + Send + 'static,
    {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Current statistics.
    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Consumes the aggregator, returning the final statistics.
    pub fn into_stats(self) -> ExecutionStats {
        self.stats
    }

    /// Removes `warnings` and `deprecations` from a payload, logging each
    /// entry. Payloads without those keys are left untouched.
    fn handle_warnings(&self, result: &mut JsonValue) {
        let Some(map) = result.as_object_mut() else {
            return;
        };

        if let Some(warnings) = map.remove(WARNINGS_KEY) {
            for warning in as_entries(&warnings) {
                match warning {
                    JsonValue::String(s) => self.logger.warning(s),
                    other => self.logger.warning(&other.to_string()),
                }
            }
        }

        if let Some(deprecations) = map.remove(DEPRECATIONS_KEY) {
            for deprecation in as_entries(&deprecations) {
                match deprecation {
                    JsonValue::Object(fields) => {
                        let msg = fields
                            .get("msg")
                            .and_then(JsonValue::as_str)
                            .map_or_else(|| deprecation.to_string(), str::to_string);
                        let version = fields.get("version").and_then(JsonValue::as_str);
                        self.logger.deprecation(&msg, version);
                    }
                    JsonValue::String(s) => self.logger.deprecation(s, None),
                    other => self.logger.deprecation(&other.to_string(), None),
                }
            }
        }
    }

    fn record(&mut self, kind: OutcomeKind) {
        self.stats.task_state.increment(kind);
        if let Some(notifier) = self.notifier.as_mut() {
            notifier(&self.stats);
        }
    }
}

/// Entries of a warnings/deprecations field: a list, or a lone value.
fn as_entries(value: &JsonValue) -> Vec<&JsonValue> {
    match value {
        JsonValue::Array(items) => items.iter().collect(),
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

impl ResultCallback for ResultAggregator {
    fn on_task_start(&mut self, name: &str, _is_conditional: bool) {
        self.stats.task_name = name.to_string();
    }

    fn on_host_ok(&mut self, mut result: HostResult) {
        self.handle_warnings(&mut result.result);
        self.stats.successes.insert(result.host, result.result);
        self.record(OutcomeKind::Success);
    }

    fn on_host_failed(&mut self, mut result: HostResult) {
        self.handle_warnings(&mut result.result);
        self.logger.host_failure(&result.host, &result.result);
        self.stats
            .failures
            .entry(result.host)
            .or_default()
            .push(result.result);
        self.record(OutcomeKind::Failed);
    }

    fn on_host_unreachable(&mut self, mut result: HostResult) {
        self.handle_warnings(&mut result.result);
        self.record(OutcomeKind::Unreachable);
    }

    fn on_host_skipped(&mut self, mut result: HostResult) {
        self.handle_warnings(&mut result.result);
        self.record(OutcomeKind::Skipped);
    }
}

impl fmt::Debug for ResultAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultAggregator")
            .field("stats", &self.stats)
            .field("notifier", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}
