//! Event and statistics types for the result aggregator.
//!
//! The external playbook engine reports one event per task start and one per
//! host outcome. These types carry those events into a [`ResultCallback`]
//! and hold the running summary a live display renders.
//!
//! [`ResultCallback`]: super::ResultCallback

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ============================================================================
// Outcome Kinds
// ============================================================================

/// The four per-host outcomes a task can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Task completed on the host
    Success,
    /// Task failed on the host
    Failed,
    /// Task was skipped for the host
    Skipped,
    /// Host could not be reached
    Unreachable,
}

impl OutcomeKind {
    /// All outcome kinds, in display order.
    pub const ALL: [OutcomeKind; 4] = [
        OutcomeKind::Success,
        OutcomeKind::Failed,
        OutcomeKind::Skipped,
        OutcomeKind::Unreachable,
    ];

    /// Get the plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Failed => "failed",
            OutcomeKind::Skipped => "skipped",
            OutcomeKind::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Running counts of host outcomes for one playbook run.
///
/// Counts only ever grow during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStateCounts {
    /// Successful host results
    pub success: u64,
    /// Failed host results
    pub failed: u64,
    /// Skipped host results
    pub skipped: u64,
    /// Unreachable host results
    pub unreachable: u64,
}

impl TaskStateCounts {
    /// Returns the count recorded for `kind`.
    pub fn get(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::Success => self.success,
            OutcomeKind::Failed => self.failed,
            OutcomeKind::Skipped => self.skipped,
            OutcomeKind::Unreachable => self.unreachable,
        }
    }

    pub(crate) fn increment(&mut self, kind: OutcomeKind) {
        let slot = match kind {
            OutcomeKind::Success => &mut self.success,
            OutcomeKind::Failed => &mut self.failed,
            OutcomeKind::Skipped => &mut self.skipped,
            OutcomeKind::Unreachable => &mut self.unreachable,
        };
        *slot += 1;
    }

    /// Total number of host results seen.
    pub fn total(&self) -> u64 {
        self.success + self.failed + self.skipped + self.unreachable
    }
}

/// Summary of a playbook run, accumulated event by event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Outcome counters
    pub task_state: TaskStateCounts,
    /// Every failure payload, per host, in arrival order
    pub failures: IndexMap<String, Vec<JsonValue>>,
    /// Most recent success payload per host
    pub successes: IndexMap<String, JsonValue>,
    /// Name of the task that started last
    pub task_name: String,
}

impl ExecutionStats {
    /// Creates empty statistics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of host results seen.
    pub fn total(&self) -> u64 {
        self.task_state.total()
    }

    /// Hosts that failed at least once, in order of first failure.
    pub fn failed_hosts(&self) -> impl Iterator<Item = &str> {
        self.failures.keys().map(String::as_str)
    }

    /// Whether any host failed or was unreachable.
    pub fn has_failures(&self) -> bool {
        self.task_state.failed > 0 || self.task_state.unreachable > 0
    }
}

// ============================================================================
// Events
// ============================================================================

/// The raw result of one task on one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    /// Host identifier as known to the inventory
    pub host: String,
    /// Raw result payload reported by the engine
    pub result: JsonValue,
}

impl HostResult {
    /// Creates a new host result.
    pub fn new(host: impl Into<String>, result: JsonValue) -> Self {
        Self {
            host: host.into(),
            result,
        }
    }
}

/// Events emitted by the playbook engine during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RunnerEvent {
    /// A task started.
    TaskStart {
        /// Display name of the task
        name: String,
        /// Whether the task carries a condition
        is_conditional: bool,
    },
    /// A task completed on a host.
    HostOk(HostResult),
    /// A task failed on a host.
    HostFailed(HostResult),
    /// A host could not be reached for a task.
    HostUnreachable(HostResult),
    /// A task was skipped on a host.
    HostSkipped(HostResult),
}

impl RunnerEvent {
    /// The outcome kind for per-host events, `None` for task start.
    pub fn outcome(&self) -> Option<OutcomeKind> {
        match self {
            RunnerEvent::TaskStart { .. } => None,
            RunnerEvent::HostOk(_) => Some(OutcomeKind::Success),
            RunnerEvent::HostFailed(_) => Some(OutcomeKind::Failed),
            RunnerEvent::HostUnreachable(_) => Some(OutcomeKind::Unreachable),
            RunnerEvent::HostSkipped(_) => Some(OutcomeKind::Skipped),
        }
    }

    /// The host this event concerns, if any.
    pub fn host(&self) -> Option<&str> {
        match self {
            RunnerEvent::TaskStart { .. } => None,
            RunnerEvent::HostOk(r)
            | RunnerEvent::HostFailed(r)
            | RunnerEvent::HostUnreachable(r)
            | RunnerEvent::HostSkipped(r) => Some(&r.host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_start_at_zero() {
        let stats = ExecutionStats::new();
        for kind in OutcomeKind::ALL {
            assert_eq!(stats.task_state.get(kind), 0);
        }
        assert!(stats.task_name.is_empty());
        assert!(!stats.has_failures());
    }

    #[test]
    fn test_increment_and_total() {
        let mut counts = TaskStateCounts::default();
        counts.increment(OutcomeKind::Success);
        counts.increment(OutcomeKind::Success);
        counts.increment(OutcomeKind::Unreachable);
        assert_eq!(counts.get(OutcomeKind::Success), 2);
        assert_eq!(counts.get(OutcomeKind::Unreachable), 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_stats_serialize_shape() {
        let mut stats = ExecutionStats::new();
        stats.task_state.increment(OutcomeKind::Failed);
        stats
            .failures
            .insert("mon1".into(), vec![json!({"msg": "boom"})]);
        stats.task_name = "install packages".into();

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["task_state"]["failed"], 1);
        assert_eq!(value["task_state"]["success"], 0);
        assert_eq!(value["failures"]["mon1"][0]["msg"], "boom");
        assert_eq!(value["task_name"], "install packages");
    }

    #[test]
    fn test_event_accessors() {
        let event = RunnerEvent::HostSkipped(HostResult::new("osd1", json!({})));
        assert_eq!(event.outcome(), Some(OutcomeKind::Skipped));
        assert_eq!(event.host(), Some("osd1"));

        let start = RunnerEvent::TaskStart {
            name: "ping".into(),
            is_conditional: false,
        };
        assert_eq!(start.outcome(), None);
        assert_eq!(start.host(), None);
    }
}
