//! Decoding of the engine's line-delimited JSON event stream.
//!
//! With the `ansible.posix.jsonl` stdout callback every engine event is
//! printed as one JSON object. The event kind is in `_event`; task details
//! are under `task` and per-host results under `hosts`:
//!
//! ```text
//! {"_event": "v2_playbook_on_task_start", "task": {"name": "ping", ...}, ...}
//! {"_event": "v2_runner_on_ok", "hosts": {"mon1": {"changed": false, ...}}, ...}
//! ```

use serde_json::Value as JsonValue;
use tracing::trace;

use crate::callback::{HostResult, RunnerEvent};

const TASK_START: &str = "v2_playbook_on_task_start";
const RUNNER_OK: &str = "v2_runner_on_ok";
const RUNNER_FAILED: &str = "v2_runner_on_failed";
const RUNNER_UNREACHABLE: &str = "v2_runner_on_unreachable";
const RUNNER_SKIPPED: &str = "v2_runner_on_skipped";

/// Decodes one line of engine output into runner events.
///
/// Lines that are not JSON objects, or that carry events the copilot does
/// not track, decode to nothing.
pub fn decode_line(line: &str) -> Vec<RunnerEvent> {
    let line = line.trim();
    if !line.starts_with('{') {
        if !line.is_empty() {
            trace!(line = %line, "Ignoring non-event engine output");
        }
        return Vec::new();
    }

    let value: JsonValue = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, "Ignoring undecodable engine output");
            return Vec::new();
        }
    };

    let Some(event) = value.get("_event").and_then(JsonValue::as_str) else {
        return Vec::new();
    };

    match event {
        TASK_START => {
            let name = value
                .pointer("/task/name")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string();
            let is_conditional = value
                .get("is_conditional")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false);
            vec![RunnerEvent::TaskStart {
                name,
                is_conditional,
            }]
        }
        RUNNER_OK => host_events(value, RunnerEvent::HostOk),
        RUNNER_FAILED => host_events(value, RunnerEvent::HostFailed),
        RUNNER_UNREACHABLE => host_events(value, RunnerEvent::HostUnreachable),
        RUNNER_SKIPPED => host_events(value, RunnerEvent::HostSkipped),
        other => {
            trace!(event = %other, "Ignoring untracked engine event");
            Vec::new()
        }
    }
}

fn host_events(mut value: JsonValue, make: fn(HostResult) -> RunnerEvent) -> Vec<RunnerEvent> {
    match value.get_mut("hosts").map(JsonValue::take) {
        Some(JsonValue::Object(hosts)) => hosts
            .into_iter()
            .map(|(host, result)| make(HostResult::new(host, result)))
            .collect(),
        _ => Vec::new(),
    }
}
