//! Tests for the result aggregator
//!
//! These tests cover:
//! - Counter bookkeeping across all outcome kinds
//! - Success overwrite versus failure accumulation
//! - Warning and deprecation stripping through an injected logger
//! - Notifier delivery for live progress displays

mod common;

use std::sync::{Arc, Mutex};

use ceph_copilot::callback::{
    NullLogger, OutcomeKind, ResultAggregator, ResultCallback, ResultLogger, RunnerEvent,
};
use common::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};

/// Logger that remembers everything it was given.
#[derive(Default)]
struct RecordingLogger {
    warnings: Mutex<Vec<String>>,
    deprecations: Mutex<Vec<(String, Option<String>)>>,
    failures: Mutex<Vec<(String, JsonValue)>>,
}

impl ResultLogger for RecordingLogger {
    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn deprecation(&self, message: &str, version: Option<&str>) {
        self.deprecations
            .lock()
            .unwrap()
            .push((message.to_string(), version.map(str::to_string)));
    }

    fn host_failure(&self, host: &str, result: &JsonValue) {
        self.failures
            .lock()
            .unwrap()
            .push((host.to_string(), result.clone()));
    }
}

fn recording() -> (ResultAggregator, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let aggregator = ResultAggregator::new(logger.clone());
    (aggregator, logger)
}

// ============================================================================
// Counters
// ============================================================================

#[test]
fn test_mixed_run_counts() {
    let mut aggregator = ResultAggregator::new(NullLogger::shared());

    for event in [
        task_start("Gather facts"),
        host_ok("mon1", json!({"changed": false})),
        host_ok("osd1", json!({"changed": false})),
        host_unreachable("osd2"),
        task_start("Install packages"),
        host_failed("mon1", json!({"msg": "no package"})),
        host_skipped("osd1"),
    ] {
        aggregator.handle_event(event);
    }

    let stats = aggregator.stats();
    assert_eq!(stats.task_state.success, 2);
    assert_eq!(stats.task_state.failed, 1);
    assert_eq!(stats.task_state.unreachable, 1);
    assert_eq!(stats.task_state.skipped, 1);
    assert_eq!(stats.total(), 5);
    assert_eq!(stats.task_name, "Install packages");
    assert!(stats.has_failures());
}

#[test]
fn test_task_start_does_not_count() {
    let mut aggregator = ResultAggregator::new(NullLogger::shared());
    aggregator.handle_event(task_start("one"));
    aggregator.handle_event(task_start("two"));

    assert_eq!(aggregator.stats().total(), 0);
    assert_eq!(aggregator.stats().task_name, "two");
}

#[test]
fn test_success_overwrites_and_failures_accumulate() {
    let mut aggregator = ResultAggregator::new(NullLogger::shared());

    aggregator.handle_event(host_ok("mon1", json!({"step": 1})));
    aggregator.handle_event(host_ok("mon1", json!({"step": 2})));
    aggregator.handle_event(host_failed("osd1", json!({"msg": "first"})));
    aggregator.handle_event(host_failed("osd1", json!({"msg": "second"})));

    let stats = aggregator.into_stats();
    assert_eq!(stats.successes.len(), 1);
    assert_eq!(stats.successes["mon1"], json!({"step": 2}));
    assert_eq!(
        stats.failures["osd1"],
        vec![json!({"msg": "first"}), json!({"msg": "second"})]
    );
    assert_eq!(stats.task_state.success, 2);
    assert_eq!(stats.task_state.failed, 2);
}

#[test]
fn test_failed_hosts_in_first_failure_order() {
    let mut aggregator = ResultAggregator::new(NullLogger::shared());
    for host in ["osd3", "osd1", "osd3", "osd2"] {
        aggregator.handle_event(host_failed(host, json!({})));
    }

    let hosts: Vec<&str> = aggregator.stats().failed_hosts().collect();
    assert_eq!(hosts, vec!["osd3", "osd1", "osd2"]);
}

// ============================================================================
// Warnings and deprecations
// ============================================================================

#[test]
fn test_warnings_are_logged_and_stripped() {
    let (mut aggregator, logger) = recording();

    aggregator.handle_event(host_ok(
        "mon1",
        json!({
            "changed": true,
            "warnings": ["consider using the service module"],
            "deprecations": [{"msg": "old option", "version": "2.14"}],
        }),
    ));

    assert_eq!(
        *logger.warnings.lock().unwrap(),
        vec!["consider using the service module".to_string()]
    );
    assert_eq!(
        *logger.deprecations.lock().unwrap(),
        vec![("old option".to_string(), Some("2.14".to_string()))]
    );
    assert_eq!(aggregator.stats().successes["mon1"], json!({"changed": true}));
}

#[test]
fn test_failure_logged_without_warnings() {
    let (mut aggregator, logger) = recording();

    aggregator.handle_event(host_failed(
        "osd1",
        json!({"msg": "disk busy", "warnings": ["retrying"]}),
    ));

    let failures = logger.failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0], ("osd1".to_string(), json!({"msg": "disk busy"})));
    assert_eq!(*logger.warnings.lock().unwrap(), vec!["retrying".to_string()]);
}

#[test]
fn test_non_object_payload_is_kept() {
    let (mut aggregator, logger) = recording();

    aggregator.handle_event(host_ok("mon1", json!("raw output")));

    assert!(logger.warnings.lock().unwrap().is_empty());
    assert_eq!(aggregator.stats().successes["mon1"], json!("raw output"));
}

#[test]
fn test_unreachable_and_skipped_payloads_are_not_stored() {
    let mut aggregator = ResultAggregator::new(NullLogger::shared());
    aggregator.handle_event(host_unreachable("osd1"));
    aggregator.handle_event(host_skipped("osd2"));

    let stats = aggregator.stats();
    assert!(stats.successes.is_empty());
    assert!(stats.failures.is_empty());
    assert_eq!(stats.total(), 2);
}

// ============================================================================
// Notifier
// ============================================================================

#[test]
fn test_notifier_sees_running_totals() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut aggregator = ResultAggregator::new(NullLogger::shared())
        .with_notifier(move |stats| sink.lock().unwrap().push(stats.total()));

    aggregator.handle_event(task_start("ping"));
    aggregator.handle_event(host_ok("a", json!({})));
    aggregator.handle_event(host_failed("b", json!({})));
    aggregator.handle_event(host_skipped("c"));

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}

// ============================================================================
// Properties
// ============================================================================

fn arb_event() -> impl Strategy<Value = RunnerEvent> {
    let host = prop::sample::select(vec!["mon1", "mon2", "osd1", "osd2", "rgw1"]);
    (0u8..5, host).prop_map(|(kind, host)| match kind {
        0 => task_start("task"),
        1 => host_ok(host, json!({"changed": false})),
        2 => host_failed(host, json!({"msg": "boom"})),
        3 => host_unreachable(host),
        _ => host_skipped(host),
    })
}

proptest! {
    #[test]
    fn prop_counts_match_host_events(events in prop::collection::vec(arb_event(), 0..64)) {
        let mut aggregator = ResultAggregator::new(NullLogger::shared());
        let mut expected = [0u64; 4];

        for event in &events {
            if let Some(kind) = event.outcome() {
                let slot = OutcomeKind::ALL.iter().position(|k| *k == kind).unwrap();
                expected[slot] += 1;
            }
            aggregator.handle_event(event.clone());
        }

        let stats = aggregator.stats();
        for (slot, kind) in OutcomeKind::ALL.iter().enumerate() {
            prop_assert_eq!(stats.task_state.get(*kind), expected[slot]);
        }

        let host_events = events.iter().filter(|e| e.host().is_some()).count() as u64;
        prop_assert_eq!(stats.total(), host_events);

        let failure_payloads: usize = stats.failures.values().map(Vec::len).sum();
        prop_assert_eq!(failure_payloads as u64, stats.task_state.failed);
    }
}
