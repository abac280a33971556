//! Result callbacks for playbook runs.
//!
//! The playbook engine reports progress as a serialized stream of events:
//! one when a task starts and one per host when the task finishes there.
//! A [`ResultCallback`] receives those events synchronously, in order, on the
//! task driving the run, so implementations can mutate their own state
//! without locking.
//!
//! # Architecture
//!
//! 1. **[`RunnerEvent`]**: the five event kinds (task start, ok, failed,
//!    unreachable, skipped)
//! 2. **[`ResultCallback`]**: the listener trait the runners deliver into
//! 3. **[`ResultAggregator`]**: the canonical listener, folding events into
//!    [`ExecutionStats`] and optionally notifying a live display
//! 4. **[`ResultLogger`]**: the logger injected into the aggregator
//!
//! # Example
//!
//! ```rust,ignore
//! use ceph_copilot::callback::prelude::*;
//!
//! let aggregator = ResultAggregator::new(TracingLogger::shared("site.yml"))
//!     .with_notifier(|stats| {
//!         println!("{} ok / {} failed", stats.task_state.success, stats.task_state.failed);
//!     });
//! ```

pub mod aggregator;
pub mod logger;
pub mod types;

pub use aggregator::{ResultAggregator, StatsNotifier};
pub use logger::{NullLogger, ResultLogger, SharedLogger, TracingLogger};
pub use types::{ExecutionStats, HostResult, OutcomeKind, RunnerEvent, TaskStateCounts};

/// Receives execution events from a playbook run.
///
/// Every method has an empty default so listeners only implement what they
/// care about. [`handle_event`](ResultCallback::handle_event) dispatches a
/// [`RunnerEvent`] to the matching method.
pub trait ResultCallback: Send {
    /// Called when a task starts.
    fn on_task_start(&mut self, name: &str, is_conditional: bool) {
        let _ = (name, is_conditional);
    }

    /// Called when a task completes on a host.
    fn on_host_ok(&mut self, result: HostResult) {
        let _ = result;
    }

    /// Called when a task fails on a host.
    fn on_host_failed(&mut self, result: HostResult) {
        let _ = result;
    }

    /// Called when a host cannot be reached.
    fn on_host_unreachable(&mut self, result: HostResult) {
        let _ = result;
    }

    /// Called when a task is skipped on a host.
    fn on_host_skipped(&mut self, result: HostResult) {
        let _ = result;
    }

    /// Dispatches an event to the matching handler.
    fn handle_event(&mut self, event: RunnerEvent) {
        match event {
            RunnerEvent::TaskStart {
                name,
                is_conditional,
            } => self.on_task_start(&name, is_conditional),
            RunnerEvent::HostOk(result) => self.on_host_ok(result),
            RunnerEvent::HostFailed(result) => self.on_host_failed(result),
            RunnerEvent::HostUnreachable(result) => self.on_host_unreachable(result),
            RunnerEvent::HostSkipped(result) => self.on_host_skipped(result),
        }
    }
}

impl<C: ResultCallback + ?Sized> ResultCallback for Box<C> {
    fn on_task_start(&mut self, name: &str, is_conditional: bool) {
        (**self).on_task_start(name, is_conditional);
    }

    fn on_host_ok(&mut self, result: HostResult) {
        (**self).on_host_ok(result);
    }

    fn on_host_failed(&mut self, result: HostResult) {
        (**self).on_host_failed(result);
    }

    fn on_host_unreachable(&mut self, result: HostResult) {
        (**self).on_host_unreachable(result);
    }

    fn on_host_skipped(&mut self, result: HostResult) {
        (**self).on_host_skipped(result);
    }
}

/// A callback that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCallback;

impl ResultCallback for NullCallback {}

/// A boxed callback for dynamic dispatch.
pub type BoxedCallback = Box<dyn ResultCallback>;

/// Convenient re-exports for callback development and usage.
pub mod prelude {
    pub use super::{
        BoxedCallback, ExecutionStats, HostResult, NullCallback, NullLogger, OutcomeKind,
        ResultAggregator, ResultCallback, ResultLogger, RunnerEvent, SharedLogger,
        StatsNotifier, TaskStateCounts, TracingLogger,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    impl ResultCallback for Recorder {
        fn on_task_start(&mut self, name: &str, _is_conditional: bool) {
            self.seen.push(format!("start:{name}"));
        }

        fn on_host_ok(&mut self, result: HostResult) {
            self.seen.push(format!("ok:{}", result.host));
        }

        fn on_host_skipped(&mut self, result: HostResult) {
            self.seen.push(format!("skipped:{}", result.host));
        }
    }

    #[test]
    fn test_handle_event_dispatch() {
        let mut recorder = Recorder::default();
        recorder.handle_event(RunnerEvent::TaskStart {
            name: "ping".into(),
            is_conditional: false,
        });
        recorder.handle_event(RunnerEvent::HostOk(HostResult::new("a", json!({}))));
        recorder.handle_event(RunnerEvent::HostFailed(HostResult::new("b", json!({}))));
        recorder.handle_event(RunnerEvent::HostSkipped(HostResult::new("c", json!({}))));

        assert_eq!(recorder.seen, vec!["start:ping", "ok:a", "skipped:c"]);
    }

    #[test]
    fn test_boxed_callback_forwards() {
        let mut boxed: Box<Recorder> = Box::default();
        boxed.handle_event(RunnerEvent::HostOk(HostResult::new("a", json!({}))));
        assert_eq!(boxed.seen, vec!["ok:a"]);
    }
}
