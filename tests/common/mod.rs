//! Shared test utilities for the copilot test suite.
//!
//! This module provides:
//! - A scripted [`ExecutionEngine`] that replays canned events
//! - Helpers for building host results and runner contexts
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use ceph_copilot::callback::{HostResult, ResultCallback, RunnerEvent};
use ceph_copilot::engine::{EngineSession, ExecutionEngine, ExecutionRequest};
use ceph_copilot::error::{Error, Result};
use ceph_copilot::inventory::HostList;
use ceph_copilot::runner::RunnerContext;

// ============================================================================
// Scripted engine
// ============================================================================

/// Everything a [`ScriptedEngine`] observed.
#[derive(Debug, Default)]
pub struct EngineLog {
    /// Requests passed to `open`, in order
    pub requests: Vec<ExecutionRequest>,
    /// Playbook file contents at the time `open` was called
    pub playbooks: Vec<String>,
    /// Number of sessions run
    pub runs: usize,
    /// Number of sessions cleaned up
    pub cleanups: usize,
}

/// What a scripted session does when run.
#[derive(Debug, Clone)]
enum Outcome {
    Exit(i32),
    Fail(String),
}

/// An engine that delivers a fixed list of events and exits with a fixed code.
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    events: Vec<RunnerEvent>,
    outcome: Outcome,
    fail_open: bool,
    log: Arc<Mutex<EngineLog>>,
}

impl ScriptedEngine {
    /// Creates an engine that emits nothing and exits with 0.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            outcome: Outcome::Exit(0),
            fail_open: false,
            log: Arc::default(),
        }
    }

    /// Appends an event to the script.
    pub fn with_event(mut self, event: RunnerEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Sets the return code of every run.
    pub fn with_rc(mut self, rc: i32) -> Self {
        self.outcome = Outcome::Exit(rc);
        self
    }

    /// Makes every run fail with an engine error after delivering the events.
    pub fn failing(mut self, message: &str) -> Self {
        self.outcome = Outcome::Fail(message.to_string());
        self
    }

    /// Makes `open` itself fail.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Shared handle on what the engine observed.
    pub fn log(&self) -> Arc<Mutex<EngineLog>> {
        Arc::clone(&self.log)
    }

    /// Wraps the engine for a runner context.
    pub fn shared(self) -> (Arc<dyn ExecutionEngine>, Arc<Mutex<EngineLog>>) {
        let log = self.log();
        (Arc::new(self), log)
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, request: &ExecutionRequest) -> Result<Box<dyn EngineSession>> {
        if self.fail_open {
            return Err(Error::Engine("scripted open failure".into()));
        }

        let playbook = std::fs::read_to_string(&request.playbook).unwrap_or_default();
        {
            let mut log = self.log.lock().unwrap();
            log.requests.push(request.clone());
            log.playbooks.push(playbook);
        }

        Ok(Box::new(ScriptedSession {
            events: self.events.clone(),
            outcome: self.outcome.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedSession {
    events: Vec<RunnerEvent>,
    outcome: Outcome,
    log: Arc<Mutex<EngineLog>>,
}

#[async_trait]
impl EngineSession for ScriptedSession {
    async fn run(&mut self, sink: &mut dyn ResultCallback) -> Result<i32> {
        self.log.lock().unwrap().runs += 1;

        for event in self.events.drain(..) {
            sink.handle_event(event);
        }

        match &self.outcome {
            Outcome::Exit(rc) => Ok(*rc),
            Outcome::Fail(message) => Err(Error::Engine(message.clone())),
        }
    }

    async fn cleanup(&mut self) {
        self.log.lock().unwrap().cleanups += 1;
    }
}

// ============================================================================
// Builders
// ============================================================================

/// A task start event.
pub fn task_start(name: &str) -> RunnerEvent {
    RunnerEvent::TaskStart {
        name: name.to_string(),
        is_conditional: false,
    }
}

/// A successful host event.
pub fn host_ok(host: &str, result: JsonValue) -> RunnerEvent {
    RunnerEvent::HostOk(HostResult::new(host, result))
}

/// A failed host event.
pub fn host_failed(host: &str, result: JsonValue) -> RunnerEvent {
    RunnerEvent::HostFailed(HostResult::new(host, result))
}

/// An unreachable host event.
pub fn host_unreachable(host: &str) -> RunnerEvent {
    RunnerEvent::HostUnreachable(HostResult::new(
        host,
        serde_json::json!({"unreachable": true}),
    ))
}

/// A skipped host event.
pub fn host_skipped(host: &str) -> RunnerEvent {
    RunnerEvent::HostSkipped(HostResult::new(
        host,
        serde_json::json!({"skipped": true}),
    ))
}

/// A context targeting `hosts` on `engine` with default options.
pub fn context(hosts: &[&str], engine: Arc<dyn ExecutionEngine>) -> RunnerContext {
    RunnerContext::new(HostList::new(hosts.iter().copied()), engine)
}
