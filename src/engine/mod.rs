//! The seam between the copilot and the external playbook engine.
//!
//! Scheduling, inventory parsing, variable resolution and task execution all
//! belong to the engine. The copilot only hands it an [`ExecutionRequest`]
//! and listens to the events it emits.
//!
//! An [`ExecutionEngine`] opens one [`EngineSession`] per run. The session
//! delivers events synchronously into a [`ResultCallback`] while it runs and
//! holds whatever resources the engine needs (a child process, for the
//! [`AnsiblePlaybookEngine`]) until [`EngineSession::cleanup`] releases them.

pub mod ansible;
pub mod events;

pub use ansible::{
    AnsiblePlaybookEngine, AnsibleSession, DEFAULT_PLAYBOOK_EXECUTABLE, DEFAULT_STDOUT_CALLBACK,
};
pub use events::decode_line;

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::callback::ResultCallback;
use crate::error::Result;
use crate::inventory::HostList;
use crate::runner::RunOptions;

/// Everything the engine needs to execute one playbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRequest {
    /// Playbook file to execute
    pub playbook: PathBuf,
    /// Target hosts
    pub hosts: HostList,
    /// Engine options
    pub options: RunOptions,
    /// Extra variables, highest precedence
    pub extra_vars: IndexMap<String, JsonValue>,
}

/// A playbook engine able to execute requests.
#[async_trait]
pub trait ExecutionEngine: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Prepares a run of `request`.
    async fn open(&self, request: &ExecutionRequest) -> Result<Box<dyn EngineSession>>;
}

/// One run of the engine.
#[async_trait]
pub trait EngineSession: Send {
    /// Executes the run, delivering every event to `sink` in order.
    ///
    /// Returns the engine's numeric return code.
    async fn run(&mut self, sink: &mut dyn ResultCallback) -> Result<i32>;

    /// Releases the engine resources held by this session.
    async fn cleanup(&mut self);
}
