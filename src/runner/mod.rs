//! Playbook runners.
//!
//! A runner binds a host list and a fixed set of [`RunOptions`] to the
//! external engine, then executes either an inline task list
//! ([`DynamicPlaybook`]) or a playbook file ([`StaticPlaybook`]). Both report
//! events into an optional [`ResultCallback`], normally a
//! [`ResultAggregator`](crate::callback::ResultAggregator).
//!
//! Runners are short-lived:
//!
//! ```text
//! new ──> Created ──setup──> Configured ──run──> Executed
//! ```
//!
//! Calling `setup` again replaces the previous definition.

pub mod dynamic;
pub mod file;
pub mod options;

pub use dynamic::{DynamicPlaybook, InlinePlaybook, DEFAULT_PLAY_NAME};
pub use file::StaticPlaybook;
pub use options::{BecomeMethod, ConnectionKind, RunOptions};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::engine::{ExecutionEngine, ExecutionRequest};
use crate::error::Result;
use crate::inventory::HostList;

/// Lifecycle position of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Constructed, nothing to run yet
    Created,
    /// A playbook definition is in place
    Configured,
    /// The playbook has been run
    Executed,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunnerState::Created => "created",
            RunnerState::Configured => "configured",
            RunnerState::Executed => "executed",
        };
        f.write_str(s)
    }
}

/// Execution context shared by every run of a runner.
///
/// Built once at construction: the hosts, the options and the engine handle
/// do not change afterwards.
#[derive(Debug, Clone)]
pub struct RunnerContext {
    hosts: HostList,
    options: RunOptions,
    engine: Arc<dyn ExecutionEngine>,
    extra_vars: IndexMap<String, JsonValue>,
}

impl RunnerContext {
    /// Creates a context with the default options.
    pub fn new(hosts: HostList, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self::with_options(hosts, engine, RunOptions::default())
    }

    /// Creates a context with explicit options.
    pub fn with_options(
        hosts: HostList,
        engine: Arc<dyn ExecutionEngine>,
        options: RunOptions,
    ) -> Self {
        Self {
            hosts,
            options,
            engine,
            extra_vars: IndexMap::new(),
        }
    }

    /// Adds an extra variable passed to every run.
    pub fn with_extra_var(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra_vars.insert(key.into(), value);
        self
    }

    /// Target hosts.
    pub fn hosts(&self) -> &HostList {
        &self.hosts
    }

    /// Engine options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// The engine runs are executed on.
    pub fn engine(&self) -> &Arc<dyn ExecutionEngine> {
        &self.engine
    }

    /// Extra variables.
    pub fn extra_vars(&self) -> &IndexMap<String, JsonValue> {
        &self.extra_vars
    }

    /// Builds the engine request for `playbook`.
    pub fn request(&self, playbook: &Path) -> ExecutionRequest {
        ExecutionRequest {
            playbook: playbook.to_path_buf(),
            hosts: self.hosts.clone(),
            options: self.options.clone(),
            extra_vars: self.extra_vars.clone(),
        }
    }
}

/// A runner executing one kind of playbook definition.
#[async_trait]
pub trait PlaybookRunner: Send {
    /// What `setup` takes: inline tasks or a file path.
    type Definition: Send;

    /// Installs the playbook definition, replacing any previous one.
    fn setup(&mut self, definition: Self::Definition) -> Result<()>;

    /// Executes the configured playbook and returns the engine's return code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::error::Error::Config) if `setup` has
    /// not been called.
    async fn run(&mut self) -> Result<i32>;

    /// Return code of the last run, `0` before any run.
    fn rc(&self) -> i32;

    /// Current lifecycle state.
    fn state(&self) -> RunnerState;
}
