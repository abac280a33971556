//! Playbook-file runner.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{PlaybookRunner, RunnerContext, RunnerState};
use crate::callback::{NullCallback, ResultCallback};
use crate::engine::ExecutionRequest;
use crate::error::{Error, Result};

/// Runs a playbook file from disk against the context's hosts.
///
/// Unlike [`DynamicPlaybook`](super::DynamicPlaybook), the session is not
/// explicitly cleaned up after the run; the engine process is reaped when the
/// run completes and killed if the session is dropped early.
#[derive(Debug)]
pub struct StaticPlaybook<C = NullCallback> {
    context: RunnerContext,
    callback: Option<C>,
    request: Option<ExecutionRequest>,
    rc: i32,
    state: RunnerState,
}

impl StaticPlaybook {
    /// Creates a runner that discards events.
    pub fn new(context: RunnerContext) -> Self {
        Self::build(context, None)
    }
}

impl<C: ResultCallback> StaticPlaybook<C> {
    /// Creates a runner reporting into `callback`.
    pub fn with_callback(context: RunnerContext, callback: C) -> Self {
        Self::build(context, Some(callback))
    }

    fn build(context: RunnerContext, callback: Option<C>) -> Self {
        Self {
            context,
            callback,
            request: None,
            rc: 0,
            state: RunnerState::Created,
        }
    }

    /// The result sink, if any.
    pub fn callback(&self) -> Option<&C> {
        self.callback.as_ref()
    }

    /// Removes and returns the result sink.
    pub fn take_callback(&mut self) -> Option<C> {
        self.callback.take()
    }

    /// Shared execution context.
    pub fn context(&self) -> &RunnerContext {
        &self.context
    }

    /// Path of the configured playbook.
    pub fn playbook_path(&self) -> Option<&Path> {
        self.request.as_ref().map(|r| r.playbook.as_path())
    }
}

#[async_trait]
impl<C: ResultCallback> PlaybookRunner for StaticPlaybook<C> {
    type Definition = PathBuf;

    fn setup(&mut self, path: PathBuf) -> Result<()> {
        self.request = Some(self.context.request(&path));
        self.state = RunnerState::Configured;
        Ok(())
    }

    async fn run(&mut self) -> Result<i32> {
        let request = self
            .request
            .as_ref()
            .ok_or_else(|| Error::Config("static playbook is not configured".into()))?;

        info!(
            playbook = %request.playbook.display(),
            hosts = request.hosts.len(),
            engine = self.context.engine().name(),
            "Running playbook"
        );

        let mut session = self.context.engine().open(request).await?;
        let rc = match self.callback.as_mut() {
            Some(callback) => session.run(callback).await?,
            None => session.run(&mut NullCallback).await?,
        };

        self.rc = rc;
        self.state = RunnerState::Executed;
        Ok(rc)
    }

    fn rc(&self) -> i32 {
        self.rc
    }

    fn state(&self) -> RunnerState {
        self.state
    }
}
