//! `ansible-playbook` as an execution engine.
//!
//! The engine is run as a child process with its stdout callback switched to
//! line-delimited JSON. Each stdout line is decoded and delivered to the sink
//! before the next one is read, so events reach the callback in the order the
//! engine emitted them. Stderr is drained on a separate task into the debug
//! log.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::decode_line;
use super::{EngineSession, ExecutionEngine, ExecutionRequest};
use crate::callback::ResultCallback;
use crate::error::{Error, Result};

/// Default executable name.
pub const DEFAULT_PLAYBOOK_EXECUTABLE: &str = "ansible-playbook";

/// Stdout callback producing one JSON object per event.
pub const DEFAULT_STDOUT_CALLBACK: &str = "ansible.posix.jsonl";

/// Runs playbooks through the `ansible-playbook` executable.
#[derive(Debug, Clone)]
pub struct AnsiblePlaybookEngine {
    program: PathBuf,
    stdout_callback: String,
    environment: IndexMap<String, String>,
}

impl Default for AnsiblePlaybookEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYBOOK_EXECUTABLE)
    }
}

impl AnsiblePlaybookEngine {
    /// Creates an engine launching `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            stdout_callback: DEFAULT_STDOUT_CALLBACK.to_string(),
            environment: IndexMap::new(),
        }
    }

    /// Creates an engine for `program`, resolved on `PATH` when it is a bare
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] if the executable cannot be found.
    pub fn locate(program: impl AsRef<Path>) -> Result<Self> {
        let program = program.as_ref();
        let resolved = which::which(program).map_err(|e| {
            Error::environment(program, format!("playbook engine not found ({e})"))
        })?;
        debug!(program = %resolved.display(), "Resolved playbook engine");
        Ok(Self::new(resolved))
    }

    /// Sets the stdout callback plugin the engine reports through.
    pub fn with_stdout_callback(mut self, callback: impl Into<String>) -> Self {
        self.stdout_callback = callback.into();
        self
    }

    /// Adds an environment variable for the engine process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Executable launched for each run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Builds the command-line arguments for `request`.
    pub fn command_args(&self, request: &ExecutionRequest) -> Result<Vec<OsString>> {
        let mut args: Vec<OsString> = vec!["-i".into(), request.hosts.inventory_arg().into()];
        args.extend(request.options.to_args());

        if !request.extra_vars.is_empty() {
            args.push("-e".into());
            args.push(serde_json::to_string(&request.extra_vars)?.into());
        }

        args.push(request.playbook.clone().into_os_string());
        Ok(args)
    }

    fn command(&self, request: &ExecutionRequest) -> Result<Command> {
        let mut command = Command::new(&self.program);
        command
            .args(self.command_args(request)?)
            .env("ANSIBLE_STDOUT_CALLBACK", &self.stdout_callback)
            .env("ANSIBLE_FORCE_COLOR", "0")
            .envs(&self.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(command)
    }
}

#[async_trait]
impl ExecutionEngine for AnsiblePlaybookEngine {
    fn name(&self) -> &str {
        "ansible-playbook"
    }

    async fn open(&self, request: &ExecutionRequest) -> Result<Box<dyn EngineSession>> {
        if request.hosts.is_empty() {
            return Err(Error::Config("no target hosts given".into()));
        }
        if !request.playbook.exists() {
            return Err(Error::environment(&request.playbook, "playbook not found"));
        }

        let command = self.command(request)?;
        debug!(
            program = %self.program.display(),
            playbook = %request.playbook.display(),
            hosts = request.hosts.len(),
            "Prepared engine session"
        );

        Ok(Box::new(AnsibleSession {
            program: self.program.display().to_string(),
            command: Some(command),
            child: None,
            stderr_task: None,
        }))
    }
}

/// One `ansible-playbook` process.
#[derive(Debug)]
pub struct AnsibleSession {
    program: String,
    command: Option<Command>,
    child: Option<Child>,
    stderr_task: Option<JoinHandle<()>>,
}

#[async_trait]
impl EngineSession for AnsibleSession {
    async fn run(&mut self, sink: &mut dyn ResultCallback) -> Result<i32> {
        let mut command = self
            .command
            .take()
            .ok_or_else(|| Error::Engine("engine session has already run".into()))?;

        let mut child = command.spawn().map_err(|source| Error::EngineSpawn {
            program: self.program.clone(),
            source,
        })?;
        info!(program = %self.program, pid = ?child.id(), "Started playbook engine");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Engine("engine stdout was not captured".into()))?;

        if let Some(stderr) = child.stderr.take() {
            self.stderr_task = Some(tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "ceph_copilot::engine::stderr", "{}", line);
                }
            }));
        }

        let child = self.child.insert(child);

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            for event in decode_line(&line) {
                sink.handle_event(event);
            }
        }

        let status = child.wait().await?;
        let rc = status.code().unwrap_or(-1);
        info!(rc, "Playbook engine finished");
        Ok(rc)
    }

    async fn cleanup(&mut self) {
        if let Some(mut child) = self.child.take() {
            if !matches!(child.try_wait(), Ok(Some(_))) {
                warn!(program = %self.program, "Stopping playbook engine");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to stop playbook engine");
                }
            }
        }

        if let Some(task) = self.stderr_task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Engine stderr reader ended abnormally");
            }
        }

        self.command = None;
    }
}
