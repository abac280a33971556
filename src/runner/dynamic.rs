//! Inline-task runner.
//!
//! The task list is wrapped in a synthetic play targeting every host in the
//! inventory with fact gathering disabled, written to a private temporary
//! playbook and handed to the engine.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde_yaml::Value as YamlValue;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{PlaybookRunner, RunnerContext, RunnerState};
use crate::callback::{NullCallback, ResultCallback};
use crate::error::{Error, Result};

/// Play name used when none is given.
pub const DEFAULT_PLAY_NAME: &str = "Dynamic playbook";

/// A named task list to run as a single play.
#[derive(Debug, Clone, PartialEq)]
pub struct InlinePlaybook {
    /// Display name of the play
    pub name: String,
    /// Task list; must be a non-empty sequence
    pub tasks: Option<YamlValue>,
}

#[derive(Serialize)]
struct SyntheticPlay<'a> {
    name: &'a str,
    hosts: &'static str,
    gather_facts: bool,
    tasks: &'a YamlValue,
}

impl InlinePlaybook {
    /// Creates an inline playbook from a task list.
    pub fn new(name: impl Into<String>, tasks: YamlValue) -> Self {
        Self {
            name: name.into(),
            tasks: Some(tasks),
        }
    }

    /// Creates an inline playbook from YAML task list text.
    pub fn from_yaml(name: impl Into<String>, text: &str) -> Result<Self> {
        let tasks: YamlValue = serde_yaml::from_str(text)?;
        Ok(Self::new(name, tasks))
    }

    fn validated_tasks(&self) -> Result<&YamlValue> {
        match &self.tasks {
            None | Some(YamlValue::Null) => {
                Err(Error::InvalidTasks("no task list given".into()))
            }
            Some(YamlValue::Sequence(items)) if items.is_empty() => {
                Err(Error::InvalidTasks("task list is empty".into()))
            }
            Some(tasks @ YamlValue::Sequence(_)) => Ok(tasks),
            Some(other) => Err(Error::InvalidTasks(format!(
                "expected a list of tasks, got {}",
                yaml_kind(other)
            ))),
        }
    }

    /// Renders the synthetic one-play playbook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTasks`] if the task list is missing, empty or
    /// not a sequence.
    pub fn render_play(&self) -> Result<String> {
        let tasks = self.validated_tasks()?;
        let play = SyntheticPlay {
            name: &self.name,
            hosts: "all",
            gather_facts: false,
            tasks,
        };
        Ok(serde_yaml::to_string(&[play])?)
    }
}

impl Default for InlinePlaybook {
    fn default() -> Self {
        Self {
            name: DEFAULT_PLAY_NAME.to_string(),
            tasks: None,
        }
    }
}

fn yaml_kind(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a list",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    }
}

/// Runs an inline task list against the context's hosts.
///
/// Engine resources are released after every run, whether it succeeded or
/// not.
#[derive(Debug)]
pub struct DynamicPlaybook<C = NullCallback> {
    context: RunnerContext,
    callback: Option<C>,
    play: Option<NamedTempFile>,
    play_name: String,
    rc: i32,
    state: RunnerState,
}

impl DynamicPlaybook {
    /// Creates a runner that discards events.
    pub fn new(context: RunnerContext) -> Self {
        Self::build(context, None)
    }
}

impl<C: ResultCallback> DynamicPlaybook<C> {
    /// Creates a runner reporting into `callback`.
    pub fn with_callback(context: RunnerContext, callback: C) -> Self {
        Self::build(context, Some(callback))
    }

    fn build(context: RunnerContext, callback: Option<C>) -> Self {
        Self {
            context,
            callback,
            play: None,
            play_name: DEFAULT_PLAY_NAME.to_string(),
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

    /// Name of the configured play.
    pub fn play_name(&self) -> &str {
        &self.play_name
    }

    /// Path of the generated playbook, once configured.
    pub fn playbook_path(&self) -> Option<&Path> {
        self.play.as_ref().map(NamedTempFile::path)
    }
}

#[async_trait]
impl<C: ResultCallback> PlaybookRunner for DynamicPlaybook<C> {
    type Definition = InlinePlaybook;

    fn setup(&mut self, definition: InlinePlaybook) -> Result<()> {
        let rendered = definition.render_play()?;

        let mut file = tempfile::Builder::new()
            .prefix("copilot-play-")
            .suffix(".yml")
            .tempfile()?;
        file.write_all(rendered.as_bytes())?;
        file.flush()?;

        debug!(play = %definition.name, path = %file.path().display(), "Wrote synthetic play");

        self.play = Some(file);
        self.play_name = definition.name;
        self.state = RunnerState::Configured;
        Ok(())
    }

    async fn run(&mut self) -> Result<i32> {
        let play = self
            .play
            .as_ref()
            .ok_or_else(|| Error::Config("dynamic playbook is not configured".into()))?;
        let request = self.context.request(play.path());

        info!(
            play = %self.play_name,
            hosts = self.context.hosts().len(),
            engine = self.context.engine().name(),
            "Running dynamic playbook"
        );

        let mut session = self.context.engine().open(&request).await?;
        let outcome = match self.callback.as_mut() {
            Some(callback) => session.run(callback).await,
            None => session.run(&mut NullCallback).await,
        };
        session.cleanup().await;

        let rc = outcome?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnsiblePlaybookEngine;
    use crate::inventory::HostList;
    use std::sync::Arc;

    fn context() -> RunnerContext {
        RunnerContext::new(
            HostList::new(["mon1"]),
            Arc::new(AnsiblePlaybookEngine::default()),
        )
    }

    #[test]
    fn test_missing_tasks_rejected() {
        let mut runner = DynamicPlaybook::new(context());
        let err = runner.setup(InlinePlaybook::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidTasks(_)));
        assert_eq!(runner.state(), RunnerState::Created);
    }

    #[test]
    fn test_non_sequence_tasks_rejected() {
        let inline = InlinePlaybook::from_yaml("p", "name: ping\nping: {}\n").unwrap();
        let err = DynamicPlaybook::new(context()).setup(inline).unwrap_err();
        assert!(err.to_string().contains("a mapping"));
    }

    #[test]
    fn test_empty_tasks_rejected() {
        let inline = InlinePlaybook::from_yaml("p", "[]").unwrap();
        assert!(DynamicPlaybook::new(context()).setup(inline).is_err());
    }

    #[test]
    fn test_synthetic_play_shape() {
        let inline = InlinePlaybook::from_yaml("install", "- name: ping\n  ping: {}\n").unwrap();
        let rendered: YamlValue = serde_yaml::from_str(&inline.render_play().unwrap()).unwrap();

        let play = &rendered[0];
        assert_eq!(play["name"], YamlValue::from("install"));
        assert_eq!(play["hosts"], YamlValue::from("all"));
        assert_eq!(play["gather_facts"], YamlValue::from(false));
        assert_eq!(play["tasks"][0]["name"], YamlValue::from("ping"));
    }

    #[test]
    fn test_setup_writes_playbook_and_overwrites() {
        let mut runner = DynamicPlaybook::new(context());
        let first = InlinePlaybook::from_yaml("first", "- ping: {}").unwrap();
        let second = InlinePlaybook::from_yaml("second", "- ping: {}").unwrap();

        runner.setup(first).unwrap();
        runner.setup(second).unwrap();

        assert_eq!(runner.state(), RunnerState::Configured);
        assert_eq!(runner.play_name(), "second");
        let content = std::fs::read_to_string(runner.playbook_path().unwrap()).unwrap();
        assert!(content.contains("second"));
    }

    #[tokio::test]
    async fn test_run_before_setup_is_config_error() {
        let mut runner = DynamicPlaybook::new(context());
        let err = runner.run().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(runner.rc(), 0);
    }
}
