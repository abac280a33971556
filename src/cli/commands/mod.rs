//! Subcommands module for the copilot CLI
//!
//! This module contains all the subcommand implementations.

pub mod cfg;
pub mod exec;
pub mod hosts;
pub mod run;
pub mod util;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use ceph_copilot::cfg_patch::AnsibleCfg;
use ceph_copilot::config::Config;
use ceph_copilot::engine::{AnsiblePlaybookEngine, ExecutionEngine};
use std::sync::Arc;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.colors.enabled;
        let output = OutputFormatter::new(use_color, cli.verbosity());

        Self { config, output }
    }

    /// Builds the playbook engine described by the configuration.
    pub fn engine(&self) -> Result<Arc<dyn ExecutionEngine>> {
        let settings = &self.config.engine;

        let mut engine = AnsiblePlaybookEngine::locate(&settings.playbook_executable)?
            .with_stdout_callback(settings.stdout_callback.clone());
        for (key, value) in &settings.environment {
            engine = engine.with_env(key.clone(), value.clone());
        }

        // The engine only reads ansible.cfg from its working directory
        // unless pointed at it.
        let cfg = AnsibleCfg::in_dir(&self.config.defaults.ceph_ansible_dir);
        if cfg.path().exists() && !settings.environment.contains_key("ANSIBLE_CONFIG") {
            engine = engine.with_env("ANSIBLE_CONFIG", cfg.path().display().to_string());
        }

        Ok(Arc::new(engine))
    }
}
