//! Run command - Execute a playbook file
//!
//! Also holds the pieces `run` and `exec` share: host and extra-vars
//! handling, the live progress line, the `ansible.cfg` patch around the run,
//! and the final report.

use super::CommandContext;
use crate::cli::progress::PlaybookProgress;
use crate::cli::HostArgs;
use anyhow::{Context, Result};
use ceph_copilot::callback::{ExecutionStats, ResultAggregator, TracingLogger};
use ceph_copilot::cfg_patch::{restore_ansible_cfg, setup_ansible_cfg};
use ceph_copilot::runner::{PlaybookRunner, RunnerContext, StaticPlaybook};
use clap::{Args, Parser};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::path::PathBuf;

/// Options shared by the playbook-running commands
#[derive(Args, Debug, Clone)]
pub struct PlayOptions {
    #[command(flatten)]
    pub hosts: HostArgs,

    /// Extra variables (key=value or @file.yml)
    #[arg(short = 'e', long = "extra-vars", action = clap::ArgAction::Append)]
    pub extra_vars: Vec<String>,

    /// Print the final statistics as JSON instead of a recap
    #[arg(long)]
    pub json: bool,

    /// Leave ansible.cfg untouched
    #[arg(long)]
    pub no_cfg_patch: bool,
}

/// Everything a playbook run needs before the runner is built
pub struct PlaySetup {
    /// Shared runner context
    pub context: RunnerContext,
    /// Result sink
    pub aggregator: ResultAggregator,
    /// Live progress line fed by the aggregator
    pub progress: PlaybookProgress,
}

impl PlayOptions {
    /// Loads hosts and extra vars and wires the aggregator to a progress line.
    pub fn prepare(&self, ctx: &CommandContext, title: &str) -> Result<PlaySetup> {
        let hosts = self.hosts.load()?;
        ctx.output
            .info(&format!("Targeting {} host(s): {}", hosts.len(), hosts));

        let mut context = RunnerContext::new(hosts, ctx.engine()?);
        for (key, value) in parse_extra_vars(&self.extra_vars)? {
            context = context.with_extra_var(key, value);
        }

        let progress = PlaybookProgress::new(title, self.json);
        let aggregator =
            ResultAggregator::new(TracingLogger::shared(title)).with_notifier(progress.notifier());

        Ok(PlaySetup {
            context,
            aggregator,
            progress,
        })
    }

    /// Runs `run` with ansible.cfg patched, unless disabled.
    ///
    /// The file is restored whether or not the run succeeds.
    pub async fn with_cfg_patch<F, T>(&self, ctx: &CommandContext, run: F) -> Result<T>
    where
        F: Future<Output = ceph_copilot::error::Result<T>>,
    {
        if self.no_cfg_patch {
            return Ok(run.await?);
        }

        let dir = &ctx.config.defaults.ceph_ansible_dir;
        if setup_ansible_cfg(dir)? {
            ctx.output.info("Disabled deprecation warnings in ansible.cfg");
        }

        let result = run.await;

        if let Err(e) = restore_ansible_cfg(dir) {
            ctx.output
                .warning(&format!("Failed to restore ansible.cfg: {}", e));
        }

        Ok(result?)
    }

    /// Prints the recap (or JSON) and returns the exit code.
    pub fn report(
        &self,
        ctx: &CommandContext,
        progress: &PlaybookProgress,
        rc: i32,
        stats: &ExecutionStats,
    ) -> Result<i32> {
        progress.finish();

        if self.json {
            let report = serde_json::json!({ "rc": rc, "stats": stats });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            ctx.output.recap(stats, rc);
        }

        Ok(rc)
    }
}

/// Parses `key=value` pairs and `@file` references into extra vars.
///
/// Values are read as YAML, so `osds=3` gives a number and `flag=true` a
/// boolean; anything unparseable is kept as a string.
pub fn parse_extra_vars(raw: &[String]) -> Result<IndexMap<String, JsonValue>> {
    let mut vars = IndexMap::new();

    for var in raw {
        if let Some(file_path) = var.strip_prefix('@') {
            let content = std::fs::read_to_string(file_path)
                .with_context(|| format!("Failed to read extra vars file: {}", file_path))?;
            let file_vars: IndexMap<String, JsonValue> = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse extra vars file: {}", file_path))?;
            vars.extend(file_vars);
        } else if let Some((key, value)) = var.split_once('=') {
            let parsed: JsonValue = if value.is_empty() {
                JsonValue::String(String::new())
            } else {
                serde_yaml::from_str(value)
                    .unwrap_or_else(|_| JsonValue::String(value.to_string()))
            };
            vars.insert(key.to_string(), parsed);
        } else {
            anyhow::bail!("Extra variable '{}' is not key=value or @file", var);
        }
    }

    Ok(vars)
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the playbook file
    #[arg(required = true)]
    pub playbook: PathBuf,

    #[command(flatten)]
    pub play: PlayOptions,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let title = self
            .playbook
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();

        if !self.play.json {
            ctx.output.banner(&format!("PLAYBOOK: {}", title));
        }

        let PlaySetup {
            context,
            aggregator,
            progress,
        } = self.play.prepare(ctx, &title)?;

        let mut runner = StaticPlaybook::with_callback(context, aggregator);
        runner.setup(self.playbook.clone())?;

        let rc = match self.play.with_cfg_patch(ctx, runner.run()).await {
            Ok(rc) => rc,
            Err(e) => {
                progress.finish();
                return Err(e);
            }
        };

        let stats = runner
            .take_callback()
            .map(ResultAggregator::into_stats)
            .unwrap_or_default();

        self.play.report(ctx, &progress, rc, &stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_extra_vars_types() {
        let vars = parse_extra_vars(&[
            "osds=3".to_string(),
            "fsid=abc-123".to_string(),
            "dashboard=true".to_string(),
        ])
        .unwrap();

        assert_eq!(vars["osds"], json!(3));
        assert_eq!(vars["fsid"], json!("abc-123"));
        assert_eq!(vars["dashboard"], json!(true));
    }

    #[test]
    fn test_parse_extra_vars_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"monitor_interface: eth0\n").unwrap();

        let vars = parse_extra_vars(&[format!("@{}", file.path().display())]).unwrap();
        assert_eq!(vars["monitor_interface"], json!("eth0"));
    }

    #[test]
    fn test_parse_extra_vars_empty_value_is_empty_string() {
        let vars = parse_extra_vars(&["rgw_zone=".to_string()]).unwrap();
        assert_eq!(vars["rgw_zone"], json!(""));
    }

    #[test]
    fn test_parse_extra_vars_rejects_bare_word() {
        assert!(parse_extra_vars(&["oops".to_string()]).is_err());
    }
}
