//! Exec command - Run an inline task list as a single play

use super::run::{PlayOptions, PlaySetup};
use super::CommandContext;
use anyhow::{Context, Result};
use ceph_copilot::callback::ResultAggregator;
use ceph_copilot::runner::{DynamicPlaybook, InlinePlaybook, PlaybookRunner, DEFAULT_PLAY_NAME};
use clap::Parser;
use std::path::PathBuf;

/// Arguments for the exec command
#[derive(Parser, Debug, Clone)]
pub struct ExecArgs {
    /// YAML file holding a list of tasks
    #[arg(long)]
    pub tasks: PathBuf,

    /// Name of the generated play
    #[arg(long, default_value = DEFAULT_PLAY_NAME)]
    pub name: String,

    #[command(flatten)]
    pub play: PlayOptions,
}

impl ExecArgs {
    /// Execute the exec command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let text = std::fs::read_to_string(&self.tasks)
            .with_context(|| format!("Failed to read task file: {}", self.tasks.display()))?;
        let inline = InlinePlaybook::from_yaml(self.name.clone(), &text)?;

        if !self.play.json {
            ctx.output.banner(&format!("PLAY: {}", self.name));
        }

        let PlaySetup {
            context,
            aggregator,
            progress,
        } = self.play.prepare(ctx, &self.name)?;

        let mut runner = DynamicPlaybook::with_callback(context, aggregator);
        if let Err(e) = runner.setup(inline) {
            progress.finish();
            return Err(e.into());
        }

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
