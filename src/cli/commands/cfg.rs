//! Cfg command - Patch or restore ceph-ansible's ansible.cfg

use super::CommandContext;
use anyhow::Result;
use ceph_copilot::cfg_patch::AnsibleCfg;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arguments for the cfg command
#[derive(Parser, Debug, Clone)]
pub struct CfgArgs {
    #[command(subcommand)]
    pub action: CfgAction,
}

/// Cfg actions
#[derive(Subcommand, Debug, Clone)]
pub enum CfgAction {
    /// Turn off deprecation warnings, keeping a backup
    Setup {
        /// ceph-ansible directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Put the backup back in place
    Restore {
        /// ceph-ansible directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

impl CfgArgs {
    /// Execute the cfg command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let (dir, setup) = match &self.action {
            CfgAction::Setup { dir } => (dir, true),
            CfgAction::Restore { dir } => (dir, false),
        };
        let dir = dir
            .clone()
            .unwrap_or_else(|| ctx.config.defaults.ceph_ansible_dir.clone());
        let cfg = AnsibleCfg::in_dir(&dir);

        if setup {
            if cfg.setup()? {
                ctx.output.success(&format!(
                    "Patched {} (backup at {})",
                    cfg.path().display(),
                    cfg.backup_path().display()
                ));
            } else {
                ctx.output
                    .success(&format!("{} already configured", cfg.path().display()));
            }
        } else if cfg.restore()? {
            ctx.output
                .success(&format!("Restored {}", cfg.path().display()));
        } else {
            ctx.output.success("No backup to restore");
        }

        Ok(0)
    }
}
