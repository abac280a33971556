//! Small utility commands: size, cidr, validate-yaml

use super::CommandContext;
use anyhow::{Context, Result};
use ceph_copilot::utils::{bytes_to_human, netmask_to_cidr, valid_yaml, SizeUnit};
use clap::Parser;
use std::path::PathBuf;

/// Arguments for the size command
#[derive(Parser, Debug, Clone)]
pub struct SizeArgs {
    /// Number of bytes
    #[arg(allow_hyphen_values = true)]
    pub bytes: i64,

    /// Force a unit (K, M, G, T or P)
    #[arg(long)]
    pub unit: Option<SizeUnit>,
}

impl SizeArgs {
    /// Execute the size command
    pub async fn execute(&self, _ctx: &mut CommandContext) -> Result<i32> {
        println!("{}", bytes_to_human(self.bytes, self.unit)?);
        Ok(0)
    }
}

/// Arguments for the cidr command
#[derive(Parser, Debug, Clone)]
pub struct CidrArgs {
    /// Dotted-quad netmask, e.g. 255.255.255.0
    pub netmask: String,
}

impl CidrArgs {
    /// Execute the cidr command
    pub async fn execute(&self, _ctx: &mut CommandContext) -> Result<i32> {
        println!("{}", netmask_to_cidr(&self.netmask)?);
        Ok(0)
    }
}

/// Arguments for the validate-yaml command
#[derive(Parser, Debug, Clone)]
pub struct ValidateYamlArgs {
    /// File to check
    pub file: PathBuf,
}

impl ValidateYamlArgs {
    /// Execute the validate-yaml command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let content = std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let lines: Vec<&str> = content.lines().collect();

        if valid_yaml(&lines)? {
            ctx.output
                .success(&format!("{} is valid YAML", self.file.display()));
            Ok(0)
        } else {
            ctx.output
                .error(&format!("{} is not valid YAML", self.file.display()));
            Ok(1)
        }
    }
}
