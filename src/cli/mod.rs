//! CLI module for the copilot
//!
//! This module provides the command-line interface, including argument
//! parsing and subcommand handling.

pub mod commands;
pub mod output;
pub mod progress;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ceph_copilot::inventory::HostList;

/// ceph-copilot - drive ceph-ansible deployments
#[derive(Parser, Debug, Clone)]
#[command(name = "copilot")]
#[command(version)]
#[command(about = "Drive ceph-ansible playbooks and check deployment hosts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "COPILOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a playbook file
    Run(commands::run::RunArgs),

    /// Run an inline task list as a single play
    Exec(commands::exec::ExecArgs),

    /// Check DNS resolution and SSH access of hosts
    #[command(name = "check-hosts")]
    CheckHosts(commands::hosts::CheckHostsArgs),

    /// Patch or restore ceph-ansible's ansible.cfg
    Cfg(commands::cfg::CfgArgs),

    /// Format a byte count for humans
    Size(commands::util::SizeArgs),

    /// Convert a netmask to its prefix length
    Cidr(commands::util::CidrArgs),

    /// Check that a file is valid YAML
    #[command(name = "validate-yaml")]
    ValidateYaml(commands::util::ValidateYamlArgs),
}

/// Target host selection shared by several commands
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct HostArgs {
    /// Comma or newline separated hosts; `prefix[1-3]` ranges are expanded
    #[arg(long)]
    pub hosts: Option<String>,

    /// File with one host (or host range) per line
    #[arg(long)]
    pub hosts_file: Option<PathBuf>,
}

impl HostArgs {
    /// Loads and expands the selected hosts.
    pub fn load(&self) -> anyhow::Result<HostList> {
        let text = match (&self.hosts, &self.hosts_file) {
            (Some(inline), _) => inline.replace(',', "\n"),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read hosts file {}: {}", path.display(), e)
            })?,
            (None, None) => String::new(),
        };

        let hosts = HostList::parse(&text)?;
        if hosts.is_empty() {
            anyhow::bail!("No hosts given");
        }
        Ok(hosts)
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["copilot", "run", "site.yml", "--hosts", "mon1"]).unwrap();
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["copilot", "-vvvv", "cidr", "255.0.0.0"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_hosts_are_exclusive_and_required() {
        assert!(Cli::try_parse_from(["copilot", "run", "site.yml"]).is_err());
        assert!(Cli::try_parse_from([
            "copilot",
            "run",
            "site.yml",
            "--hosts",
            "a",
            "--hosts-file",
            "h.txt"
        ])
        .is_err());
    }

    #[test]
    fn test_inline_hosts_expand() {
        let args = HostArgs {
            hosts: Some("mon1,osd[1-2]".into()),
            hosts_file: None,
        };
        let hosts = args.load().unwrap();
        assert_eq!(hosts.as_slice(), &["mon1", "osd1", "osd2"]);
    }
}
