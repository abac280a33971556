//! Check-hosts command - Pre-flight DNS and SSH reachability checks

use super::CommandContext;
use crate::cli::HostArgs;
use anyhow::Result;
use ceph_copilot::utils::check_dns;
use clap::Parser;

/// Arguments for the check-hosts command
#[derive(Parser, Debug, Clone)]
pub struct CheckHostsArgs {
    #[command(flatten)]
    pub hosts: HostArgs,

    /// Only check DNS resolution
    #[arg(long)]
    pub skip_ssh: bool,

    /// User to log in as (defaults to the configured ssh_user)
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Print the failed hosts as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckHostsArgs {
    /// Execute the check-hosts command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let hosts = self.hosts.load()?;
        let probe = &ctx.config.probe;

        ctx.output
            .info(&format!("Resolving {} host(s)", hosts.len()));
        let dns_failed = check_dns(hosts.as_slice(), Some(probe.dns_timeout())).await;

        let resolvable: Vec<String> = hosts
            .iter()
            .filter(|h| !dns_failed.iter().any(|f| f.as_str() == *h))
            .map(str::to_string)
            .collect();

        let ssh_failed = if self.skip_ssh {
            Vec::new()
        } else {
            self.check_ssh(ctx, &resolvable).await
        };

        if self.json {
            let report = serde_json::json!({
                "dns_failed": dns_failed,
                "ssh_failed": ssh_failed,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            if !dns_failed.is_empty() {
                ctx.output.list("Hosts failing DNS resolution:", &dns_failed);
            }
            if !ssh_failed.is_empty() {
                ctx.output.list("Hosts refusing SSH access:", &ssh_failed);
            }
            if dns_failed.is_empty() && ssh_failed.is_empty() {
                ctx.output.success("All hosts reachable.");
            }
        }

        Ok(if dns_failed.is_empty() && ssh_failed.is_empty() {
            0
        } else {
            1
        })
    }

    #[cfg(feature = "russh")]
    async fn check_ssh(&self, ctx: &CommandContext, hosts: &[String]) -> Vec<String> {
        use ceph_copilot::connection::{check_ssh_access_with, SshProbeSettings};
        use ceph_copilot::utils::{current_user, user_exists};

        let defaults = &ctx.config.defaults;
        let ssh_user = self.user.as_deref().unwrap_or(&defaults.ssh_user);
        let local_user = defaults.local_user.clone().or_else(current_user);

        if let Some(user) = &local_user {
            if !user_exists(user) {
                ctx.output
                    .warning(&format!("Local user '{}' does not exist", user));
            }
        }

        ctx.output.info(&format!(
            "Probing SSH on {} host(s) as {}",
            hosts.len(),
            ssh_user
        ));

        let settings = SshProbeSettings::new(local_user.as_deref(), ssh_user)
            .with_timeout(ctx.config.probe.ssh_timeout())
            .with_port(ctx.config.probe.ssh_port);
        check_ssh_access_with(&settings, hosts).await
    }

    #[cfg(not(feature = "russh"))]
    async fn check_ssh(&self, ctx: &CommandContext, _hosts: &[String]) -> Vec<String> {
        ctx.output
            .warning("Built without SSH support; skipping SSH checks");
        Vec::new()
    }
}
