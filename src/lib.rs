//! # ceph-copilot - Ceph Deployment Orchestration Glue
//!
//! The copilot drives an external configuration-management engine
//! (`ansible-playbook` with ceph-ansible) to provision a Ceph cluster, and
//! ships the small host-management helpers a deployment needs beforehand.
//!
//! Nothing here schedules tasks, parses inventories or resolves variables:
//! that all belongs to the engine. The copilot owns the run lifecycle, the
//! aggregation of per-host results, and the pre-flight checks.
//!
//! ## Core Concepts
//!
//! - **Runners**: execute an inline task list or a playbook file against a
//!   host list, with a fixed set of engine options
//! - **Result aggregation**: per-host outcome events folded into
//!   [`ExecutionStats`](callback::ExecutionStats), with an optional notifier
//!   for live displays
//! - **Host utilities**: host range expansion, DNS and SSH reachability,
//!   byte-size formatting, netmask conversion, YAML validation
//! - **Config patching**: quieting the engine's `ansible.cfg` for the duration
//!   of a session
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         copilot CLI                           │
//! └──────────────────────────────────────────────────────────────┘
//!                │                                   │
//!                ▼                                   ▼
//! ┌──────────────────────────────┐   ┌───────────────────────────┐
//! │  Runners (dynamic / static)  │   │  Host utilities / probes  │
//! └──────────────────────────────┘   └───────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐   events   ┌──────────────────┐
//! │  ExecutionEngine (process)   │ ─────────► │ ResultAggregator │
//! └──────────────────────────────┘            └──────────────────┘
//!                │
//!                ▼
//!        ansible-playbook
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use ceph_copilot::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let hosts = HostList::parse("mon[1-3]\nosd[1-6]")?;
//!     let engine = Arc::new(AnsiblePlaybookEngine::locate("ansible-playbook")?);
//!     let aggregator = ResultAggregator::new(TracingLogger::shared("site.yml"));
//!
//!     let mut runner = StaticPlaybook::with_callback(RunnerContext::new(hosts, engine), aggregator);
//!     runner.setup("/usr/share/ceph-ansible/site.yml".into())?;
//!     let rc = runner.run().await?;
//!
//!     let stats = runner.take_callback().map(ResultAggregator::into_stats);
//!     println!("rc={rc} stats={stats:?}");
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::callback::{
        ExecutionStats, HostResult, NullCallback, OutcomeKind, ResultAggregator, ResultCallback,
        ResultLogger, RunnerEvent, TracingLogger,
    };
    pub use crate::cfg_patch::{restore_ansible_cfg, setup_ansible_cfg, AnsibleCfg};
    pub use crate::engine::{AnsiblePlaybookEngine, ExecutionEngine, ExecutionRequest};
    pub use crate::error::{Error, Result};
    pub use crate::inventory::{expand_hosts, HostList};
    pub use crate::runner::{
        DynamicPlaybook, InlinePlaybook, PlaybookRunner, RunOptions, RunnerContext,
        StaticPlaybook,
    };
    pub use crate::utils::{bytes_to_human, check_dns, netmask_to_cidr, valid_yaml, SizeUnit};

    #[cfg(feature = "russh")]
    pub use crate::connection::{check_ssh_access, ProbeOutcome};
}

pub mod callback;

pub mod cfg_patch;

pub mod config;

pub mod connection;

pub mod engine;

pub mod error;

pub mod inventory;

pub mod runner;

pub mod utils;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build information for `--version` output and logs.
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        target: std::env::consts::ARCH,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Version and build details.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Package version
    pub version: &'static str,
    /// Target architecture
    pub target: &'static str,
    /// Build profile
    pub profile: &'static str,
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ceph-copilot {} ({}, {})",
            self.version, self.target, self.profile
        )
    }
}
