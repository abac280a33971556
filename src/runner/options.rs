//! Options handed to the playbook engine for every run.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Transport used to reach target hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// OpenSSH remote shell
    #[default]
    Ssh,
    /// Paramiko SSH implementation
    Paramiko,
    /// Execute on the control node
    Local,
}

impl ConnectionKind {
    /// Name understood by the engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Ssh => "ssh",
            ConnectionKind::Paramiko => "paramiko",
            ConnectionKind::Local => "local",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Privilege escalation method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BecomeMethod {
    /// Escalate with sudo
    #[default]
    Sudo,
    /// Escalate with su
    Su,
    /// Escalate with doas
    Doas,
}

impl BecomeMethod {
    /// Name understood by the engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            BecomeMethod::Sudo => "sudo",
            BecomeMethod::Su => "su",
            BecomeMethod::Doas => "doas",
        }
    }
}

impl fmt::Display for BecomeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine options, fixed for the lifetime of a runner.
///
/// The defaults are what every copilot deployment uses: OpenSSH transport,
/// 100 parallel targets, sudo to root, no check/diff/listing modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Connection transport
    pub connection: ConnectionKind,
    /// Extra module search path (none when unset)
    pub module_path: Option<PathBuf>,
    /// Number of hosts worked on in parallel
    pub forks: usize,
    /// Run tasks with privilege escalation
    pub r#become: bool,
    /// Privilege escalation method
    pub become_method: BecomeMethod,
    /// User to escalate to
    pub become_user: String,
    /// Dry-run mode
    pub check: bool,
    /// Show file differences
    pub diff: bool,
    /// List tags instead of running
    pub list_tags: bool,
    /// List tasks instead of running
    pub list_tasks: bool,
    /// List hosts instead of running
    pub list_hosts: bool,
    /// Only check playbook syntax
    pub syntax: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            connection: ConnectionKind::Ssh,
            module_path: None,
            forks: 100,
            r#become: true,
            become_method: BecomeMethod::Sudo,
            become_user: "root".to_string(),
            check: false,
            diff: false,
            list_tags: false,
            list_tasks: false,
            list_hosts: false,
            syntax: false,
        }
    }
}

impl RunOptions {
    /// Renders the options as `ansible-playbook` command-line flags.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--connection".into(),
            self.connection.as_str().into(),
            "--forks".into(),
            self.forks.to_string().into(),
        ];

        if let Some(path) = &self.module_path {
            args.push("--module-path".into());
            args.push(path.clone().into_os_string());
        }

        if self.r#become {
            args.push("--become".into());
            args.push("--become-method".into());
            args.push(self.become_method.as_str().into());
            args.push("--become-user".into());
            args.push(self.become_user.clone().into());
        }

        let flags = [
            (self.check, "--check"),
            (self.diff, "--diff"),
            (self.list_tags, "--list-tags"),
            (self.list_tasks, "--list-tasks"),
            (self.list_hosts, "--list-hosts"),
            (self.syntax, "--syntax-check"),
        ];
        args.extend(
            flags
                .into_iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| OsString::from(flag)),
        );

        args
    }
}
