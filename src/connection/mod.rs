//! Remote-shell reachability probing.
//!
//! Before a deployment every target is checked for an SSH login as the
//! deployment user. Each probe ends in a [`ProbeOutcome`]; anything but
//! [`ProbeOutcome::Reachable`] marks the host as unreachable and the scan
//! moves on to the next host.

#[cfg(feature = "russh")]
pub mod known_hosts;
#[cfg(feature = "russh")]
pub mod probe;

#[cfg(feature = "russh")]
pub use known_hosts::{HostKeyStatus, KnownHosts};
#[cfg(feature = "russh")]
pub use probe::{
    check_ssh_access, check_ssh_access_with, default_identity_files, probe_ssh, SshProbeSettings,
    DEFAULT_SSH_PORT,
};

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an SSH probe of one host ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Logged in successfully
    Reachable,
    /// A stage did not finish in time
    Timeout,
    /// The server refused every credential
    AuthenticationFailed,
    /// The SSH handshake failed or the host key was rejected
    ProtocolError,
    /// No TCP connection could be made
    NoRoute,
}

impl ProbeOutcome {
    /// Whether the host accepted the login.
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeOutcome::Reachable => "reachable",
            ProbeOutcome::Timeout => "timed out",
            ProbeOutcome::AuthenticationFailed => "authentication failed",
            ProbeOutcome::ProtocolError => "ssh protocol error",
            ProbeOutcome::NoRoute => "no route to host",
        };
        f.write_str(s)
    }
}
