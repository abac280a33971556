//! SSH reachability probe over russh.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use russh::client::{Handle, Handler};
use russh::keys::key::PublicKey;
use russh::keys::load_secret_key;
use russh_keys::agent::client::AgentClient;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::known_hosts::{HostKeyStatus, KnownHosts};
use super::ProbeOutcome;
use crate::utils::{home_dir_of, DEFAULT_PROBE_TIMEOUT};

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Who probes, as whom, and how patiently.
#[derive(Debug, Clone)]
pub struct SshProbeSettings {
    ssh_user: String,
    port: u16,
    timeout: Duration,
    known_hosts: Arc<KnownHosts>,
    identity_files: Vec<PathBuf>,
}

impl SshProbeSettings {
    /// Settings for probing as `ssh_user` with the keys and `known_hosts` of
    /// `local_user`, or of the invoking user when `None`.
    pub fn new(local_user: Option<&str>, ssh_user: impl Into<String>) -> Self {
        let home = match local_user {
            Some(user) => home_dir_of(user).or_else(|| {
                warn!(user = %user, "Local user not found, using own home directory");
                dirs::home_dir()
            }),
            None => dirs::home_dir(),
        };

        let (known_hosts, identity_files) = match &home {
            Some(home) => (KnownHosts::load_from_home(home), default_identity_files(home)),
            None => (KnownHosts::default(), Vec::new()),
        };

        Self {
            ssh_user: ssh_user.into(),
            port: DEFAULT_SSH_PORT,
            timeout: DEFAULT_PROBE_TIMEOUT,
            known_hosts: Arc::new(known_hosts),
            identity_files,
        }
    }

    /// Sets the per-stage timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replaces the identity files tried after the agent.
    pub fn with_identity_files(mut self, files: Vec<PathBuf>) -> Self {
        self.identity_files = files;
        self
    }

    /// User logged in as.
    pub fn ssh_user(&self) -> &str {
        &self.ssh_user
    }

    /// Per-stage timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Private keys under `<home>/.ssh` that exist, most preferred first.
pub fn default_identity_files(home: &Path) -> Vec<PathBuf> {
    let ssh_dir = home.join(".ssh");
    ["id_ed25519", "id_ecdsa", "id_rsa", "id_dsa"]
        .into_iter()
        .map(|name| ssh_dir.join(name))
        .filter(|p| p.exists())
        .collect()
}

struct ProbeHandler {
    host: String,
    port: u16,
    known_hosts: Arc<KnownHosts>,
}

#[async_trait]
impl Handler for ProbeHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self
            .known_hosts
            .verify(&self.host, self.port, server_public_key)
        {
            HostKeyStatus::Verified => {
                trace!(host = %self.host, "Host key verified");
                Ok(true)
            }
            HostKeyStatus::Unknown => {
                debug!(host = %self.host, "Host not in known_hosts, accepting");
                Ok(true)
            }
            HostKeyStatus::Mismatch => Ok(false),
        }
    }
}

/// Attempts an SSH login to `host` and reports how far it got.
///
/// Connection, handshake and authentication are each bounded by the
/// configured timeout. The session is closed again after a successful login.
pub async fn probe_ssh(host: &str, settings: &SshProbeSettings) -> ProbeOutcome {
    let socket = match timeout(settings.timeout, TcpStream::connect((host, settings.port))).await
    {
        Ok(Ok(socket)) => socket,
        Ok(Err(e)) => {
            debug!(host = %host, error = %e, "TCP connect failed");
            return ProbeOutcome::NoRoute;
        }
        Err(_) => return ProbeOutcome::Timeout,
    };

    let mut config = russh::client::Config::default();
    config.inactivity_timeout = Some(settings.timeout);

    let handler = ProbeHandler {
        host: host.to_string(),
        port: settings.port,
        known_hosts: Arc::clone(&settings.known_hosts),
    };

    let mut session = match timeout(
        settings.timeout,
        russh::client::connect_stream(Arc::new(config), socket, handler),
    )
    .await
    {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            debug!(host = %host, error = %e, "SSH handshake failed");
            return ProbeOutcome::ProtocolError;
        }
        Err(_) => return ProbeOutcome::Timeout,
    };

    match timeout(
        settings.timeout,
        authenticate(&mut session, &settings.ssh_user, &settings.identity_files),
    )
    .await
    {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => return ProbeOutcome::AuthenticationFailed,
        Ok(Err(e)) => {
            debug!(host = %host, error = %e, "SSH authentication aborted");
            return ProbeOutcome::ProtocolError;
        }
        Err(_) => return ProbeOutcome::Timeout,
    }

    if let Err(e) = session
        .disconnect(russh::Disconnect::ByApplication, "probe complete", "en")
        .await
    {
        trace!(host = %host, error = %e, "Disconnect after probe failed");
    }

    ProbeOutcome::Reachable
}

async fn authenticate(
    session: &mut Handle<ProbeHandler>,
    user: &str,
    identity_files: &[PathBuf],
) -> Result<bool, russh::Error> {
    if try_agent_auth(session, user).await {
        return Ok(true);
    }

    for key_path in identity_files {
        let key_pair = match load_secret_key(key_path, None) {
            Ok(key) => key,
            Err(e) => {
                trace!(key = %key_path.display(), error = %e, "Skipping identity file");
                continue;
            }
        };

        if session
            .authenticate_publickey(user, Arc::new(key_pair))
            .await?
        {
            debug!(key = %key_path.display(), "Authenticated using key");
            return Ok(true);
        }
    }

    Ok(false)
}

async fn try_agent_auth(session: &mut Handle<ProbeHandler>, user: &str) -> bool {
    let mut agent = match AgentClient::connect_env().await {
        Ok(agent) => agent,
        Err(e) => {
            trace!(error = %e, "No SSH agent available");
            return false;
        }
    };

    let identities = match agent.request_identities().await {
        Ok(ids) => ids,
        Err(e) => {
            trace!(error = %e, "Failed to list agent identities");
            return false;
        }
    };

    for identity in identities {
        let (returned_agent, result) = session.authenticate_future(user, identity, agent).await;
        agent = returned_agent;

        match result {
            Ok(true) => {
                debug!("Authenticated using SSH agent");
                return true;
            }
            Ok(false) => trace!("Agent identity rejected"),
            Err(e) => trace!(error = %e, "Agent authentication attempt failed"),
        }
    }

    false
}

/// Returns the hosts that fail [`probe_ssh`], sorted by name.
///
/// Probes run concurrently. Every failure is logged with its outcome; none
/// stops the scan.
pub async fn check_ssh_access<S: AsRef<str>>(
    local_user: Option<&str>,
    ssh_user: &str,
    host_list: &[S],
    probe_timeout: Option<Duration>,
) -> Vec<String> {
    let settings = SshProbeSettings::new(local_user, ssh_user)
        .with_timeout(probe_timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT));
    check_ssh_access_with(&settings, host_list).await
}

/// [`check_ssh_access`] with explicit settings.
pub async fn check_ssh_access_with<S: AsRef<str>>(
    settings: &SshProbeSettings,
    host_list: &[S],
) -> Vec<String> {
    let probes = host_list.iter().map(|host| async move {
        let host = host.as_ref();
        (host, probe_ssh(host, settings).await)
    });

    let mut failed: Vec<String> = join_all(probes)
        .await
        .into_iter()
        .filter_map(|(host, outcome)| {
            if outcome.is_reachable() {
                return None;
            }
            warn!(host = %host, user = %settings.ssh_user, outcome = %outcome, "SSH probe failed");
            Some(host.to_string())
        })
        .collect();

    failed.sort();
    failed
}
