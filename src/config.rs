//! Configuration for the copilot.
//!
//! Settings are layered, later sources overriding earlier ones:
//! - Default values
//! - System configuration (/etc/copilot/copilot.toml)
//! - User configuration (~/.copilot.toml)
//! - Project configuration (./copilot.toml)
//! - Environment variables (`COPILOT_*`)
//! - Command-line arguments

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cfg_patch::DEFAULT_CEPH_ANSIBLE_DIR;
use crate::engine::{DEFAULT_PLAYBOOK_EXECUTABLE, DEFAULT_STDOUT_CALLBACK};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment defaults
    pub defaults: Defaults,

    /// Playbook engine settings
    pub engine: EngineConfig,

    /// Reachability probe settings
    pub probe: ProbeConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Deployment defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// ceph-ansible checkout holding `ansible.cfg` and the playbooks
    pub ceph_ansible_dir: PathBuf,

    /// User logged in as on the targets
    pub ssh_user: String,

    /// Local user whose SSH keys and known_hosts are used
    pub local_user: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            ceph_ansible_dir: PathBuf::from(DEFAULT_CEPH_ANSIBLE_DIR),
            ssh_user: "root".to_string(),
            local_user: None,
        }
    }
}

/// Playbook engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable name or path
    pub playbook_executable: String,

    /// Stdout callback producing line-delimited JSON events
    pub stdout_callback: String,

    /// Extra environment for the engine process
    pub environment: IndexMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            playbook_executable: DEFAULT_PLAYBOOK_EXECUTABLE.to_string(),
            stdout_callback: DEFAULT_STDOUT_CALLBACK.to_string(),
            environment: IndexMap::new(),
        }
    }
}

/// Reachability probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// DNS lookup timeout in seconds
    pub dns_timeout_secs: u64,

    /// SSH probe timeout in seconds
    pub ssh_timeout_secs: u64,

    /// SSH port on the targets
    pub ssh_port: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            dns_timeout_secs: 2,
            ssh_timeout_secs: 2,
            ssh_port: 22,
        }
    }
}

impl ProbeConfig {
    /// DNS lookup timeout.
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    /// SSH probe timeout.
    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_timeout_secs)
    }
}

/// Colors and output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colored output
    pub enabled: bool,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when neither `-v` nor `RUST_LOG` is given
    pub level: String,

    /// Log file; stderr when unset
    pub log_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_path: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();
        config.expand_paths();

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/copilot/copilot.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".copilot.toml"));
        }

        paths.push(PathBuf::from("copilot.toml"));

        if let Ok(env_config) = std::env::var("COPILOT_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; values left at their defaults in
    /// `other` do not override.
    fn merge(&self, other: Config) -> Config {
        let defaults = Defaults::default();
        let engine = EngineConfig::default();
        let probe = ProbeConfig::default();
        let logging = LoggingConfig::default();

        fn pick<T: PartialEq + Clone>(other: T, current: &T, default: &T) -> T {
            if &other != default {
                other
            } else {
                current.clone()
            }
        }

        Config {
            defaults: Defaults {
                ceph_ansible_dir: pick(
                    other.defaults.ceph_ansible_dir,
                    &self.defaults.ceph_ansible_dir,
                    &defaults.ceph_ansible_dir,
                ),
                ssh_user: pick(
                    other.defaults.ssh_user,
                    &self.defaults.ssh_user,
                    &defaults.ssh_user,
                ),
                local_user: other
                    .defaults
                    .local_user
                    .or_else(|| self.defaults.local_user.clone()),
            },
            engine: EngineConfig {
                playbook_executable: pick(
                    other.engine.playbook_executable,
                    &self.engine.playbook_executable,
                    &engine.playbook_executable,
                ),
                stdout_callback: pick(
                    other.engine.stdout_callback,
                    &self.engine.stdout_callback,
                    &engine.stdout_callback,
                ),
                environment: {
                    let mut env = self.engine.environment.clone();
                    env.extend(other.engine.environment);
                    env
                },
            },
            probe: ProbeConfig {
                dns_timeout_secs: pick(
                    other.probe.dns_timeout_secs,
                    &self.probe.dns_timeout_secs,
                    &probe.dns_timeout_secs,
                ),
                ssh_timeout_secs: pick(
                    other.probe.ssh_timeout_secs,
                    &self.probe.ssh_timeout_secs,
                    &probe.ssh_timeout_secs,
                ),
                ssh_port: pick(other.probe.ssh_port, &self.probe.ssh_port, &probe.ssh_port),
            },
            colors: ColorsConfig {
                enabled: self.colors.enabled && other.colors.enabled,
            },
            logging: LoggingConfig {
                level: pick(other.logging.level, &self.logging.level, &logging.level),
                log_path: other
                    .logging
                    .log_path
                    .or_else(|| self.logging.log_path.clone()),
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("COPILOT_CEPH_ANSIBLE_DIR") {
            self.defaults.ceph_ansible_dir = PathBuf::from(dir);
        }

        if let Ok(user) = std::env::var("COPILOT_SSH_USER") {
            self.defaults.ssh_user = user;
        }

        if let Ok(user) = std::env::var("COPILOT_LOCAL_USER") {
            self.defaults.local_user = Some(user);
        }

        if let Ok(exe) = std::env::var("COPILOT_PLAYBOOK_EXECUTABLE") {
            self.engine.playbook_executable = exe;
        }

        if let Ok(timeout) = std::env::var("COPILOT_DNS_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.probe.dns_timeout_secs = n;
            }
        }

        if let Ok(timeout) = std::env::var("COPILOT_SSH_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.probe.ssh_timeout_secs = n;
            }
        }

        if std::env::var("NO_COLOR").is_ok() || std::env::var("COPILOT_NO_COLOR").is_ok() {
            self.colors.enabled = false;
        }

        if let Ok(level) = std::env::var("COPILOT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(path) = std::env::var("COPILOT_LOG_PATH") {
            self.logging.log_path = Some(PathBuf::from(path));
        }
    }

    /// Expands `~` and environment variables in path settings.
    fn expand_paths(&mut self) {
        self.defaults.ceph_ansible_dir = expand_path(&self.defaults.ceph_ansible_dir);
        if let Some(path) = &self.logging.log_path {
            self.logging.log_path = Some(expand_path(path));
        }
    }

    /// Load from a specific file, without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}

/// Expands `~` and `$VARS` in a path, leaving it unchanged on failure.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
