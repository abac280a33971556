//! Error types for the copilot.
//!
//! Per-host task outcomes are not errors: they are delivered as events to the
//! result aggregator. The variants here cover programmer-contract violations,
//! environment problems and failures of the external engine itself.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for copilot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the copilot.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An inline playbook was given a missing or malformed task list.
    #[error("Dynamic playbook created with missing/invalid tasks: {0}")]
    InvalidTasks(String),

    // ========================================================================
    // Environment Errors
    // ========================================================================
    /// A file the copilot depends on is not where it is expected.
    #[error("{message}: {}", path.display())]
    Environment {
        /// Path that was expected to exist
        path: PathBuf,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Value Errors
    // ========================================================================
    /// A value is outside the accepted domain.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The playbook engine executable could not be started.
    #[error("Failed to start '{program}': {source}")]
    EngineSpawn {
        /// Program that was launched
        program: String,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// The playbook engine misbehaved while running.
    #[error("Playbook engine error: {0}")]
    Engine(String),

    // ========================================================================
    // IO and Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new environment error.
    pub fn environment(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Environment {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Returns true if this error is a caller contract violation rather than a
    /// runtime condition.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidTasks(_))
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidTasks(_) => 2,
            Error::Environment { .. } => 3,
            Error::EngineSpawn { .. } | Error::Engine(_) => 4,
            Error::InvalidValue(_) | Error::YamlParse(_) | Error::JsonParse(_) => 5,
            Error::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_display() {
        let err = Error::environment("/tmp/ansible.cfg", "ansible.cfg is missing");
        assert_eq!(err.to_string(), "ansible.cfg is missing: /tmp/ansible.cfg");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_configuration_classification() {
        assert!(Error::InvalidTasks("empty".into()).is_configuration());
        assert!(Error::Config("not configured".into()).is_configuration());
        assert!(!Error::invalid_value("negative").is_configuration());
    }
}
