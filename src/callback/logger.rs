//! Loggers injected into the result aggregator.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{error, warn, Span};

/// Sink for the log output produced while aggregating results.
///
/// Engine warnings and deprecations would otherwise end up on stdout where
/// they corrupt a live display, so the aggregator routes them here instead.
pub trait ResultLogger: Send + Sync {
    /// Logs a warning reported by a module.
    fn warning(&self, message: &str);

    /// Logs a deprecation notice reported by a module.
    fn deprecation(&self, message: &str, version: Option<&str>);

    /// Logs a failed host result.
    fn host_failure(&self, host: &str, result: &JsonValue);
}

/// A logger shared between the aggregator and its creator.
pub type SharedLogger = Arc<dyn ResultLogger>;

/// Logs through `tracing`, inside a span identifying the run.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    span: Span,
}

impl TracingLogger {
    /// Creates a logger whose events are recorded inside `span`.
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    /// Creates a shared logger with a span named after the run.
    pub fn shared(run: &str) -> SharedLogger {
        Arc::new(Self::new(tracing::info_span!("playbook", run = %run)))
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(Span::current())
    }
}

impl ResultLogger for TracingLogger {
    fn warning(&self, message: &str) {
        self.span.in_scope(|| warn!("{}", message));
    }

    fn deprecation(&self, message: &str, version: Option<&str>) {
        self.span.in_scope(|| match version {
            Some(version) => warn!(version = %version, "[DEPRECATION] {}", message),
            None => warn!("[DEPRECATION] {}", message),
        });
    }

    fn host_failure(&self, host: &str, result: &JsonValue) {
        self.span.in_scope(|| error!("{} : {}", host, result));
    }
}

/// A logger that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl NullLogger {
    /// Creates a shared null logger.
    pub fn shared() -> SharedLogger {
        Arc::new(NullLogger)
    }
}

impl ResultLogger for NullLogger {
    fn warning(&self, _message: &str) {}

    fn deprecation(&self, _message: &str, _version: Option<&str>) {}

    fn host_failure(&self, _host: &str, _result: &JsonValue) {}
}
