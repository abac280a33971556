//! Output formatting for the copilot CLI
//!
//! Provides colored messages and the end-of-run recap.

use ceph_copilot::callback::{ExecutionStats, OutcomeKind};
use colored::Colorize;
use serde_json::Value as JsonValue;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Output formatter for terminal output
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Verbosity level
    verbosity: u8,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        colored::control::set_override(use_color);

        Self {
            use_color,
            verbosity,
            start_time: Instant::now(),
        }
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    ///
    /// Goes to stderr so stdout stays parseable with `--json`.
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        if self.use_color {
            println!("{}", message.green());
        } else {
            println!("{}", message);
        }
    }

    /// Print a list of items
    pub fn list(&self, title: &str, items: &[String]) {
        if self.use_color {
            println!("{}", title.bold());
        } else {
            println!("{}", title);
        }
        for item in items {
            println!("  - {}", item);
        }
    }

    /// Print the end-of-run recap
    pub fn recap(&self, stats: &ExecutionStats, rc: i32) {
        let header = "PLAY RECAP";
        let stars = "*".repeat(80 - header.len() - 1);

        if self.use_color {
            println!(
                "\n{} {}",
                header.bright_white().bold(),
                stars.bright_black()
            );
        } else {
            println!("\n{} {}", header, stars);
        }

        println!("{}", self.counts_line(stats));

        if !stats.failures.is_empty() {
            self.section("Failed hosts");
            for (host, results) in &stats.failures {
                let host_label = if self.use_color {
                    host.red().bold().to_string()
                } else {
                    host.clone()
                };
                for result in results {
                    println!("{} : {}", host_label, failure_message(result));
                }
            }
        }

        let duration_str = format_duration(self.start_time.elapsed());
        if self.use_color {
            println!(
                "\n{} {}",
                "Playbook run took".bright_black(),
                duration_str.bright_white()
            );
        } else {
            println!("\nPlaybook run took {}", duration_str);
        }

        let failed = rc != 0 || stats.has_failures();
        let summary = if failed {
            format!("Playbook run failed (rc={}).", rc)
        } else {
            "Playbook completed successfully.".to_string()
        };
        match (self.use_color, failed) {
            (true, true) => println!("{}", summary.red().bold()),
            (true, false) => println!("{}", summary.green().bold()),
            _ => println!("{}", summary),
        }
    }

    fn counts_line(&self, stats: &ExecutionStats) -> String {
        OutcomeKind::ALL
            .iter()
            .map(|kind| {
                let value = stats.task_state.get(*kind);
                let cell = format!("{}={:<4}", kind.as_str(), value);
                if !self.use_color || value == 0 {
                    return if self.use_color {
                        cell.dimmed().to_string()
                    } else {
                        cell
                    };
                }
                match kind {
                    OutcomeKind::Success => cell.green().to_string(),
                    OutcomeKind::Skipped => cell.cyan().to_string(),
                    OutcomeKind::Failed | OutcomeKind::Unreachable => cell.red().to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// The most useful one-line description of a failure payload.
pub fn failure_message(result: &JsonValue) -> String {
    for key in ["msg", "stderr", "reason"] {
        if let Some(text) = result.get(key).and_then(JsonValue::as_str) {
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }
    result.to_string()
}

/// Format a duration for humans
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_message_prefers_msg() {
        assert_eq!(failure_message(&json!({"msg": "no disks", "rc": 1})), "no disks");
        assert_eq!(failure_message(&json!({"msg": "", "stderr": "boom"})), "boom");
        assert_eq!(failure_message(&json!({"rc": 2})), r#"{"rc":2}"#);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_duration(Duration::from_secs(61)), "1m 1s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_counts_line_plain() {
        let formatter = OutputFormatter::new(false, 0);
        let mut stats = ExecutionStats::new();
        stats.task_state.success = 3;
        stats.task_state.failed = 1;
        assert_eq!(
            formatter.counts_line(&stats),
            "success=3    failed=1    skipped=0    unreachable=0   "
        );
    }
}
