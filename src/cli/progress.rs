//! Live progress line for playbook runs.
//!
//! The aggregator's notifier updates a single spinner line after every host
//! event, so the terminal shows running counts and the current task while the
//! engine works.

use ceph_copilot::callback::ExecutionStats;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner line showing running outcome counts
pub struct PlaybookProgress {
    bar: ProgressBar,
}

impl PlaybookProgress {
    /// Create a progress line; a hidden one draws nothing
    pub fn new(title: &str, hidden: bool) -> Self {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new_spinner();
        let template = "{spinner:.green} [{elapsed_precise}] {prefix:.bold} {msg}";
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            bar.set_style(style);
        }
        bar.set_prefix(title.to_string());
        bar.set_message("waiting for first result");
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A notifier for the result aggregator that refreshes this line
    pub fn notifier(&self) -> impl FnMut(&ExecutionStats) + Send + 'static {
        let bar = self.bar.clone();
        move |stats: &ExecutionStats| bar.set_message(status_line(stats))
    }

    /// Remove the progress line
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Renders the running counts and the current task.
pub fn status_line(stats: &ExecutionStats) -> String {
    let counts = &stats.task_state;
    let mut line = format!(
        "{} {} {} {}",
        format!("ok={}", counts.success).green(),
        format!("failed={}", counts.failed).red(),
        format!("skipped={}", counts.skipped).cyan(),
        format!("unreachable={}", counts.unreachable).red(),
    );
    if !stats.task_name.is_empty() {
        line.push_str(&format!(" | {}", stats.task_name));
    }
    line
}
