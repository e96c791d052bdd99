use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Spinner on stderr for long-running steps. Without a terminal, or when
/// the report is JSON, progress goes to the logs instead.
pub struct ProgressUI {
    spinner: Option<ProgressBar>,
}

impl ProgressUI {
    pub fn new(show_spinner: bool) -> Self {
        if !(show_spinner && is_interactive()) {
            tracing::debug!(operation = "ui_init", mode = "non_interactive", "Progress spinner disabled");
            return Self { spinner: None };
        }

        let spinner = ProgressBar::new_spinner();
        // The template is static, so a parse failure just keeps the default style
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
        {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner: Some(spinner) }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        let msg = msg.into();
        match self.spinner {
            Some(ref spinner) => spinner.set_message(msg),
            None => tracing::info!(operation = "progress", message = %msg, "Progress update"),
        }
    }

    pub fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stderr().is_terminal()
}
