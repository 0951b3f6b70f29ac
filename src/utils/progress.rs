use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Console progress of one processor stage. A silent reporter draws nothing,
/// which keeps tests and piped output clean.
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Bar counting `total` steps, e.g. the monthly immigration files.
    pub fn new(total: u64, message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len}")
            .map(|s| s.progress_chars("#>-"));
        Self::start(ProgressBar::new(total), style.ok(), message)
    }

    pub fn new_spinner(message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }
        let style = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]");
        Self::start(ProgressBar::new_spinner(), style.ok(), message)
    }

    pub fn silent() -> Self {
        Self { bar: None }
    }

    fn start(bar: ProgressBar, style: Option<ProgressStyle>, message: &str) -> Self {
        if let Some(style) = style {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(TICK);
        Self { bar: Some(bar) }
    }

    pub fn increment(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}
