//! CLI-specific progress handling for routepick
//!
//! Shows a spinner on stderr while a compute request is in flight.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a spinner for an in-flight request
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("Failed to create spinner style"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Owns at most one spinner at a time
#[derive(Default)]
pub struct ProgressManager {
    pb: Option<ProgressBar>,
}

impl ProgressManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or relabel) the spinner
    pub fn busy(&mut self, message: &str) {
        match &self.pb {
            Some(pb) => pb.set_message(message.to_string()),
            None => self.pb = Some(create_spinner(message)),
        }
    }

    /// Remove the spinner, if any
    pub fn idle(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pb.is_some()
    }

    /// Print a line without tearing the spinner
    pub fn println(&self, line: &str) {
        match &self.pb {
            Some(pb) => pb.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }
}
