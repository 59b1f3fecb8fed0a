// ABOUTME: Terminal log sink that prints progress lines above an indicatif spinner
// ABOUTME: Used by the CLI commands as the ProgressLog destination

use crate::progress::LogSink;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct SpinnerSink {
    pb: ProgressBar,
}

impl SpinnerSink {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(message.to_string());
        Self { pb }
    }

    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }

    pub fn abandon(&self, message: &str) {
        self.pb.abandon_with_message(message.to_string());
    }
}

impl LogSink for SpinnerSink {
    fn emit(&self, _channel: &str, message: &str) {
        self.pb.println(message);
        // The spinner line shows the latest step without its timestamp
        let step = message
            .strip_prefix('[')
            .and_then(|rest| rest.split_once("] "))
            .map(|(_, text)| text)
            .unwrap_or(message);
        self.pb.set_message(step.to_string());
    }
}
