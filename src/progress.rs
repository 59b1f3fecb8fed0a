// ABOUTME: Progress reporting for dumps and migrations
// ABOUTME: Timestamps human-readable lines and forwards them to an optional sink

use chrono::Local;
use std::sync::{Arc, Mutex};

/// Channel used by dump/export progress lines
pub const EXPORT_CHANNEL: &str = "export-log";
/// Channel used by migration progress lines
pub const MIGRATION_CHANNEL: &str = "migration-log";

/// Fire-and-forget destination for progress messages.
///
/// The engine calls `emit` sequentially from a single task and does not
/// serialize calls itself.
pub trait LogSink: Send + Sync {
    fn emit(&self, channel: &str, message: &str);
}

/// Sink that keeps every message, handy for callers that show a log afterwards
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages seen so far on `channel`
    pub fn messages(&self, channel: &str) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines
                .iter()
                .filter(|(c, _)| c == channel)
                .map(|(_, m)| m.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl LogSink for MemorySink {
    fn emit(&self, channel: &str, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((channel.to_string(), message.to_string()));
        }
    }
}

/// Timestamped progress writer bound to one channel
///
/// Every line is mirrored to `tracing`: at info level when no sink is
/// attached, at debug level otherwise. An attached sink receives the line
/// prefixed with the local `[HH:MM:SS]` time.
#[derive(Clone)]
pub struct ProgressLog {
    sink: Option<Arc<dyn LogSink>>,
    channel: &'static str,
}

impl ProgressLog {
    pub fn new(sink: Option<Arc<dyn LogSink>>, channel: &'static str) -> Self {
        Self { sink, channel }
    }

    /// Progress log that only traces
    pub fn silent(channel: &'static str) -> Self {
        Self::new(None, channel)
    }

    pub fn channel(&self) -> &'static str {
        self.channel
    }

    pub fn emit(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        match &self.sink {
            Some(sink) => {
                tracing::debug!(channel = self.channel, "{}", message);
                let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
                sink.emit(self.channel, &line);
            }
            None => tracing::info!(channel = self.channel, "{}", message),
        }
    }

    /// Forward a line verbatim, without a timestamp (external tool output)
    pub fn forward(&self, raw: &str) {
        tracing::debug!(channel = self.channel, "{}", raw);
        if let Some(sink) = &self.sink {
            sink.emit(self.channel, raw);
        }
    }
}
