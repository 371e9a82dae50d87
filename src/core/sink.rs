//! User-facing observability sink.
//!
//! Core operations never print on their own: they report through an
//! [`OutputSink`] handed in by the caller. Every report is mirrored as a
//! `tracing` event so diagnostics still land in the log subscriber.

use std::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Receives one line of user-facing text per notable event.
pub trait OutputSink: Send + Sync {
    fn emit(&self, line: &str);
}

impl<F> OutputSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, line: &str) {
        self(line)
    }
}

/// Fallback sink used when the caller supplies none
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&self, line: &str) {
        println!("{}", line);
    }
}

/// Sink that keeps every line in memory
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl OutputSink for BufferSink {
    fn emit(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Formats and routes reports to a sink.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    sink: &'a dyn OutputSink,
}

impl<'a> Reporter<'a> {
    /// Use `sink`, or stdout when `None`
    pub fn new(sink: Option<&'a dyn OutputSink>) -> Self {
        Self {
            sink: sink.unwrap_or(&StdoutSink),
        }
    }

    /// A line received from the remote, passed through untouched
    pub fn received(&self, line: &str) {
        debug!(target: "serialsh::rx", "{}", line);
        self.sink.emit(line);
    }

    /// Input sent to the remote, echoed as `> text`
    pub fn sent(&self, text: &str) {
        debug!(target: "serialsh::tx", "{}", text);
        self.sink.emit(&format!("> {}", text));
    }

    pub fn info(&self, message: &str) {
        info!("{}", message);
        self.sink.emit(&format!("[*] {}", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", message);
        self.sink.emit(&format!("[!] {}", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", message);
        self.sink.emit(&format!("[Error] {}", message));
    }

    /// Error report whose context is part of the bracketed prefix,
    /// e.g. `[Error saving output.txt]: permission denied`
    pub fn error_with(&self, context: &str, cause: &dyn std::fmt::Display) {
        error!("{}: {}", context, cause);
        self.sink.emit(&format!("[Error {}]: {}", context, cause));
    }
}
