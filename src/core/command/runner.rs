use crate::core::command::classify::{KernelLogSummary, PatternSet};
use crate::core::command::store::{bucket_file_names, CaptureContent, CaptureStore, Destination};
use crate::core::session::{Capture, CaptureOutcome, PromptMarkers, SessionEngine};
use crate::core::sink::{OutputSink, Reporter};
use crate::core::transport::{SharedTransport, Transport};
use crate::domain::error::SerialShResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// File name of the raw capture inside a destination
pub const OUTPUT_FILE: &str = "output.txt";
pub const BOOT_TIME_FILE: &str = "boot_time.txt";
pub const WARNINGS_FILE: &str = "warnings.txt";
pub const ERRORS_FILE: &str = "errors.txt";

const RESERVED_FILES: [&str; 4] = [OUTPUT_FILE, BOOT_TIME_FILE, WARNINGS_FILE, ERRORS_FILE];

/// How a command invocation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    /// A prompt marker closed the capture
    Completed,
    /// The timeout elapsed first
    TimedOut,
    /// Nothing could be sent or captured
    Failed(String),
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandStatus::Completed => write!(f, "completed"),
            CommandStatus::TimedOut => write!(f, "timed out"),
            CommandStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Result of one command invocation, owned by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub lines: Vec<String>,
    pub status: CommandStatus,
    pub destination: Destination,
    /// Location of the persisted capture, if saving succeeded
    pub saved_to: Option<PathBuf>,
}

impl CommandOutput {
    /// Captured lines joined by newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.status == CommandStatus::Completed
    }

    fn failed(command: &str, destination: Destination, reason: String) -> Self {
        Self {
            command: command.to_string(),
            lines: Vec::new(),
            status: CommandStatus::Failed(reason),
            destination,
            saved_to: None,
        }
    }
}

/// Sends one command per call and captures its response up to the prompt.
pub struct CommandRunner {
    transport: SharedTransport,
    engine: SessionEngine,
    store: Arc<dyn CaptureStore>,
    markers: PromptMarkers,
}

impl CommandRunner {
    pub fn new(transport: SharedTransport, engine: SessionEngine, store: Arc<dyn CaptureStore>) -> Self {
        Self {
            transport,
            engine,
            store,
            markers: PromptMarkers::default(),
        }
    }

    /// Replace the default prompt markers
    pub fn with_markers(mut self, markers: PromptMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn markers(&self) -> &PromptMarkers {
        &self.markers
    }

    /// Send `command` and capture lines until a prompt or `timeout`.
    ///
    /// The write and the capture run under one session lock, so concurrent
    /// callers never see each other's output. Transport failures yield an
    /// empty `Failed` output; persistence failures are only reported.
    pub async fn run_command(
        &self,
        command: &str,
        timeout: Duration,
        markers: Option<&PromptMarkers>,
        sink: Option<&dyn OutputSink>,
    ) -> CommandOutput {
        let reporter = Reporter::new(sink);
        let command = command.trim();

        if command.is_empty() {
            reporter.error("Refusing to send an empty command.");
            return CommandOutput::failed(command, Destination::new(""), "empty command".to_string());
        }

        let destination = self.store.destination_for(command);

        reporter.info(&format!("Running command: {}", command));
        let markers = markers.unwrap_or(&self.markers);

        let capture = {
            let guard = self.transport.lock().await;
            self.exchange(&**guard, command, timeout, markers, &reporter).await
        };

        let capture = match capture {
            Ok(capture) => capture,
            Err(e) => {
                reporter.error_with(&format!("running command '{}'", command), &e);
                return CommandOutput::failed(command, destination, e.to_string());
            }
        };

        let status = match capture.outcome {
            CaptureOutcome::Matched => CommandStatus::Completed,
            CaptureOutcome::TimedOut => {
                if capture.is_empty() {
                    reporter.warn(&format!("No output received for '{}' within {:?}", command, timeout));
                }
                CommandStatus::TimedOut
            }
        };
        debug!("Command '{}' {} after {:?}", command, status, capture.elapsed);

        let text = capture.text();
        let saved_to = match self.store.save(&destination, OUTPUT_FILE, &CaptureContent::Text(text)) {
            Ok(path) => {
                reporter.info(&format!("Output saved to {}", path.display()));
                Some(path)
            }
            Err(e) => {
                reporter.error_with(&format!("saving {}", OUTPUT_FILE), &e);
                None
            }
        };

        CommandOutput {
            command: command.to_string(),
            lines: capture.events,
            status,
            destination,
            saved_to,
        }
    }

    async fn exchange(
        &self,
        transport: &dyn Transport,
        command: &str,
        timeout: Duration,
        markers: &PromptMarkers,
        reporter: &Reporter<'_>,
    ) -> SerialShResult<Capture> {
        transport.write_line(command).await?;
        self.engine
            .capture_until(transport, timeout, |line| markers.is_prompt(line), Some(reporter))
            .await
    }

    /// Store arbitrary content under `destination`, reporting the outcome
    pub fn save(
        &self,
        destination: &Destination,
        name: &str,
        content: &CaptureContent,
        sink: Option<&dyn OutputSink>,
    ) -> Option<PathBuf> {
        let reporter = Reporter::new(sink);
        match self.store.save(destination, name, content) {
            Ok(path) => {
                reporter.info(&format!("Saved to {}", path.display()));
                Some(path)
            }
            Err(e) => {
                reporter.error_with(&format!("saving {}", name), &e);
                None
            }
        }
    }

    /// Persist the boot anchor, warnings and errors next to the capture
    pub fn save_kernel_log_summary(
        &self,
        destination: &Destination,
        summary: &KernelLogSummary,
        sink: Option<&dyn OutputSink>,
    ) -> Vec<PathBuf> {
        let boot_time = match &summary.boot_time {
            Some(line) => format!("{}\n", line),
            None => "Boot time not found.\n".to_string(),
        };

        [
            (BOOT_TIME_FILE, CaptureContent::Text(boot_time)),
            (WARNINGS_FILE, CaptureContent::Lines(summary.warnings.clone())),
            (ERRORS_FILE, CaptureContent::Lines(summary.errors.clone())),
        ]
        .iter()
        .filter_map(|(name, content)| self.save(destination, name, content, sink))
        .collect()
    }

    /// Run `dmesg`, summarise the kernel log and persist the buckets
    pub async fn run_kernel_log(
        &self,
        timeout: Duration,
        sink: Option<&dyn OutputSink>,
    ) -> (CommandOutput, KernelLogSummary) {
        let output = self.run_command("dmesg", timeout, None, sink).await;
        let summary = KernelLogSummary::parse(&output.text());
        if !output.is_empty() {
            self.save_kernel_log_summary(&output.destination, &summary, sink);
        }
        (output, summary)
    }

    /// Run `command` and bucket its lines by `patterns`, persisting each
    /// bucket as `<label>.txt`.
    ///
    /// Bucket files never replace the raw capture, the kernel-log files or
    /// each other; clashing names get a numeric suffix.
    pub async fn run_and_classify(
        &self,
        command: &str,
        timeout: Duration,
        patterns: &PatternSet,
        sink: Option<&dyn OutputSink>,
    ) -> (CommandOutput, HashMap<String, Vec<String>>) {
        let output = self.run_command(command, timeout, None, sink).await;
        let buckets = patterns.classify(&output.text());
        if !output.is_empty() {
            let names = bucket_file_names(patterns.labels(), &RESERVED_FILES);
            for (label, name) in patterns.labels().zip(names) {
                if let Some(lines) = buckets.get(label) {
                    self.save(&output.destination, &name, &CaptureContent::Lines(lines.clone()), sink);
                }
            }
        }
        (output, buckets)
    }
}
