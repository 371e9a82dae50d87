use crate::cli::args::OutputFormat;
use crate::core::command::{CommandOutput, CommandStatus, KernelLogSummary};
use crate::domain::config::SerialShConfig;
use crate::infrastructure::serial::PortInfo;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_command(&self, output: &CommandOutput) -> Result<(), OutputError>;
    fn write_kernel_summary(&self, output: &CommandOutput, summary: &KernelLogSummary) -> Result<(), OutputError>;
    fn write_buckets(
        &self,
        output: &CommandOutput,
        labels: &[String],
        buckets: &HashMap<String, Vec<String>>,
    ) -> Result<(), OutputError>;
    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError>;
    fn write_config(&self, config: &SerialShConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::SerialShError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Serializable view of a command capture
#[derive(Debug, Serialize)]
pub struct CommandReport<'a> {
    pub command: &'a str,
    pub status: &'a CommandStatus,
    pub lines: &'a [String],
    pub destination: &'a str,
    pub saved_to: Option<&'a PathBuf>,
}

impl<'a> From<&'a CommandOutput> for CommandReport<'a> {
    fn from(output: &'a CommandOutput) -> Self {
        Self {
            command: &output.command,
            status: &output.status,
            lines: &output.lines,
            destination: output.destination.as_str(),
            saved_to: output.saved_to.as_ref(),
        }
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), OutputError> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn print_status(&self, output: &CommandOutput) {
        println!("Command: {}", output.command);
        println!("  Status: {}", output.status);
        println!("  Lines: {}", output.lines.len());
        match &output.saved_to {
            Some(path) => println!("  Saved to: {}", path.display()),
            None => println!("  Destination: {} (not saved)", output.destination),
        }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_command(&self, output: &CommandOutput) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => self.print_json(&CommandReport::from(output)),
            OutputFormat::Text | OutputFormat::Table => {
                self.print_status(output);
                Ok(())
            }
        }
    }

    fn write_kernel_summary(&self, output: &CommandOutput, summary: &KernelLogSummary) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let report = serde_json::json!({
                    "capture": CommandReport::from(output),
                    "summary": summary,
                });
                self.print_json(&report)
            }
            OutputFormat::Text => {
                self.print_status(output);
                println!(
                    "  Boot time: {}",
                    summary.boot_time.as_deref().unwrap_or("Boot time not found.")
                );
                println!("  Warnings: {}", summary.warnings.len());
                for line in &summary.warnings {
                    println!("    {}", line);
                }
                println!("  Errors: {}", summary.errors.len());
                for line in &summary.errors {
                    println!("    {}", line);
                }
                Ok(())
            }
            OutputFormat::Table => {
                let rows = vec![
                    BucketRow::new("boot_time", summary.boot_time.iter().count(), summary.boot_time.as_deref()),
                    BucketRow::new("warnings", summary.warnings.len(), summary.warnings.first().map(String::as_str)),
                    BucketRow::new("errors", summary.errors.len(), summary.errors.first().map(String::as_str)),
                ];
                println!("{}", Table::new(rows));
                Ok(())
            }
        }
    }

    fn write_buckets(
        &self,
        output: &CommandOutput,
        labels: &[String],
        buckets: &HashMap<String, Vec<String>>,
    ) -> Result<(), OutputError> {
        let empty = Vec::new();
        match self.format {
            OutputFormat::Json => {
                let report = serde_json::json!({
                    "capture": CommandReport::from(output),
                    "buckets": buckets,
                });
                self.print_json(&report)
            }
            OutputFormat::Text => {
                self.print_status(output);
                for label in labels {
                    let lines = buckets.get(label).unwrap_or(&empty);
                    println!("  {}: {}", label, lines.len());
                    for line in lines {
                        println!("    {}", line);
                    }
                }
                Ok(())
            }
            OutputFormat::Table => {
                let rows: Vec<BucketRow> = labels
                    .iter()
                    .map(|label| {
                        let lines = buckets.get(label).unwrap_or(&empty);
                        BucketRow::new(label, lines.len(), lines.first().map(String::as_str))
                    })
                    .collect();
                println!("{}", Table::new(rows));
                Ok(())
            }
        }
    }

    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                if ports.is_empty() {
                    println!("No serial ports found");
                }
                for port in ports {
                    if port.description.is_empty() {
                        println!("{} ({})", port.name, port.kind);
                    } else {
                        println!("{} ({}): {}", port.name, port.kind, port.description);
                    }
                }
                Ok(())
            }
            OutputFormat::Json => self.print_json(ports),
            OutputFormat::Table => {
                if !ports.is_empty() {
                    println!("{}", Table::new(ports.to_vec()));
                }
                Ok(())
            }
        }
    }

    fn write_config(&self, config: &SerialShConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => self.print_json(config),
            OutputFormat::Text | OutputFormat::Table => {
                println!("{}", toml::to_string_pretty(config)?);
                Ok(())
            }
        }
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                self.print_json(&output)
            }
            _ => {
                println!("{}", message);
                Ok(())
            }
        }
    }
}

/// Table row for a classification bucket
#[derive(Tabled)]
struct BucketRow {
    bucket: String,
    lines: usize,
    first: String,
}

impl BucketRow {
    fn new(bucket: &str, lines: usize, first: Option<&str>) -> Self {
        Self {
            bucket: bucket.to_string(),
            lines,
            first: first.unwrap_or("-").to_string(),
        }
    }
}
