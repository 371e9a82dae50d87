use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for serialsh
#[derive(Parser, Debug)]
#[command(
    name = "serialsh",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serial console automation for embedded devices",
    long_about = "Log in to a device over its serial console, run commands, capture their output up to the next prompt and classify the captured lines."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress live console output and logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial port, overriding the configuration
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// Baud rate, overriding the configuration
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the port and run the login handshake
    Login {
        /// Handshake timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Run a command and capture its output up to the next prompt
    Run(RunArgs),
    /// Capture the kernel log and split out boot time, warnings and errors
    Dmesg {
        /// Capture timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Run a command and bucket its output lines by pattern
    Grep(GrepArgs),
    /// Manage stored login credentials
    Credentials(CredentialsArgs),
    /// List available serial ports
    Ports,
    /// Configuration management commands
    Config(ConfigArgs),
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

/// Arguments of `run`
#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Command line sent to the device
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Capture timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Prompt marker ending the capture; repeatable
    #[arg(long = "prompt")]
    pub prompts: Vec<String>,

    /// Skip the login handshake
    #[arg(long)]
    pub no_login: bool,
}

impl RunArgs {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Arguments of `grep`
#[derive(ClapArgs, Debug)]
pub struct GrepArgs {
    /// Command line sent to the device
    pub command: String,

    /// `label=regex` bucket definition; repeatable, order is kept
    #[arg(long = "pattern", required = true, value_parser = parse_pattern)]
    pub patterns: Vec<(String, String)>,

    /// Capture timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Skip the login handshake
    #[arg(long)]
    pub no_login: bool,
}

/// Credential management arguments
#[derive(ClapArgs, Debug)]
pub struct CredentialsArgs {
    /// Credentials subcommand
    #[command(subcommand)]
    pub command: CredentialsCommand,
}

/// Credential subcommands
#[derive(Subcommand, Debug)]
pub enum CredentialsCommand {
    /// Store the login identifier and password
    Set {
        /// Login identifier
        #[arg(long)]
        login_id: String,
        /// Password
        #[arg(long, env = "SERIALSH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Create a default configuration
    Init {
        /// Directory receiving `.serialsh/config.toml`
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Write the global configuration instead
        #[arg(short, long)]
        global: bool,
    },
}

/// Parse `label=regex`
pub fn parse_pattern(raw: &str) -> Result<(String, String), String> {
    let (label, pattern) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected label=regex, got '{}'", raw))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("missing label in '{}'", raw));
    }
    if pattern.is_empty() {
        return Err(format!("missing pattern for label '{}'", label));
    }
    Ok((label.to_string(), pattern.to_string()))
}

/// Seconds from the command line, or the configured fallback
pub fn timeout_or(seconds: Option<u64>, fallback: Duration) -> Duration {
    seconds.map(Duration::from_secs).unwrap_or(fallback)
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!(
            parse_pattern("usb=usb \\d+").unwrap(),
            ("usb".to_string(), "usb \\d+".to_string())
        );
        // Only the first '=' splits
        assert_eq!(parse_pattern("eq=a=b").unwrap().1, "a=b");
        assert!(parse_pattern("no-separator").is_err());
        assert!(parse_pattern("=x").is_err());
        assert!(parse_pattern("label=").is_err());
    }

    #[test]
    fn test_run_collects_command_words() {
        let args = Args::try_parse_from([
            "serialsh", "--port", "/dev/ttyUSB0", "run", "--timeout", "3", "--prompt", "#", "ls", "-la", "/tmp",
        ])
        .unwrap();

        assert_eq!(args.port.as_deref(), Some("/dev/ttyUSB0"));
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.command_line(), "ls -la /tmp");
                assert_eq!(run.timeout, Some(3));
                assert_eq!(run.prompts, vec!["#"]);
                assert!(!run.no_login);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_grep_requires_pattern() {
        assert!(Args::try_parse_from(["serialsh", "grep", "lsusb"]).is_err());

        let args = Args::try_parse_from([
            "serialsh", "grep", "lsusb", "--pattern", "hub=hub", "--pattern", "dev=Device \\d+",
        ])
        .unwrap();
        match args.command {
            Command::Grep(grep) => {
                assert_eq!(grep.command, "lsusb");
                assert_eq!(grep.patterns.len(), 2);
                assert_eq!(grep.patterns[0].0, "hub");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_timeout_or() {
        assert_eq!(timeout_or(Some(2), Duration::from_secs(10)), Duration::from_secs(2));
        assert_eq!(timeout_or(None, Duration::from_secs(10)), Duration::from_secs(10));
    }
}
