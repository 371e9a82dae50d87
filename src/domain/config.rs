use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// serialsh configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerialShConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Serial link settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<SerialConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Root directory for captured command output
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    /// Secret store service name holding the credentials
    #[serde(default = "default_secret_service")]
    pub secret_service: String,
    /// Command capture timeout in milliseconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
    /// Login handshake timeout in milliseconds
    #[serde(default = "default_login_timeout")]
    pub login_timeout_ms: u64,
    /// Pause between empty read attempts in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Per-attempt read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Trailing characters that mark a shell prompt
    #[serde(default = "default_prompt_markers")]
    pub prompt_markers: Vec<String>,
    /// Pause after sending the nudge and the login identifier
    #[serde(default = "default_login_settle")]
    pub login_settle_ms: u64,
    /// Pause after sending the password
    #[serde(default = "default_password_settle")]
    pub password_settle_ms: u64,
}

/// Serial link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Port path, e.g. `/dev/ttyUSB0` or `COM5`
    #[serde(default)]
    pub port: Option<String>,
    /// Baud rate
    #[serde(default)]
    pub baud_rate: Option<u32>,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: ParityConfig,
    #[serde(default)]
    pub flow_control: FlowControlConfig,
}

/// Parity configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlConfig {
    #[default]
    None,
    Hardware,
    Software,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_secret_service() -> String {
    "serial_device".to_string()
}

fn default_command_timeout() -> u64 {
    10_000
}

fn default_login_timeout() -> u64 {
    15_000
}

fn default_poll_interval() -> u64 {
    100
}

fn default_read_timeout() -> u64 {
    1000
}

fn default_prompt_markers() -> Vec<String> {
    vec!["$".to_string(), "#".to_string(), ">".to_string()]
}

fn default_login_settle() -> u64 {
    500
}

fn default_password_settle() -> u64 {
    1000
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            logs_dir: default_logs_dir(),
            secret_service: default_secret_service(),
            command_timeout_ms: default_command_timeout(),
            login_timeout_ms: default_login_timeout(),
            poll_interval_ms: default_poll_interval(),
            read_timeout_ms: default_read_timeout(),
            prompt_markers: default_prompt_markers(),
            login_settle_ms: default_login_settle(),
            password_settle_ms: default_password_settle(),
        }
    }
}

impl GlobalConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: None,
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: ParityConfig::None,
            flow_control: FlowControlConfig::None,
        }
    }
}

impl SerialConfig {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: Some(port.into()),
            baud_rate: Some(baud_rate),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: ParityConfig::None,
            flow_control: FlowControlConfig::None,
        }
    }
}
