use std::path::PathBuf;
use thiserror::Error;

/// serialsh unified error type
#[derive(Error, Debug)]
pub enum SerialShError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Device not connected")]
    NotConnected,

    #[error("Failed to persist {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl SerialShError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

pub type SerialShResult<T> = Result<T, SerialShError>;
