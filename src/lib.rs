//! serialsh Library
//!
//! Serial console automation for embedded devices: a timeout-bounded
//! session engine, a login state machine and a command runner that
//! captures output up to the next shell prompt.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use core::command::{
    CaptureContent, CaptureStore, Destination, KernelLogSummary, LinePattern, PatternSet,
};
pub use core::{
    Capture, CaptureOutcome, CommandOutput, CommandRunner, CommandStatus, LoginState,
    LoginStateMachine, OutputSink, PromptMarkers, SecretStore, SessionEngine, SharedTransport,
    Transport,
};
pub use domain::config::SerialShConfig;
pub use domain::error::{SerialShError, SerialShResult};
