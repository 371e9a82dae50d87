// Command module - Command execution, capture persistence and classification
pub mod classify;
pub mod runner;
pub mod store;

pub use classify::{KernelLogSummary, LinePattern, PatternSet};
pub use runner::{CommandOutput, CommandRunner, CommandStatus};
pub use store::{sanitize_command_name, CaptureContent, CaptureStore, Destination};
