// Session module - Prompt detection and the bounded read loop
pub mod engine;
pub mod prompt;

pub use engine::{Capture, CaptureOutcome, EngineConfig, SessionEngine};
pub use prompt::PromptMarkers;
