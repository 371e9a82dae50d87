// Core module - Session protocol engine
pub mod command;
pub mod login;
pub mod secrets;
pub mod session;
pub mod sink;
pub mod transport;

pub use command::{CommandOutput, CommandRunner, CommandStatus};
pub use login::{LoginConfig, LoginState, LoginStateMachine};
pub use secrets::SecretStore;
pub use session::{Capture, CaptureOutcome, EngineConfig, PromptMarkers, SessionEngine};
pub use sink::{BufferSink, OutputSink, Reporter, StdoutSink};
pub use transport::{SharedTransport, Transport};
