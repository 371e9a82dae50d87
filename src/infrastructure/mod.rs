// Infrastructure module - External dependencies and adapters
pub mod config;
pub mod logging;
pub mod persistence;
pub mod secrets;
pub mod serial;

pub use config::ConfigManager;
pub use persistence::FsCaptureStore;
pub use secrets::{FileSecretStore, MemorySecretStore};
pub use serial::{list_ports, PortInfo, SerialTransport};
