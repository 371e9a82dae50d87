// Serial module - Serial port transport implementation
pub mod ports;
pub mod transport;

pub use ports::{list_ports, PortInfo};
pub use transport::SerialTransport;
