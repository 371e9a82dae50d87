use crate::domain::error::SerialShResult;
use serde::Serialize;
use serialport::SerialPortType;
use tabled::Tabled;

/// A serial port visible on this machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct PortInfo {
    #[tabled(rename = "Port")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl PortInfo {
    fn from_serialport(info: serialport::SerialPortInfo) -> Self {
        let (kind, description) = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let description = [usb.manufacturer, usb.product]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                let description = if description.is_empty() {
                    format!("{:04x}:{:04x}", usb.vid, usb.pid)
                } else {
                    description
                };
                ("usb".to_string(), description)
            }
            SerialPortType::PciPort => ("pci".to_string(), String::new()),
            SerialPortType::BluetoothPort => ("bluetooth".to_string(), String::new()),
            SerialPortType::Unknown => ("unknown".to_string(), String::new()),
        };

        Self {
            name: info.port_name,
            kind,
            description,
        }
    }
}

/// Enumerate the serial ports available on this machine
pub fn list_ports() -> SerialShResult<Vec<PortInfo>> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()?
        .into_iter()
        .map(PortInfo::from_serialport)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ports)
}
