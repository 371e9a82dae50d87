use crate::core::transport::Transport;
use crate::domain::config::{FlowControlConfig, ParityConfig, SerialConfig};
use crate::domain::error::{SerialShError, SerialShResult};
use async_trait::async_trait;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Validated serial link parameters
#[derive(Debug, Clone)]
struct LinkSettings {
    port: String,
    baud_rate: u32,
    data_bits: serialport::DataBits,
    stop_bits: serialport::StopBits,
    parity: serialport::Parity,
    flow_control: serialport::FlowControl,
}

impl LinkSettings {
    fn from_config(config: &SerialConfig) -> SerialShResult<Self> {
        let port = config
            .port
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| SerialShError::Configuration("missing 'port' in [serial] section".to_string()))?;
        let baud_rate = config
            .baud_rate
            .ok_or_else(|| SerialShError::Configuration("missing 'baud_rate' in [serial] section".to_string()))?;

        let data_bits = match config.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            other => {
                return Err(SerialShError::Configuration(format!("Invalid data bits: {}", other)));
            }
        };

        let stop_bits = match config.stop_bits {
            1 => serialport::StopBits::One,
            2 => serialport::StopBits::Two,
            other => {
                return Err(SerialShError::Configuration(format!("Invalid stop bits: {}", other)));
            }
        };

        let parity = match config.parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        };

        let flow_control = match config.flow_control {
            FlowControlConfig::None => serialport::FlowControl::None,
            FlowControlConfig::Software => serialport::FlowControl::Software,
            FlowControlConfig::Hardware => serialport::FlowControl::Hardware,
        };

        Ok(Self {
            port,
            baud_rate,
            data_bits,
            stop_bits,
            parity,
            flow_control,
        })
    }
}

#[derive(Default)]
struct PortState {
    port: Option<Box<dyn SerialPort>>,
    /// Bytes read past the last returned line
    pending: Vec<u8>,
}

/// Line transport over a local serial port.
///
/// The port lives behind a mutex so one read or one write touches the
/// device at a time; blocking I/O runs on the blocking thread pool.
pub struct SerialTransport {
    settings: LinkSettings,
    state: Arc<Mutex<PortState>>,
    open: AtomicBool,
}

impl SerialTransport {
    /// Build a transport; fails when the port or baud rate is missing
    pub fn from_config(config: &SerialConfig) -> SerialShResult<Self> {
        Ok(Self {
            settings: LinkSettings::from_config(config)?,
            state: Arc::new(Mutex::new(PortState::default())),
            open: AtomicBool::new(false),
        })
    }

    pub fn baud_rate(&self) -> u32 {
        self.settings.baud_rate
    }

    async fn with_port<F, T>(&self, op: F) -> SerialShResult<T>
    where
        F: FnOnce(&mut PortState) -> SerialShResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let mut state = state
                .lock()
                .map_err(|_| SerialShError::transport("serial port lock poisoned"))?;
            op(&mut *state)
        })
        .await
        .map_err(|e| SerialShError::transport(format!("serial I/O task failed: {}", e)))?
    }
}

#[async_trait]
impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.settings.port
    }

    async fn open(&self) -> SerialShResult<()> {
        if self.is_open() {
            return Ok(());
        }

        let settings = self.settings.clone();
        self.with_port(move |state| {
            let port = serialport::new(&settings.port, settings.baud_rate)
                .data_bits(settings.data_bits)
                .stop_bits(settings.stop_bits)
                .parity(settings.parity)
                .flow_control(settings.flow_control)
                .timeout(Duration::from_millis(100))
                .open()?;
            state.port = Some(port);
            state.pending.clear();
            Ok(())
        })
        .await?;

        self.open.store(true, Ordering::SeqCst);
        info!("Serial port {} opened at {} baud", self.settings.port, self.settings.baud_rate);
        Ok(())
    }

    async fn close(&self) -> SerialShResult<()> {
        if !self.is_open() {
            return Ok(());
        }

        self.with_port(|state| {
            state.port = None;
            state.pending.clear();
            Ok(())
        })
        .await?;

        self.open.store(false, Ordering::SeqCst);
        info!("Serial port {} closed", self.settings.port);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn write_line(&self, text: &str) -> SerialShResult<()> {
        let data = format!("{}\n", text).into_bytes();
        let len = data.len();
        self.with_port(move |state| {
            let port = state.port.as_mut().ok_or(SerialShError::NotConnected)?;
            port.write_all(&data)?;
            port.flush()?;
            Ok(())
        })
        .await?;

        debug!("Sent {} bytes over serial", len);
        Ok(())
    }

    async fn read_line(&self, timeout: Duration) -> SerialShResult<Option<String>> {
        self.with_port(move |state| read_line_blocking(state, timeout)).await
    }
}

fn read_line_blocking(state: &mut PortState, timeout: Duration) -> SerialShResult<Option<String>> {
    let PortState { port, pending } = state;
    let port = port.as_mut().ok_or(SerialShError::NotConnected)?;

    if let Some(line) = take_line(pending) {
        return Ok(Some(line));
    }

    let deadline = Instant::now() + timeout;
    let mut buffer = [0u8; 256];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        port.set_timeout(remaining)?;

        match port.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buffer[..n]);
                if let Some(line) = take_line(pending) {
                    return Ok(Some(line));
                }
            }
            Err(ref e) if e.kind() == ErrorKind::TimedOut => break,
            Err(e) => return Err(e.into()),
        }
    }

    // Prompts arrive without a newline; hand over whatever is buffered
    if pending.is_empty() {
        Ok(None)
    } else {
        let partial = std::mem::take(pending);
        Ok(Some(decode_line(&partial)))
    }
}

/// Split the first complete line off `pending`
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=end).collect();
    Some(decode_line(&line))
}

/// Decode UTF-8, dropping invalid sequences, and strip the line terminator
pub fn decode_line(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text.trim_end_matches(['\r', '\n']).to_string()
}
