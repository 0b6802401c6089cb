// src/transport.rs
//! Serial transport session: opens the receiver's port, sends the optional
//! initialization payload and hands out a line reader.

use crate::error::{Result, TrackerError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

/// Validated serial settings, see [`GnssConfig::serial_settings`](crate::config::GnssConfig::serial_settings)
#[derive(Debug, Clone, PartialEq)]
pub struct SerialSettings {
    pub port: String,
    pub baud: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub min_read: usize,
    pub char_timeout: Duration,
    pub rs485: bool,
    pub rs485_high_during_send: bool,
    pub rs485_high_after_send: bool,
    pub init_payload: Option<Vec<u8>>,
    pub receive: bool,
}

/// Buffered reader over the serial port; dropping it releases the port
pub type SerialReader = BufReader<SerialStream>;

/// Smallest read buffer handed to the line reader
const MIN_BUFFER: usize = 256;

pub struct TransportSession<S = SerialStream> {
    stream: S,
    port: String,
    min_read: usize,
    receive: bool,
}

impl TransportSession<SerialStream> {
    /// Open the port and write the initialization payload if there is one
    pub async fn open(settings: &SerialSettings) -> Result<Self> {
        log::info!("Connecting to GNSS receiver on {} at {} baud...", settings.port, settings.baud);

        if settings.rs485 {
            log::warn!(
                "RS-485 direction control requested (RTS high during send: {}, after send: {}); \
                 leaving it to the port driver",
                settings.rs485_high_during_send,
                settings.rs485_high_after_send
            );
        }

        let stream = tokio_serial::new(&settings.port, settings.baud)
            .data_bits(settings.data_bits)
            .stop_bits(settings.stop_bits)
            .parity(settings.parity)
            .flow_control(FlowControl::None)
            .timeout(settings.char_timeout)
            .open_native_async()
            .map_err(|e| {
                TrackerError::Transport(format!("Failed to open serial port {}: {}", settings.port, e))
            })?;

        log::info!("Connected to {}", settings.port);
        Ok(Self::attach(stream, settings).await)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> TransportSession<S> {
    /// Take over an opened stream. A failed payload write is logged;
    /// reception still goes ahead.
    pub async fn attach(mut stream: S, settings: &SerialSettings) -> Self {
        if let Some(payload) = &settings.init_payload {
            log::debug!("Sending to serial {}", hex_string(payload));
            match stream.write_all(payload).await {
                Ok(()) => log::debug!("Wrote {} bytes to serial", payload.len()),
                Err(e) => log::error!("Error writing to serial port {}: {}", settings.port, e),
            }
        }

        Self {
            stream,
            port: settings.port.clone(),
            min_read: settings.min_read,
            receive: settings.receive,
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Reader over the port, unless reception is switched off
    pub fn reader(self) -> Result<BufReader<S>> {
        if !self.receive {
            return Err(TrackerError::ReceiveDisabled);
        }
        let capacity = self.min_read.max(MIN_BUFFER);
        Ok(BufReader::with_capacity(capacity, self.stream))
    }
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
