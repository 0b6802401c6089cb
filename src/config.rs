// src/config.rs
//! Configuration management
//!
//! Settings live in a JSON file (`~/.config/gnss-tracker/config.json` unless
//! overridden). Every section falls back to its defaults, so a file only needs
//! the keys that differ.

use crate::error::{Result, TrackerError};
use crate::gps::assembler::DEFAULT_MIN_SATELLITES_IN_VIEW;
use crate::traccar::RetryPolicy;
use crate::transport::SerialSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_serial::{DataBits, Parity, StopBits};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub gnss: GnssConfig,
    pub traccar: TraccarConfig,
    pub display: DisplayConfig,
}

/// Serial receiver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GnssConfig {
    pub enabled: bool,
    pub port: Option<String>,
    pub baud: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub even: bool,
    pub odd: bool,
    pub min_read: usize,
    pub char_timeout_ms: u64,
    pub rs485: bool,
    pub rs485_high_during_send: bool,
    pub rs485_high_after_send: bool,
    /// Hex-encoded bytes written once after the port opens
    pub tx_data: Option<String>,
    pub rx: bool,
    pub min_satellites_in_view: usize,
}

impl Default for GnssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: None,
            baud: 9600,
            data_bits: 8,
            stop_bits: 1,
            even: false,
            odd: false,
            min_read: 2,
            char_timeout_ms: 1000,
            rs485: false,
            rs485_high_during_send: false,
            rs485_high_after_send: false,
            tx_data: None,
            rx: true,
            min_satellites_in_view: DEFAULT_MIN_SATELLITES_IN_VIEW,
        }
    }
}

impl GnssConfig {
    /// Validate the settings and turn them into what the transport needs.
    /// Nothing is opened here.
    pub fn serial_settings(&self) -> Result<SerialSettings> {
        let port = match self.port.as_deref().map(str::trim) {
            Some(port) if !port.is_empty() => port.to_string(),
            _ => return Err(TrackerError::Config("gnss port not specified".to_string())),
        };

        if self.even && self.odd {
            return Err(TrackerError::Config(
                "can't specify both even and odd parity".to_string(),
            ));
        }

        let parity = if self.even {
            Parity::Even
        } else if self.odd {
            Parity::Odd
        } else {
            Parity::None
        };

        let data_bits = match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => {
                return Err(TrackerError::Config(format!("unsupported data bits {}", other)))
            }
        };

        let stop_bits = match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => {
                return Err(TrackerError::Config(format!("unsupported stop bits {}", other)))
            }
        };

        let init_payload = match self.tx_data.as_deref().map(str::trim) {
            Some(hex) if !hex.is_empty() => Some(decode_hex(hex)?),
            _ => None,
        };

        Ok(SerialSettings {
            port,
            baud: self.baud,
            data_bits,
            stop_bits,
            parity,
            min_read: self.min_read,
            char_timeout: Duration::from_millis(self.char_timeout_ms),
            rs485: self.rs485,
            rs485_high_during_send: self.rs485_high_during_send,
            rs485_high_after_send: self.rs485_high_after_send,
            init_payload,
            receive: self.rx,
        })
    }
}

/// Shared Traccar settings plus one section per protocol
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraccarConfig {
    pub client_id: String,
    pub osmand: HttpServerConfig,
    pub t55: TcpServerConfig,
    pub opengts: HttpServerConfig,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub enabled: bool,
    /// Base URL including scheme, without port, e.g. `http://traccar.example.com`
    pub server_url: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpServerConfig {
    pub enabled: bool,
    pub server_ip: String,
    pub port: u16,
}

/// Validated settings for one HTTP tracking backend
#[derive(Debug, Clone, PartialEq)]
pub struct HttpEndpoint {
    pub base_url: String,
    pub port: u16,
    pub client_id: String,
}

/// Validated settings for the T55 backend
#[derive(Debug, Clone, PartialEq)]
pub struct TcpEndpoint {
    pub host: String,
    pub port: u16,
    pub client_id: String,
}

impl TraccarConfig {
    pub fn osmand_endpoint(&self) -> Result<HttpEndpoint> {
        self.http_endpoint("osmand", &self.osmand)
    }

    pub fn opengts_endpoint(&self) -> Result<HttpEndpoint> {
        self.http_endpoint("opengts", &self.opengts)
    }

    pub fn t55_endpoint(&self) -> Result<TcpEndpoint> {
        let client_id = self.client_id()?;
        let host = self.t55.server_ip.trim();
        if host.is_empty() {
            return Err(TrackerError::Config("t55 server address not specified".to_string()));
        }
        if self.t55.port == 0 {
            return Err(TrackerError::Config("t55 port not specified".to_string()));
        }
        Ok(TcpEndpoint {
            host: host.to_string(),
            port: self.t55.port,
            client_id,
        })
    }

    fn http_endpoint(&self, name: &str, server: &HttpServerConfig) -> Result<HttpEndpoint> {
        let client_id = self.client_id()?;
        let base_url = server.server_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(TrackerError::Config(format!("{} server url not specified", name)));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(TrackerError::Config(format!(
                "{} server url must start with http:// or https://",
                name
            )));
        }
        if server.port == 0 {
            return Err(TrackerError::Config(format!("{} port not specified", name)));
        }
        Ok(HttpEndpoint {
            base_url: base_url.to_string(),
            port: server.port,
            client_id,
        })
    }

    fn client_id(&self) -> Result<String> {
        let client_id = self.client_id.trim();
        if client_id.is_empty() {
            return Err(TrackerError::Config("traccar client id not specified".to_string()));
        }
        Ok(client_id.to_string())
    }
}

/// Local presentation consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub console: bool,
    pub screen: bool,
    pub lcd: bool,
    pub oled: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            console: true,
            screen: false,
            lcd: false,
            oled: false,
        }
    }
}

impl TrackerConfig {
    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::Other(format!("Failed to read config file: {}", e)))?;

        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrackerError::Other(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(path, contents)
            .map_err(|e| TrackerError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| TrackerError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gnss-tracker")
            .join("config.json"))
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baud: Option<u32>) {
        self.gnss.port = Some(port);
        if let Some(baud) = baud {
            self.gnss.baud = baud;
        }
    }
}

/// Decode a hex string such as `"b562060400"` into bytes
pub fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    let bad = || TrackerError::Config("cannot decode hex data".to_string());

    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(bad());
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad()))
        .collect()
}
