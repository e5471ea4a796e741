//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{NmeaBridgeError, Result};
use crate::transport::ConnectPolicy;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub flight_loop: FlightLoopConfig,

    #[serde(default)]
    pub udp: UdpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Kind of outbound connection
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    Tcp,
    Serial,
}

/// Connect policy as written in the configuration file
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectPolicyKind {
    BlockingRetry,
    FailSoft,
}

/// Outbound transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_transport_kind")]
    pub kind: TransportKind,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_connect_policy")]
    pub connect_policy: ConnectPolicyKind,

    #[serde(default = "default_max_connect_attempts")]
    pub max_connect_attempts: u32,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Flight-loop (simulator callback) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FlightLoopConfig {
    #[serde(default = "default_interval_s")]
    pub interval_s: f32,

    #[serde(default = "default_backoff_interval_s")]
    pub backoff_interval_s: f32,

    #[serde(default = "default_extended_sentences")]
    pub extended_sentences: bool,
}

/// UDP telemetry listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UdpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_udp_port")]
    pub port: u16,

    #[serde(default = "default_message_tag")]
    pub message_tag: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Diagnostic log file; empty for console only
    #[serde(default)]
    pub file: String,
}

// Default value functions
fn default_transport_kind() -> TransportKind { TransportKind::Tcp }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 4353 }
fn default_device() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 4800 }
fn default_connect_policy() -> ConnectPolicyKind { ConnectPolicyKind::BlockingRetry }
fn default_max_connect_attempts() -> u32 { 1000 }
fn default_retry_interval_ms() -> u64 { 1000 }
fn default_probe_timeout_ms() -> u64 { 100 }
fn default_queue_depth() -> usize { 8 }

fn default_interval_s() -> f32 { 1.0 }
fn default_backoff_interval_s() -> f32 { 10.0 }
fn default_extended_sentences() -> bool { true }

fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_udp_port() -> u16 { 49002 }
fn default_message_tag() -> String { "XGPS1".to_string() }

fn default_log_level() -> String { "info".to_string() }

/// Baud rates accepted for the serial transport
const VALID_BAUD_RATES: &[u32] = &[4800, 9600, 19200, 38400, 57600, 115200];

/// Log levels accepted by the `level` field
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: default_transport_kind(),
            host: default_host(),
            port: default_port(),
            device: default_device(),
            baud_rate: default_baud_rate(),
            connect_policy: default_connect_policy(),
            max_connect_attempts: default_max_connect_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for FlightLoopConfig {
    fn default() -> Self {
        Self {
            interval_s: default_interval_s(),
            backoff_interval_s: default_backoff_interval_s(),
            extended_sentences: default_extended_sentences(),
        }
    }
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_udp_port(),
            message_tag: default_message_tag(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl TransportConfig {
    /// Connect policy with its timing parameters
    pub fn connect_policy(&self) -> ConnectPolicy {
        match self.connect_policy {
            ConnectPolicyKind::BlockingRetry => ConnectPolicy::BlockingRetry {
                max_attempts: self.max_connect_attempts,
                retry_interval: Duration::from_millis(self.retry_interval_ms),
            },
            ConnectPolicyKind::FailSoft => ConnectPolicy::FailSoft,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn invalid(message: impl std::fmt::Display) -> NmeaBridgeError {
    NmeaBridgeError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nmea_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        let transport = &self.transport;

        match transport.kind {
            TransportKind::Tcp => {
                if transport.host.is_empty() {
                    return Err(invalid("transport host cannot be empty"));
                }
                if transport.port == 0 {
                    return Err(invalid("transport port must be between 1 and 65535"));
                }
            }
            TransportKind::Serial => {
                if transport.device.is_empty() {
                    return Err(invalid("transport device cannot be empty"));
                }
                if !VALID_BAUD_RATES.contains(&transport.baud_rate) {
                    return Err(invalid(format!(
                        "baud_rate must be one of: {:?}",
                        VALID_BAUD_RATES
                    )));
                }
            }
        }

        if transport.max_connect_attempts == 0 {
            return Err(invalid("max_connect_attempts must be greater than 0"));
        }

        if transport.retry_interval_ms > 60000 {
            return Err(invalid("retry_interval_ms must be between 0 and 60000"));
        }

        if transport.probe_timeout_ms == 0 || transport.probe_timeout_ms > 10000 {
            return Err(invalid("probe_timeout_ms must be between 1 and 10000"));
        }

        if transport.queue_depth == 0 {
            return Err(invalid("queue_depth must be greater than 0"));
        }

        // Validate flight-loop intervals
        for (name, value) in [
            ("interval_s", self.flight_loop.interval_s),
            ("backoff_interval_s", self.flight_loop.backoff_interval_s),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{} must be a positive number", name)));
            }
        }

        if self.udp.bind_address.is_empty() {
            return Err(invalid("udp bind_address cannot be empty"));
        }

        if self.udp.message_tag.is_empty() {
            return Err(invalid("udp message_tag cannot be empty"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "log level must be one of: {}",
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
