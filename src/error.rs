//! # Error Types
//!
//! Custom error types for NMEA Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for NMEA Bridge
#[derive(Debug, Error)]
pub enum NmeaBridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection could not be established within the retry bound
    #[error("Failed to connect to {endpoint} after {attempts} attempts: {source}")]
    Connect {
        endpoint: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// Telemetry sample rejected (missing or non-finite field)
    #[error("Telemetry rejected: {0}")]
    Telemetry(String),

    /// A required simulator data reference could not be resolved
    #[error("Data reference not found: {0}")]
    MissingDataRef(String),

    /// Malformed or corrupted NMEA sentence
    #[error("NMEA protocol error: {0}")]
    Protocol(String),
}

/// Result type alias for NMEA Bridge
pub type Result<T> = std::result::Result<T, NmeaBridgeError>;
