//! # NMEA Bridge
//!
//! Feed X-Plane position data to navigation software as NMEA-0183.
//!
//! This application listens for the simulator's XGPS datagrams and forwards
//! each fix as GPGGA + GPRMC over TCP or a serial line.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use nmea_bridge::bridge::UdpBridge;
use nmea_bridge::config::Config;
use nmea_bridge::logging::init_logging;
use nmea_bridge::transport::transport_from_config;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for NMEA Bridge application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging
///    - Connect to the configured TCP or serial endpoint
///
/// 2. **Main Loop**
///    - Receive XGPS datagrams on the configured UDP port
///    - Write GPGGA + GPRMC for every recognised datagram
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Shutdown**
///    - Close the transport and the socket
///
/// # Errors
///
/// Returns error if:
/// - The configuration file is invalid
/// - The endpoint cannot be reached within the retry bound
/// - The UDP socket fails
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO nmea_bridge: NMEA Bridge v0.1.0 starting...
/// INFO nmea_bridge::transport: Connected to 127.0.0.1:4353 attempts=1
/// INFO nmea_bridge::bridge::udp: UDP bridge started local_addr=Some(0.0.0.0:49002) ...
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;

    let _logging = init_logging(&config.logging).context("Failed to initialise logging")?;

    info!("NMEA Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut transport = transport_from_config(&config.transport);
    info!(
        policy = ?transport.policy(),
        "Connecting to {}",
        transport.endpoint()
    );
    transport.connect().await?;

    info!("Press Ctrl+C to exit");

    UdpBridge::new(config.udp.clone(), transport)
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
        })
        .await?;

    Ok(())
}

/// Load the configuration from `path`, or from the default location
///
/// Built-in defaults are used when no path was given and the default file
/// does not exist.
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}
