//! # Telemetry Module
//!
//! Aircraft state sources feeding the NMEA encoder.
//!
//! This module handles:
//! - The immutable per-tick telemetry snapshot
//! - Sampling simulator data references with unit conversion
//! - Parsing XGPS telemetry datagrams

pub mod snapshot;
pub mod datarefs;
pub mod xgps;

pub use snapshot::{ExtendedTelemetry, TelemetrySnapshot};
