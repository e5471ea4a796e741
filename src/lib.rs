//! # NMEA Bridge Library
//!
//! Feed flight-simulator telemetry to moving-map and gliding software as
//! NMEA-0183 sentences.
//!
//! This library converts aircraft state into GPRMC, GPGGA, GPGSA and LXWP0
//! sentences and delivers them over TCP or a serial line, reconnecting when
//! the link drops.

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod nmea;
pub mod telemetry;
pub mod transport;
