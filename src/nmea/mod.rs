//! # NMEA-0183 Module
//!
//! Encoding of aircraft telemetry into NMEA-0183 sentences.
//!
//! This module handles:
//! - GPRMC, GPGGA, GPGSA and LXWP0 sentence encoding
//! - Field formatting (time, coordinates, speed, heading, variation)
//! - XOR checksum calculation
//! - Sentence framing and verification

pub mod protocol;
pub mod fields;
pub mod encoder;
pub mod decoder;
pub mod checksum;
