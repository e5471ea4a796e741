//! # NMEA Protocol Constants and Types
//!
//! Sentence identifiers, fixed field values and unit conversion factors.

use std::fmt;

use bytes::Bytes;

/// Sentence start delimiter
pub const NMEA_START: char = '$';

/// Checksum delimiter
pub const NMEA_CHECKSUM_DELIMITER: char = '*';

/// Sentence terminator
pub const NMEA_TERMINATOR: &str = "\r\n";

/// Recommended minimum navigation fix
pub const SENTENCE_GPRMC: &str = "GPRMC";

/// GPS fix data
pub const SENTENCE_GPGGA: &str = "GPGGA";

/// GPS DOP and active satellites
pub const SENTENCE_GPGSA: &str = "GPGSA";

/// LX Navigation vario/wind sentence
pub const SENTENCE_LXWP0: &str = "LXWP0";

/// GPRMC status: active fix
pub const RMC_STATUS_ACTIVE: &str = "A";

/// GPGGA fix quality (GPS fix)
pub const GGA_FIX_QUALITY: &str = "1";

/// GPGGA satellites in use
pub const GGA_SATELLITES: &str = "04";

/// GPGGA horizontal dilution of precision
pub const GGA_HDOP: &str = "0.0";

/// GPGGA altitude unit (meters)
pub const GGA_ALTITUDE_UNIT: &str = "M";

/// LXWP0 logger-stored flag
pub const LXWP0_LOGGER_STORED: &str = "Y";

/// Number of empty vario slots following the instantaneous vario in LXWP0
pub const LXWP0_EMPTY_VARIO_FIELDS: usize = 5;

/// Body of the constant GPGSA sentence.
///
/// Satellite IDs, fix type and DOP values are what the simulator's own
/// NMEA serial feed emits. Not derived from telemetry.
pub const GPGSA_BODY: &str = "GPGSA,A,3,13,20,31,,,,,,,,,,02.2,02.2,";

/// The complete, pre-baked GPGSA sentence
pub const GPGSA_SENTENCE: &str = "$GPGSA,A,3,13,20,31,,,,,,,,,,02.2,02.2,*1e\r\n";

/// Conversion factor: meters per second to knots
pub const MS_TO_KNOTS: f64 = 1.943;

/// Ground speed factor applied to XGPS datagrams
pub const XGPS_SPEED_FACTOR: f64 = 1.945;

/// Conversion factor: knots to kilometers per hour
pub const KNOTS_TO_KPH: f64 = 1.852;

/// Conversion factor: feet to meters
pub const FEET_TO_METERS: f64 = 0.3048;

/// Conversion factor: feet per minute to meters per second
pub const FPM_TO_MPS: f64 = 0.00508;

/// A single framed NMEA sentence
///
/// Holds the body (between `$` and `*`) and its checksum. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSentence {
    body: String,
    checksum: u8,
}

impl EncodedSentence {
    /// Create a sentence from a body and its precomputed checksum
    pub(crate) fn new(body: String, checksum: u8) -> Self {
        Self { body, checksum }
    }

    /// Sentence body without delimiters
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Sentence identifier (first comma-separated field)
    pub fn sentence_id(&self) -> &str {
        self.body.split(',').next().unwrap_or_default()
    }

    /// XOR checksum of the body
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Framed sentence bytes (`$<body>*<hh>\r\n`)
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl fmt::Display for EncodedSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{:02x}{}",
            NMEA_START, self.body, NMEA_CHECKSUM_DELIMITER, self.checksum, NMEA_TERMINATOR
        )
    }
}
