//! # Telemetry Snapshot
//!
//! One tick's consistent set of aircraft-state readings, already converted to
//! the units the NMEA sentences carry.

use crate::error::{NmeaBridgeError, Result};

/// Soaring fields carried only by LXWP0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendedTelemetry {
    /// Indicated airspeed in km/h
    pub indicated_airspeed_kph: f64,

    /// Barometric altitude in meters
    pub baro_altitude_m: f64,

    /// Vertical speed in m/s
    pub vario_mps: f64,

    /// Wind direction in degrees
    pub wind_dir_deg: f64,

    /// Wind speed in km/h
    pub wind_speed_kph: f64,
}

impl ExtendedTelemetry {
    fn validate(&self) -> Result<()> {
        ensure_finite("indicated_airspeed_kph", self.indicated_airspeed_kph)?;
        ensure_finite("baro_altitude_m", self.baro_altitude_m)?;
        ensure_finite("vario_mps", self.vario_mps)?;
        ensure_finite("wind_dir_deg", self.wind_dir_deg)?;
        ensure_finite("wind_speed_kph", self.wind_speed_kph)
    }
}

/// Immutable aircraft state captured at one tick
///
/// Construction validates that every field is finite; a snapshot is either
/// complete or rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    time_of_day_s: f64,
    latitude_deg: f64,
    longitude_deg: f64,
    ground_speed_kts: f64,
    heading_mag_deg: f64,
    magnetic_variation_deg: f64,
    altitude_m: f64,
    extended: Option<ExtendedTelemetry>,
}

impl TelemetrySnapshot {
    /// Build a snapshot from the base fields
    ///
    /// # Arguments
    ///
    /// * `time_of_day_s` - Seconds since UTC midnight
    /// * `latitude_deg` / `longitude_deg` - Signed decimal degrees
    /// * `ground_speed_kts` - Ground speed in knots
    /// * `heading_mag_deg` - Magnetic heading in degrees
    /// * `magnetic_variation_deg` - Signed variation, west positive
    /// * `altitude_m` - Altitude in meters
    ///
    /// # Errors
    ///
    /// Returns `NmeaBridgeError::Telemetry` if any field is NaN or infinite
    ///
    /// # Examples
    ///
    /// ```
    /// use nmea_bridge::telemetry::TelemetrySnapshot;
    ///
    /// let snapshot = TelemetrySnapshot::new(45296.0, -33.8688, 151.2093, 85.3, 270.0, 12.5, 120.4)?;
    /// assert_eq!(snapshot.true_heading_deg(), 257.5);
    /// # Ok::<(), nmea_bridge::error::NmeaBridgeError>(())
    /// ```
    pub fn new(
        time_of_day_s: f64,
        latitude_deg: f64,
        longitude_deg: f64,
        ground_speed_kts: f64,
        heading_mag_deg: f64,
        magnetic_variation_deg: f64,
        altitude_m: f64,
    ) -> Result<Self> {
        ensure_finite("time_of_day_s", time_of_day_s)?;
        ensure_finite("latitude_deg", latitude_deg)?;
        ensure_finite("longitude_deg", longitude_deg)?;
        ensure_finite("ground_speed_kts", ground_speed_kts)?;
        ensure_finite("heading_mag_deg", heading_mag_deg)?;
        ensure_finite("magnetic_variation_deg", magnetic_variation_deg)?;
        ensure_finite("altitude_m", altitude_m)?;

        Ok(Self {
            time_of_day_s,
            latitude_deg,
            longitude_deg,
            ground_speed_kts,
            heading_mag_deg,
            magnetic_variation_deg,
            altitude_m,
            extended: None,
        })
    }

    /// Attach the LXWP0 fields
    ///
    /// # Errors
    ///
    /// Returns `NmeaBridgeError::Telemetry` if any extended field is not finite
    pub fn with_extended(mut self, extended: ExtendedTelemetry) -> Result<Self> {
        extended.validate()?;
        self.extended = Some(extended);
        Ok(self)
    }

    pub fn time_of_day_s(&self) -> f64 {
        self.time_of_day_s
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }

    pub fn ground_speed_kts(&self) -> f64 {
        self.ground_speed_kts
    }

    pub fn heading_mag_deg(&self) -> f64 {
        self.heading_mag_deg
    }

    pub fn magnetic_variation_deg(&self) -> f64 {
        self.magnetic_variation_deg
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_m
    }

    /// Extended soaring fields, if the source provided them
    pub fn extended(&self) -> Option<&ExtendedTelemetry> {
        self.extended.as_ref()
    }

    /// Magnetic heading corrected by the variation
    pub fn true_heading_deg(&self) -> f64 {
        self.heading_mag_deg - self.magnetic_variation_deg
    }
}

fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(NmeaBridgeError::Telemetry(format!(
            "{} is not a finite number ({})",
            name, value
        )))
    }
}
