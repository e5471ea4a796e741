//! # Simulator Data References
//!
//! Reads aircraft state from the simulator's named data references and
//! assembles a [`TelemetrySnapshot`] per flight-loop tick.
//!
//! ## Data References
//!
//! | Data reference | Unit | Snapshot field |
//! |----------------|------|----------------|
//! | `sim/time/zulu_time_sec` | s | time of day |
//! | `sim/flightmodel/position/latitude` | deg | latitude |
//! | `sim/flightmodel/position/longitude` | deg | longitude |
//! | `sim/flightmodel/position/groundspeed` | m/s | ground speed (kts) |
//! | `sim/flightmodel/position/magpsi` | deg | magnetic heading |
//! | `sim/flightmodel/position/magnetic_variation` | deg | variation |
//! | `sim/flightmodel/position/elevation` | m | altitude |
//! | `sim/flightmodel/position/indicated_airspeed` | kts | IAS (km/h) |
//! | `sim/flightmodel/misc/h_ind` | ft | baro altitude (m) |
//! | `sim/cockpit2/gauges/indicators/total_energy_fpm` | fpm | vario (m/s) |
//! | `sim/weather/wind_direction_degt` | deg | wind direction |
//! | `sim/weather/wind_speed_kt` | kts | wind speed (km/h) |
//!
//! The last five are optional; if any of them cannot be resolved, LXWP0 is
//! not produced.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::snapshot::{ExtendedTelemetry, TelemetrySnapshot};
use crate::error::{NmeaBridgeError, Result};
use crate::nmea::protocol::{FEET_TO_METERS, FPM_TO_MPS, KNOTS_TO_KPH, MS_TO_KNOTS};

pub const DREF_ZULU_TIME: &str = "sim/time/zulu_time_sec";
pub const DREF_LATITUDE: &str = "sim/flightmodel/position/latitude";
pub const DREF_LONGITUDE: &str = "sim/flightmodel/position/longitude";
pub const DREF_GROUNDSPEED: &str = "sim/flightmodel/position/groundspeed";
pub const DREF_MAG_HEADING: &str = "sim/flightmodel/position/magpsi";
pub const DREF_MAG_VARIATION: &str = "sim/flightmodel/position/magnetic_variation";
pub const DREF_ELEVATION: &str = "sim/flightmodel/position/elevation";

pub const DREF_INDICATED_AIRSPEED: &str = "sim/flightmodel/position/indicated_airspeed";
pub const DREF_BARO_ALTITUDE: &str = "sim/flightmodel/misc/h_ind";
pub const DREF_VARIO: &str = "sim/cockpit2/gauges/indicators/total_energy_fpm";
pub const DREF_WIND_DIRECTION: &str = "sim/weather/wind_direction_degt";
pub const DREF_WIND_SPEED: &str = "sim/weather/wind_speed_kt";

/// Opaque handle to a resolved data reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRefId(pub usize);

/// Host lookup for simulator data references
#[cfg_attr(test, mockall::automock)]
pub trait DataSource {
    /// Resolve a data reference by name
    fn find(&self, name: &str) -> Option<DataRefId>;

    /// Read the current value of a resolved data reference
    fn read(&self, id: DataRefId) -> Option<f64>;
}

#[derive(Debug, Clone, Copy)]
struct ResolvedRef {
    name: &'static str,
    id: DataRefId,
}

impl ResolvedRef {
    fn resolve(source: &dyn DataSource, name: &'static str) -> Option<Self> {
        source.find(name).map(|id| Self { name, id })
    }

    fn read(&self, source: &dyn DataSource) -> Result<f64> {
        source.read(self.id).ok_or_else(|| {
            NmeaBridgeError::Telemetry(format!("{} could not be read", self.name))
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct BaseRefs {
    zulu_time: ResolvedRef,
    latitude: ResolvedRef,
    longitude: ResolvedRef,
    groundspeed: ResolvedRef,
    mag_heading: ResolvedRef,
    mag_variation: ResolvedRef,
    elevation: ResolvedRef,
}

#[derive(Debug, Clone, Copy)]
struct ExtendedRefs {
    indicated_airspeed: ResolvedRef,
    baro_altitude: ResolvedRef,
    vario: ResolvedRef,
    wind_direction: ResolvedRef,
    wind_speed: ResolvedRef,
}

/// Samples the simulator once per tick
///
/// Data references are resolved once at start; each [`sample`](Self::sample)
/// reads them and converts units.
#[derive(Debug, Clone)]
pub struct DataRefSampler {
    base: BaseRefs,
    extended: Option<ExtendedRefs>,
}

impl DataRefSampler {
    /// Resolve all data references
    ///
    /// # Errors
    ///
    /// Returns `NmeaBridgeError::MissingDataRef` if a base reference is absent.
    /// Missing extended references only disable LXWP0.
    pub fn resolve(source: &dyn DataSource) -> Result<Self> {
        let require = |name: &'static str| {
            ResolvedRef::resolve(source, name)
                .ok_or_else(|| NmeaBridgeError::MissingDataRef(name.to_string()))
        };

        let base = BaseRefs {
            zulu_time: require(DREF_ZULU_TIME)?,
            latitude: require(DREF_LATITUDE)?,
            longitude: require(DREF_LONGITUDE)?,
            groundspeed: require(DREF_GROUNDSPEED)?,
            mag_heading: require(DREF_MAG_HEADING)?,
            mag_variation: require(DREF_MAG_VARIATION)?,
            elevation: require(DREF_ELEVATION)?,
        };

        let extended = Self::resolve_extended(source);
        if extended.is_some() {
            info!("Extended soaring data references resolved, LXWP0 enabled");
        }

        Ok(Self { base, extended })
    }

    fn resolve_extended(source: &dyn DataSource) -> Option<ExtendedRefs> {
        let optional = |name: &'static str| {
            let resolved = ResolvedRef::resolve(source, name);
            if resolved.is_none() {
                warn!(dataref = name, "Data reference not found, LXWP0 disabled");
            }
            resolved
        };

        Some(ExtendedRefs {
            indicated_airspeed: optional(DREF_INDICATED_AIRSPEED)?,
            baro_altitude: optional(DREF_BARO_ALTITUDE)?,
            vario: optional(DREF_VARIO)?,
            wind_direction: optional(DREF_WIND_DIRECTION)?,
            wind_speed: optional(DREF_WIND_SPEED)?,
        })
    }

    /// Whether the LXWP0 data references were resolved
    pub fn has_extended(&self) -> bool {
        self.extended.is_some()
    }

    /// Read one snapshot
    ///
    /// # Errors
    ///
    /// Returns `NmeaBridgeError::Telemetry` if a base value cannot be read or is
    /// not finite. Unreadable extended values drop LXWP0 for this tick only.
    pub fn sample(&self, source: &dyn DataSource) -> Result<TelemetrySnapshot> {
        let base = &self.base;

        let snapshot = TelemetrySnapshot::new(
            base.zulu_time.read(source)?,
            base.latitude.read(source)?,
            base.longitude.read(source)?,
            base.groundspeed.read(source)? * MS_TO_KNOTS,
            base.mag_heading.read(source)?,
            base.mag_variation.read(source)?,
            base.elevation.read(source)?,
        )?;

        let Some(refs) = &self.extended else {
            return Ok(snapshot);
        };

        match Self::sample_extended(refs, source).and_then(|ext| snapshot.with_extended(ext)) {
            Ok(extended) => Ok(extended),
            Err(e) => {
                debug!("Skipping LXWP0 this tick: {}", e);
                Ok(snapshot)
            }
        }
    }

    fn sample_extended(refs: &ExtendedRefs, source: &dyn DataSource) -> Result<ExtendedTelemetry> {
        Ok(ExtendedTelemetry {
            indicated_airspeed_kph: refs.indicated_airspeed.read(source)? * KNOTS_TO_KPH,
            baro_altitude_m: refs.baro_altitude.read(source)? * FEET_TO_METERS,
            vario_mps: refs.vario.read(source)? * FPM_TO_MPS,
            wind_dir_deg: refs.wind_direction.read(source)?,
            wind_speed_kph: refs.wind_speed.read(source)? * KNOTS_TO_KPH,
        })
    }
}

/// In-memory data reference table
///
/// For hosts that push values rather than exposing a lookup API.
#[derive(Debug, Clone, Default)]
pub struct DataRefTable {
    ids: HashMap<String, DataRefId>,
    values: Vec<f64>,
}

impl DataRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, registering the name on first use
    pub fn set(&mut self, name: &str, value: f64) -> DataRefId {
        if let Some(&id) = self.ids.get(name) {
            self.values[id.0] = value;
            return id;
        }

        let id = DataRefId(self.values.len());
        self.values.push(value);
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }
}

impl DataSource for DataRefTable {
    fn find(&self, name: &str) -> Option<DataRefId> {
        self.ids.get(name).copied()
    }

    fn read(&self, id: DataRefId) -> Option<f64> {
        self.values.get(id.0).copied()
    }
}
