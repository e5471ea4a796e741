//! XGPS datagram parsing.
//!
//! Format: `<tag>,lon,lat,alt_m,track,ground_speed`, ASCII, comma separated.

use tracing::trace;

use super::snapshot::TelemetrySnapshot;
use crate::error::Result;
use crate::nmea::protocol::XGPS_SPEED_FACTOR;

/// Default message tag recognised by the UDP bridge.
pub const DEFAULT_XGPS_TAG: &str = "XGPS1";

/// Position fix decoded from one XGPS datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XgpsFix {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub altitude_m: f64,
    pub track_deg: f64,
    /// Raw speed field, scaled by [`XGPS_SPEED_FACTOR`] into the snapshot
    pub ground_speed: f64,
}

impl XgpsFix {
    /// Build a snapshot for the given UTC time of day.
    ///
    /// The datagram carries no magnetic variation, so the track is used as the
    /// heading with zero variation. Ground speed is scaled by 1.945.
    pub fn to_snapshot(&self, time_of_day_s: f64) -> Result<TelemetrySnapshot> {
        TelemetrySnapshot::new(
            time_of_day_s,
            self.latitude_deg,
            self.longitude_deg,
            self.ground_speed * XGPS_SPEED_FACTOR,
            self.track_deg,
            0.0,
            self.altitude_m,
        )
    }
}

/// Parse a datagram; `None` unless the first field equals `tag` and the next
/// five fields are numbers.
pub fn parse_xgps(datagram: &[u8], tag: &str) -> Option<XgpsFix> {
    let text = std::str::from_utf8(datagram).ok()?;
    let parts: Vec<&str> = text.trim_end().split(',').collect();

    if parts.first() != Some(&tag) {
        return None;
    }
    if parts.len() < 6 {
        trace!("XGPS datagram too short: {} fields", parts.len());
        return None;
    }

    let field = |index: usize| parts[index].trim().parse::<f64>().ok();

    Some(XgpsFix {
        longitude_deg: field(1)?,
        latitude_deg: field(2)?,
        altitude_m: field(3)?,
        track_deg: field(4)?,
        ground_speed: field(5)?,
    })
}
