//! # NMEA Field Formatting
//!
//! Converts decimal telemetry values into the fixed textual layouts used by
//! GPRMC, GPGGA and LXWP0 fields.
//!
//! | Field | Layout | Example |
//! |-------|--------|---------|
//! | Time | `hhmmss.00` | `123456.00` |
//! | Latitude | `ddmm.mmmm,H` | `3352.1280,S` |
//! | Longitude | `dddmm.mmmm,H` | `15112.5580,E` |
//! | Speed | `sss.s` (zero padded to 5) | `085.3` |
//! | Heading | `h.h` | `257.5` |
//! | Magnetic variation | `v.v,H` (H = `W` for >= 0) | `12.5,W` |
//! | Altitude | `a.a` | `120.4` |
//! | Date | `ddmmyy` | `191026` |

use chrono::NaiveDate;

/// Format seconds since UTC midnight as `hhmmss.00`
///
/// Hours and minutes are truncated, seconds are rounded half away from zero
/// from the full time value, so `59.5` past the minute rolls to `60` rather
/// than carrying into the minutes field.
pub fn format_time(time_of_day_s: f64) -> String {
    let hh = (time_of_day_s / 3600.0).trunc() as i64;
    let mm = (time_of_day_s / 60.0).trunc() as i64 - 60 * hh;
    let ss = time_of_day_s.round() as i64 - 3600 * hh - 60 * mm;

    format!("{:02}{:02}{:02}.00", hh, mm, ss)
}

/// Format a signed latitude as `ddmm.mmmm,N|S`
pub fn format_latitude(latitude_deg: f64) -> String {
    format_coordinate(latitude_deg, 2, 'N', 'S')
}

/// Format a signed longitude as `dddmm.mmmm,E|W`
pub fn format_longitude(longitude_deg: f64) -> String {
    format_coordinate(longitude_deg, 3, 'E', 'W')
}

fn format_coordinate(value: f64, degree_width: usize, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let magnitude = value.abs();
    let degrees = magnitude.trunc();
    let minutes = 60.0 * (magnitude - degrees);

    format!(
        "{:0width$}{:07.4},{}",
        degrees as u64,
        minutes,
        hemisphere,
        width = degree_width
    )
}

/// Format a speed with one decimal, zero padded to width 5 (`085.3`)
pub fn format_speed(value: f64) -> String {
    format!("{:05.1}", value)
}

/// Format a heading or plain one-decimal value (`257.5`)
pub fn format_one_decimal(value: f64) -> String {
    format!("{:.1}", value)
}

/// True heading from magnetic heading and signed variation
pub fn format_true_heading(heading_mag_deg: f64, magnetic_variation_deg: f64) -> String {
    format_one_decimal(heading_mag_deg - magnetic_variation_deg)
}

/// Format magnetic variation as `v.v,W|E`
///
/// The simulator reports westerly variation as positive, so a value `>= 0`
/// maps to `W`. This is the inverse of the latitude/longitude convention.
pub fn format_magnetic_variation(magnetic_variation_deg: f64) -> String {
    let hemisphere = if magnetic_variation_deg < 0.0 { 'E' } else { 'W' };
    format!("{:.1},{}", magnetic_variation_deg.abs(), hemisphere)
}

/// Format an altitude in meters with one decimal
pub fn format_altitude(altitude_m: f64) -> String {
    format_one_decimal(altitude_m)
}

/// Format a calendar date as `ddmmyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d%m%y").to_string()
}
