//! # NMEA-0183 Checksum
//!
//! XOR checksum over the sentence body, i.e. every byte between the leading
//! `$` and the `*` delimiter (both excluded).
//!
//! The checksum is always rendered as exactly two lowercase hex digits.

/// Calculate the NMEA checksum of a sentence body
///
/// # Arguments
///
/// * `body` - Sentence content between `$` and `*` (e.g. `"GPGGA,..."`)
///
/// # Returns
///
/// * `u8` - XOR of every byte in `body`
///
/// # Examples
///
/// ```
/// use nmea_bridge::nmea::checksum::nmea_checksum;
///
/// assert_eq!(nmea_checksum("GPGSA,A,3,13,20,31,,,,,,,,,,02.2,02.2,"), 0x1e);
/// ```
pub fn nmea_checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, byte| acc ^ byte)
}

/// Format a checksum as two lowercase hex digits
pub fn format_checksum(checksum: u8) -> String {
    format!("{:02x}", checksum)
}

/// Checksum of `body`, formatted for the `*hh` suffix
pub fn checksum_hex(body: &str) -> String {
    format_checksum(nmea_checksum(body))
}

/// Bytewise reference implementation used to cross-check the fold
#[cfg(test)]
fn nmea_checksum_slow(body: &str) -> u8 {
    let bytes = body.as_bytes();
    let mut checksum: u8 = 0;
    let mut i = 0;

    while i < bytes.len() {
        checksum ^= bytes[i];
        i += 1;
    }

    checksum
}
