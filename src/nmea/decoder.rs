//! # NMEA Sentence Decoder
//!
//! Splits a framed sentence back into body and checksum and verifies it.

use super::checksum::nmea_checksum;
use super::protocol::*;
use crate::error::{NmeaBridgeError, Result};

/// Decode and verify a single framed NMEA sentence
///
/// The trailing `\r\n` is optional. The checksum may be one or two hex
/// digits in either case.
///
/// # Errors
///
/// Returns error if:
/// - The sentence does not start with `$`
/// - There is no `*` delimiter
/// - The checksum is not valid hex
/// - The checksum does not match the body
///
/// # Examples
///
/// ```
/// use nmea_bridge::nmea::decoder::decode_sentence;
///
/// let sentence = decode_sentence("$GPGGA*56\r\n")?;
/// assert_eq!(sentence.body(), "GPGGA");
/// # Ok::<(), nmea_bridge::error::NmeaBridgeError>(())
/// ```
pub fn decode_sentence(sentence: &str) -> Result<EncodedSentence> {
    let framed = sentence.strip_suffix(NMEA_TERMINATOR).unwrap_or(sentence);

    let framed = framed.strip_prefix(NMEA_START).ok_or_else(|| {
        NmeaBridgeError::Protocol(format!("Missing '{}' start delimiter", NMEA_START))
    })?;

    let (body, checksum_text) = framed.rsplit_once(NMEA_CHECKSUM_DELIMITER).ok_or_else(|| {
        NmeaBridgeError::Protocol(format!(
            "Missing '{}' checksum delimiter",
            NMEA_CHECKSUM_DELIMITER
        ))
    })?;

    if checksum_text.is_empty()
        || checksum_text.len() > 2
        || !checksum_text.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(NmeaBridgeError::Protocol(format!(
            "Invalid checksum field: {:?}",
            checksum_text
        )));
    }

    let received = u8::from_str_radix(checksum_text, 16).map_err(|_| {
        NmeaBridgeError::Protocol(format!("Invalid checksum field: {:?}", checksum_text))
    })?;

    let calculated = nmea_checksum(body);
    if calculated != received {
        return Err(NmeaBridgeError::Protocol(format!(
            "Checksum mismatch: expected {:02x}, got {:02x}",
            calculated, received
        )));
    }

    Ok(EncodedSentence::new(body.to_string(), received))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gpgsa() {
        let sentence = decode_sentence(GPGSA_SENTENCE).unwrap();
        assert_eq!(sentence.body(), GPGSA_BODY);
        assert_eq!(sentence.checksum(), 0x1e);
        assert_eq!(sentence.sentence_id(), "GPGSA");
    }

    #[test]
    fn test_decode_without_terminator() {
        let sentence = decode_sentence("$GPGGA*56").unwrap();
        assert_eq!(sentence.body(), "GPGGA");
    }

    #[test]
    fn test_decode_uppercase_and_single_digit_checksum() {
        assert!(decode_sentence("$GPGSA,A,3,13,20,31,,,,,,,,,,02.2,02.2,*1E\r\n").is_ok());

        // "AB" -> 0x41 ^ 0x42 = 0x03
        assert!(decode_sentence("$AB*3\r\n").is_ok());
    }

    #[test]
    fn test_decode_missing_start() {
        match decode_sentence("GPGGA*56\r\n") {
            Err(NmeaBridgeError::Protocol(msg)) => assert!(msg.contains("start")),
            other => panic!("Expected Protocol error, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_delimiter() {
        assert!(matches!(
            decode_sentence("$GPGGA\r\n"),
            Err(NmeaBridgeError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_invalid_hex() {
        assert!(matches!(
            decode_sentence("$GPGGA*zz\r\n"),
            Err(NmeaBridgeError::Protocol(_))
        ));
        assert!(matches!(
            decode_sentence("$GPGGA*\r\n"),
            Err(NmeaBridgeError::Protocol(_))
        ));
        assert!(matches!(
            decode_sentence("$GPGGA*056\r\n"),
            Err(NmeaBridgeError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_rejects_signed_checksum() {
        // "AB" -> 0x03, but a signed "+3" is not a hex field
        assert!(matches!(
            decode_sentence("$AB*+3\r\n"),
            Err(NmeaBridgeError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        match decode_sentence("$GPGGA*57\r\n") {
            Err(NmeaBridgeError::Protocol(msg)) => {
                assert!(msg.contains("expected 56"));
                assert!(msg.contains("got 57"));
            }
            other => panic!("Expected Protocol error, got: {:?}", other),
        }
    }
}
