//! # NMEA Sentence Encoder
//!
//! Pure functions turning a [`TelemetrySnapshot`] into framed NMEA sentences.
//! Every sentence is `$<body>*<checksum>\r\n`.

use bytes::{BufMut, Bytes, BytesMut};

use super::checksum::nmea_checksum;
use super::fields::*;
use super::protocol::*;
use crate::telemetry::TelemetrySnapshot;

/// Frame a sentence body with its checksum
///
/// # Examples
///
/// ```
/// use nmea_bridge::nmea::encoder::encode_sentence;
///
/// let sentence = encode_sentence("GPGGA".to_string());
/// assert_eq!(sentence.to_string(), "$GPGGA*56\r\n");
/// ```
pub fn encode_sentence(body: String) -> EncodedSentence {
    let checksum = nmea_checksum(&body);
    EncodedSentence::new(body, checksum)
}

/// Encode the GPRMC (recommended minimum) sentence
///
/// # Arguments
///
/// * `snapshot` - Telemetry for this tick
/// * `date` - `ddmmyy` date string
pub fn encode_gprmc(snapshot: &TelemetrySnapshot, date: &str) -> EncodedSentence {
    let body = [
        SENTENCE_GPRMC.to_string(),
        format_time(snapshot.time_of_day_s()),
        RMC_STATUS_ACTIVE.to_string(),
        format_latitude(snapshot.latitude_deg()),
        format_longitude(snapshot.longitude_deg()),
        format_speed(snapshot.ground_speed_kts()),
        format_true_heading(snapshot.heading_mag_deg(), snapshot.magnetic_variation_deg()),
        date.to_string(),
        format_magnetic_variation(snapshot.magnetic_variation_deg()),
    ]
    .join(",");

    encode_sentence(body)
}

/// Encode the GPGGA (fix data) sentence
///
/// Fix quality, satellite count and HDOP are constants; geoid separation and
/// DGPS fields are left empty.
pub fn encode_gpgga(snapshot: &TelemetrySnapshot) -> EncodedSentence {
    let body = [
        SENTENCE_GPGGA.to_string(),
        format_time(snapshot.time_of_day_s()),
        format_latitude(snapshot.latitude_deg()),
        format_longitude(snapshot.longitude_deg()),
        GGA_FIX_QUALITY.to_string(),
        GGA_SATELLITES.to_string(),
        GGA_HDOP.to_string(),
        format_altitude(snapshot.altitude_m()),
        GGA_ALTITUDE_UNIT.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
    ]
    .join(",");

    encode_sentence(body)
}

/// The constant GPGSA sentence
pub fn gpgsa() -> EncodedSentence {
    encode_sentence(GPGSA_BODY.to_string())
}

/// Encode the LXWP0 vario/wind sentence
///
/// Returns `None` when the snapshot carries no extended telemetry.
pub fn encode_lxwp0(snapshot: &TelemetrySnapshot) -> Option<EncodedSentence> {
    let extended = snapshot.extended()?;

    let mut fields = vec![
        SENTENCE_LXWP0.to_string(),
        LXWP0_LOGGER_STORED.to_string(),
        format_speed(extended.indicated_airspeed_kph),
        format_one_decimal(extended.baro_altitude_m),
        format_one_decimal(extended.vario_mps),
    ];
    fields.extend(std::iter::repeat(String::new()).take(LXWP0_EMPTY_VARIO_FIELDS));
    fields.push(format_true_heading(
        snapshot.heading_mag_deg(),
        snapshot.magnetic_variation_deg(),
    ));
    fields.push(format_one_decimal(extended.wind_dir_deg));
    fields.push(format_speed(extended.wind_speed_kph));

    Some(encode_sentence(fields.join(",")))
}

/// Encode one flight-loop tick: GPRMC, GPGGA, GPGSA and optionally LXWP0
///
/// # Arguments
///
/// * `snapshot` - Telemetry for this tick
/// * `date` - `ddmmyy` date string
/// * `include_extended` - Emit LXWP0 when the snapshot has extended fields
///
/// # Returns
///
/// * `Bytes` - All sentences concatenated, ready for a single write
pub fn encode_tick(snapshot: &TelemetrySnapshot, date: &str, include_extended: bool) -> Bytes {
    let mut sentences = vec![encode_gprmc(snapshot, date), encode_gpgga(snapshot), gpgsa()];

    if include_extended {
        sentences.extend(encode_lxwp0(snapshot));
    }

    concat_sentences(&sentences)
}

/// Encode a position report (GPGGA then GPRMC) for datagram-fed telemetry
pub fn encode_position_report(snapshot: &TelemetrySnapshot, date: &str) -> Bytes {
    concat_sentences(&[encode_gpgga(snapshot), encode_gprmc(snapshot, date)])
}

fn concat_sentences(sentences: &[EncodedSentence]) -> Bytes {
    let mut buffer = BytesMut::with_capacity(sentences.len() * 80);
    for sentence in sentences {
        buffer.put_slice(sentence.to_string().as_bytes());
    }
    buffer.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmea::decoder::decode_sentence;
    use crate::telemetry::ExtendedTelemetry;

    const DATE: &str = "191026";

    fn sydney() -> TelemetrySnapshot {
        TelemetrySnapshot::new(45296.0, -33.8688, 151.2093, 85.3, 270.0, 12.5, 120.4).unwrap()
    }

    fn sydney_extended() -> TelemetrySnapshot {
        sydney()
            .with_extended(ExtendedTelemetry {
                indicated_airspeed_kph: 98.76,
                baro_altitude_m: 1500.0,
                vario_mps: -1.3,
                wind_dir_deg: 275.0,
                wind_speed_kph: 18.5,
            })
            .unwrap()
    }

    /// `^\$[A-Za-z0-9,.\-]+\*[0-9a-f]{1,2}\r\n$`
    fn has_sentence_shape(sentence: &str) -> bool {
        let Some(rest) = sentence.strip_prefix('$') else {
            return false;
        };
        let Some(rest) = rest.strip_suffix("\r\n") else {
            return false;
        };
        let Some((body, checksum)) = rest.split_once('*') else {
            return false;
        };

        !body.is_empty()
            && body
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ',' || c == '.' || c == '-')
            && (1..=2).contains(&checksum.len())
            && checksum
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    fn split_sentences(buffer: &[u8]) -> Vec<String> {
        let text = std::str::from_utf8(buffer).unwrap();
        text.split_inclusive("\r\n").map(str::to_string).collect()
    }

    #[test]
    fn test_encode_gprmc_end_to_end() {
        let sentence = encode_gprmc(&sydney(), DATE);

        assert_eq!(
            sentence.body(),
            "GPRMC,123456.00,A,3352.1280,S,15112.5580,E,085.3,257.5,191026,12.5,W"
        );
        assert_eq!(sentence.checksum(), 0x62);
        assert!(sentence.to_string().ends_with("*62\r\n"));
    }

    #[test]
    fn test_encode_gpgga() {
        let sentence = encode_gpgga(&sydney());

        assert_eq!(
            sentence.body(),
            "GPGGA,123456.00,3352.1280,S,15112.5580,E,1,04,0.0,120.4,M,,,,"
        );
        assert_eq!(sentence.to_string(), format!("${}*24\r\n", sentence.body()));
    }

    #[test]
    fn test_gpgsa_is_constant() {
        assert_eq!(gpgsa().to_string(), GPGSA_SENTENCE);
    }

    #[test]
    fn test_encode_lxwp0() {
        let sentence = encode_lxwp0(&sydney_extended()).unwrap();

        assert_eq!(
            sentence.body(),
            "LXWP0,Y,098.8,1500.0,-1.3,,,,,,257.5,275.0,018.5"
        );
    }

    #[test]
    fn test_encode_lxwp0_without_extended() {
        assert!(encode_lxwp0(&sydney()).is_none());
    }

    #[test]
    fn test_encode_tick_order() {
        let buffer = encode_tick(&sydney_extended(), DATE, true);
        let sentences = split_sentences(&buffer);

        assert_eq!(sentences.len(), 4);
        assert!(sentences[0].starts_with("$GPRMC,"));
        assert!(sentences[1].starts_with("$GPGGA,"));
        assert_eq!(sentences[2], GPGSA_SENTENCE);
        assert!(sentences[3].starts_with("$LXWP0,"));
    }

    #[test]
    fn test_encode_tick_extended_disabled() {
        let buffer = encode_tick(&sydney_extended(), DATE, false);
        assert_eq!(split_sentences(&buffer).len(), 3);
    }

    #[test]
    fn test_encode_tick_no_extended_fields() {
        let buffer = encode_tick(&sydney(), DATE, true);
        assert_eq!(split_sentences(&buffer).len(), 3);
    }

    #[test]
    fn test_encode_position_report_order() {
        let buffer = encode_position_report(&sydney(), DATE);
        let sentences = split_sentences(&buffer);

        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("$GPGGA,"));
        assert!(sentences[1].starts_with("$GPRMC,"));
    }

    #[test]
    fn test_every_sentence_has_valid_shape_and_checksum() {
        let snapshots = [
            sydney_extended(),
            TelemetrySnapshot::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap(),
            TelemetrySnapshot::new(86399.0, 89.9999, -179.9999, 450.0, 359.9, -20.0, 8848.0)
                .unwrap(),
        ];

        for snapshot in snapshots.iter() {
            let buffer = encode_tick(snapshot, DATE, true);
            for sentence in split_sentences(&buffer) {
                assert!(has_sentence_shape(&sentence), "Bad shape: {:?}", sentence);

                let decoded = decode_sentence(&sentence).unwrap();
                assert_eq!(decoded.checksum(), nmea_checksum(decoded.body()));
            }
        }
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let snapshot = sydney_extended();
        assert_eq!(
            encode_tick(&snapshot, DATE, true),
            encode_tick(&snapshot, DATE, true)
        );
    }

    #[test]
    fn test_different_position_different_checksum() {
        let a = TelemetrySnapshot::new(45296.0, 10.0, 20.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        let b = TelemetrySnapshot::new(45296.0, 10.5, 20.0, 0.0, 0.0, 0.0, 0.0).unwrap();

        assert_ne!(encode_gpgga(&a).checksum(), encode_gpgga(&b).checksum());
    }
}
