// src/gps/nmea.rs
//! NMEA 0183 sentence decoding
//!
//! Only the three sentence families the assembler consumes are decoded: RMC
//! (position), GGA (fix quality) and GSV (satellites in view). Any talker id is
//! accepted, so `$GPRMC`, `$GNRMC` and `$GLGSV` decode the same way.

use crate::error::{Result, TrackerError};
use chrono::{NaiveDate, NaiveTime};

/// Satellites carried by a single GSV sentence
pub const GSV_ENTRIES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Rmc(RmcData),
    Gga(GgaData),
    Gsv(GsvData),
}

impl Sentence {
    pub fn kind(&self) -> &'static str {
        match self {
            Sentence::Rmc(_) => "RMC",
            Sentence::Gga(_) => "GGA",
            Sentence::Gsv(_) => "GSV",
        }
    }
}

/// Recommended Minimum Course
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RmcData {
    pub time: Option<NaiveTime>,
    pub validity: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,  // knots
    pub course: f64, // degrees
    pub date: Option<NaiveDate>,
    pub variation: f64,
    /// Sentence text exactly as received, checksum included
    pub raw: String,
}

/// Global Positioning System Fix Data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GgaData {
    pub time: Option<NaiveTime>,
    pub latitude: f64,
    pub longitude: f64,
    pub fix_quality: u8,
    pub satellites: u32,
    pub hdop: f64,
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GsvSatellite {
    pub prn: u32,
    pub elevation: u32,
    pub azimuth: u32,
    pub snr: u32,
}

/// Satellites in View
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GsvData {
    pub total_messages: u32,
    pub message_number: u32,
    pub satellites_in_view: u32,
    pub info: Vec<GsvSatellite>,
}

/// Decode a single sentence line
pub fn decode(line: &str) -> Result<Sentence> {
    let sentence = line.trim();

    let body = sentence
        .strip_prefix('$')
        .ok_or_else(|| decode_error("sentence does not start with '$'"))?;
    let (body, checksum) = body
        .split_once('*')
        .ok_or_else(|| decode_error("sentence does not contain checksum separator"))?;
    verify_checksum(body, checksum)?;

    let parts: Vec<&str> = body.split(',').collect();
    let address = parts[0];
    let kind = address
        .get(address.len().saturating_sub(3)..)
        .filter(|_| address.len() >= 5)
        .ok_or_else(|| decode_error(&format!("invalid address field '{}'", address)))?;

    match kind {
        "RMC" => parse_rmc(&parts, sentence).map(Sentence::Rmc),
        "GGA" => parse_gga(&parts).map(Sentence::Gga),
        "GSV" => parse_gsv(&parts).map(Sentence::Gsv),
        other => Err(decode_error(&format!("unsupported sentence type {}", other))),
    }
}

/// XOR of every byte between '$' and '*'
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

fn verify_checksum(body: &str, expected: &str) -> Result<()> {
    if expected.len() != 2 {
        return Err(decode_error(&format!("malformed checksum '{}'", expected)));
    }
    let expected = u8::from_str_radix(expected, 16)
        .map_err(|_| decode_error(&format!("malformed checksum '{}'", expected)))?;
    let actual = checksum(body);
    if actual != expected {
        return Err(decode_error(&format!(
            "checksum mismatch: expected {:02X}, computed {:02X}",
            expected, actual
        )));
    }
    Ok(())
}

fn parse_rmc(parts: &[&str], raw: &str) -> Result<RmcData> {
    if parts.len() < 12 {
        return Err(decode_error("RMC sentence is too short"));
    }

    let mut variation = parse_f64(parts[10])?;
    if parts[11] == "W" {
        variation = -variation;
    }

    Ok(RmcData {
        time: parse_time(parts[1])?,
        validity: parts[2].to_string(),
        latitude: parse_coordinate(parts[3], parts[4])?,
        longitude: parse_coordinate(parts[5], parts[6])?,
        speed: parse_f64(parts[7])?,
        course: parse_f64(parts[8])?,
        date: parse_date(parts[9])?,
        variation,
        raw: raw.to_string(),
    })
}

fn parse_gga(parts: &[&str]) -> Result<GgaData> {
    if parts.len() < 10 {
        return Err(decode_error("GGA sentence is too short"));
    }

    let fix_quality = if parts[6].is_empty() {
        0
    } else {
        parts[6]
            .parse::<u8>()
            .map_err(|_| decode_error(&format!("invalid fix quality '{}'", parts[6])))?
    };

    Ok(GgaData {
        time: parse_time(parts[1])?,
        latitude: parse_coordinate(parts[2], parts[3])?,
        longitude: parse_coordinate(parts[4], parts[5])?,
        fix_quality,
        satellites: parse_u32(parts[7])?,
        hdop: parse_f64(parts[8])?,
        altitude: parse_f64(parts[9])?,
    })
}

fn parse_gsv(parts: &[&str]) -> Result<GsvData> {
    if parts.len() < 4 {
        return Err(decode_error("GSV sentence is too short"));
    }

    let mut info = Vec::with_capacity(GSV_ENTRIES);
    for group in parts[4..].chunks(4).take(GSV_ENTRIES) {
        let field = |n: usize| group.get(n).copied().unwrap_or("");
        info.push(GsvSatellite {
            prn: parse_u32(field(0))?,
            elevation: parse_u32(field(1))?,
            azimuth: parse_u32(field(2))?,
            snr: parse_u32(field(3))?,
        });
    }

    Ok(GsvData {
        total_messages: parse_u32(parts[1])?,
        message_number: parse_u32(parts[2])?,
        satellites_in_view: parse_u32(parts[3])?,
        info,
    })
}

/// `ddmm.mmmm` plus hemisphere to signed decimal degrees
fn parse_coordinate(value: &str, hemisphere: &str) -> Result<f64> {
    if value.is_empty() {
        return Ok(0.0);
    }
    let raw = value
        .parse::<f64>()
        .map_err(|_| decode_error(&format!("invalid coordinate '{}'", value)))?;

    let degrees = (raw / 100.0) as i32;
    let minutes = raw % 100.0;
    let coordinate = degrees as f64 + minutes / 60.0;

    match hemisphere {
        "S" | "W" => Ok(-coordinate),
        "N" | "E" | "" => Ok(coordinate),
        other => Err(decode_error(&format!("invalid hemisphere '{}'", other))),
    }
}

/// `hhmmss` with optional fractional seconds
fn parse_time(value: &str) -> Result<Option<NaiveTime>> {
    if value.is_empty() {
        return Ok(None);
    }
    let invalid = || decode_error(&format!("invalid time '{}'", value));

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if whole.len() != 6 || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hour = whole[0..2].parse::<u32>().map_err(|_| invalid())?;
    let minute = whole[2..4].parse::<u32>().map_err(|_| invalid())?;
    let second = whole[4..6].parse::<u32>().map_err(|_| invalid())?;
    let millis = if fraction.is_empty() {
        0
    } else {
        let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
        digits.parse::<u32>().map_err(|_| invalid())?
    };

    NaiveTime::from_hms_milli_opt(hour, minute, second, millis)
        .map(Some)
        .ok_or_else(invalid)
}

/// `ddmmyy`; two-digit years map onto 1980..=2079
fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    let invalid = || decode_error(&format!("invalid date '{}'", value));
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let day = value[0..2].parse::<u32>().map_err(|_| invalid())?;
    let month = value[2..4].parse::<u32>().map_err(|_| invalid())?;
    let year = value[4..6].parse::<i32>().map_err(|_| invalid())?;
    let year = if year < 80 { 2000 + year } else { 1900 + year };

    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(invalid)
}

fn parse_f64(value: &str) -> Result<f64> {
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .map_err(|_| decode_error(&format!("invalid number '{}'", value)))
}

fn parse_u32(value: &str) -> Result<u32> {
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<u32>()
        .map_err(|_| decode_error(&format!("invalid integer '{}'", value)))
}

fn decode_error(msg: &str) -> TrackerError {
    TrackerError::Decode(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const GSV: &str = "$GPGSV,3,1,12,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*7F";

    #[test]
    fn test_rmc_decoding() {
        let Sentence::Rmc(rmc) = decode(RMC).unwrap() else {
            panic!("expected RMC");
        };

        assert_eq!(rmc.validity, "A");
        assert!((rmc.latitude - 48.1173).abs() < 1e-4);
        assert!((rmc.longitude - 11.516666).abs() < 1e-4);
        assert_eq!(rmc.speed, 22.4);
        assert_eq!(rmc.course, 84.4);
        assert_eq!(rmc.variation, -3.1);
        assert_eq!(rmc.date, NaiveDate::from_ymd_opt(1994, 3, 23));
        assert_eq!(rmc.time, NaiveTime::from_hms_opt(12, 35, 19));
        assert_eq!(rmc.raw, RMC);
    }

    #[test]
    fn test_gga_decoding() {
        let Sentence::Gga(gga) = decode(GGA).unwrap() else {
            panic!("expected GGA");
        };

        assert!(gga.latitude > 48.0);
        assert_eq!(gga.fix_quality, 1);
        assert_eq!(gga.satellites, 8);
        assert_eq!(gga.hdop, 0.9);
        assert_eq!(gga.altitude, 545.4);
    }

    #[test]
    fn test_gsv_decoding() {
        let Sentence::Gsv(gsv) = decode(GSV).unwrap() else {
            panic!("expected GSV");
        };

        assert_eq!(gsv.total_messages, 3);
        assert_eq!(gsv.message_number, 1);
        assert_eq!(gsv.satellites_in_view, 12);
        assert_eq!(gsv.info.len(), 4);
        assert_eq!(
            gsv.info[0],
            GsvSatellite { prn: 1, elevation: 40, azimuth: 83, snr: 46 }
        );
        assert_eq!(gsv.info[3].snr, 45);
    }

    #[test]
    fn test_gsv_empty_trailing_group() {
        let line = "$GPGSV,3,2,12,22,42,067,42,24,14,311,43,27,05,244,00,,,,*4F";
        let Sentence::Gsv(gsv) = decode(line).unwrap() else {
            panic!("expected GSV");
        };

        assert_eq!(gsv.info.len(), 4);
        assert_eq!(gsv.info[2].snr, 0);
        assert_eq!(gsv.info[3], GsvSatellite::default());
    }

    #[test]
    fn test_other_talkers_and_empty_fields() {
        let Sentence::Rmc(rmc) = decode("$GNRMC,000000,V,,,,,,,010100,,*2F").unwrap() else {
            panic!("expected RMC");
        };

        assert_eq!(rmc.validity, "V");
        assert_eq!(rmc.latitude, 0.0);
        assert_eq!(rmc.longitude, 0.0);
        assert_eq!(rmc.date, NaiveDate::from_ymd_opt(2000, 1, 1));
    }

    #[test]
    fn test_trailing_crlf_is_ignored() {
        let line = format!("{}\r\n", GGA);
        assert_eq!(decode(&line).unwrap().kind(), "GGA");
    }

    #[test]
    fn test_checksum_mismatch() {
        let line = "$GPGSV,3,1,12,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*75";
        assert!(matches!(decode(line), Err(TrackerError::Decode(_))));
    }

    #[test]
    fn test_missing_checksum() {
        let line = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W";
        assert!(decode(line).is_err());
    }

    #[test]
    fn test_unsupported_sentence() {
        let body = "GPVTG,054.7,T,034.4,M,005.5,N,010.2,K";
        let line = format!("${}*{:02X}", body, checksum(body));
        let err = decode(&line).unwrap_err();
        assert!(err.to_string().contains("unsupported sentence type VTG"));
    }

    #[test]
    fn test_invalid_sentence() {
        assert!(decode("$INVALID,123,456").is_err());
        assert!(decode("garbage").is_err());
        assert!(decode("").is_err());
    }
}
