// src/gps/data.rs
//! Fix record and satellite observations

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Number of satellite slots carried by a fix
pub const SATELLITE_SLOTS: usize = 4;

/// Knots to km/h
pub const KNOTS_TO_KMH: f64 = 1.852;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SatelliteObservation {
    pub prn: u32,     // Satellite PRN/ID number
    pub snr: u32,     // Signal-to-noise ratio in dB
    pub azimuth: u32, // Azimuth angle in degrees
}

impl SatelliteObservation {
    /// A slot only counts once the receiver reported a signal for it
    pub fn is_tracked(&self) -> bool {
        self.snr > 0
    }
}

/// One assembled position report, built from an RMC, a GGA and a GSV sentence
/// of the same acquisition cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fix {
    pub acquired_at: DateTime<Utc>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub validity: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,     // knots
    pub course: f64,    // degrees
    pub variation: f64, // degrees, west negative
    pub fix_quality: u8,
    pub satellites_in_use: u32,
    pub satellites_in_view: u32,
    pub hdop: f64,
    pub altitude: f64,
    pub raw_position: String,
    pub satellites: [SatelliteObservation; SATELLITE_SLOTS],
}

impl Fix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_position(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }

    /// Speed over ground in km/h
    pub fn speed_kmh(&self) -> f64 {
        self.speed * KNOTS_TO_KMH
    }

    /// Number of satellite slots holding a tracked satellite
    pub fn tracked_satellites(&self) -> usize {
        self.satellites.iter().filter(|sat| sat.is_tracked()).count()
    }

    /// Get fix type description
    pub fn fix_description(&self) -> String {
        match self.fix_quality {
            0 => "No fix".to_string(),
            1 => "GPS".to_string(),
            2 => "DGPS".to_string(),
            3 => "PPS".to_string(),
            4 => "RTK".to_string(),
            5 => "Float RTK".to_string(),
            6 => "Estimated".to_string(),
            7 => "Manual".to_string(),
            8 => "Simulation".to_string(),
            quality => format!("Unknown ({})", quality),
        }
    }

    /// Validity code as reported by the position sentence ("A" active, "V" void)
    pub fn is_valid(&self) -> bool {
        self.validity == "A"
    }
}
