// src/display/console.rs
//! Logs every fix in a human-readable block

use crate::distributor::FixReceiver;
use crate::gps::Fix;

pub struct ConsoleDisplay;

impl ConsoleDisplay {
    pub const NAME: &'static str = "console";

    pub fn new() -> Self {
        Self
    }

    pub async fn run(self, mut receiver: FixReceiver) {
        while let Some(fix) = receiver.recv().await {
            if !fix.is_valid() {
                log::warn!("Receiver flags this position as void ({})", fix.validity);
            }
            for line in summary_lines(&fix) {
                log::info!("{}", line);
            }
            if log::log_enabled!(log::Level::Trace) {
                match serde_json::to_string(&fix) {
                    Ok(json) => log::trace!("{}", json),
                    Err(e) => log::trace!("Fix not serializable: {}", e),
                }
            }
        }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn summary_lines(fix: &Fix) -> Vec<String> {
    let mut lines = vec![
        format!(
            "RMC Validity ({}), GGA GPS Quality Indicator ({}) {}/{}",
            fix.validity,
            fix.fix_description(),
            fix.satellites_in_use,
            fix.satellites_in_view
        ),
        format!(
            "RMC Date Time              {} {}",
            display_or_dash(fix.date),
            display_or_dash(fix.time)
        ),
        format!(
            "OS  DateTime(UTC)          {}",
            fix.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        format!("RMC Latitude,Longitude     {:.6},{:.6}", fix.latitude, fix.longitude),
        format!("RMC Speed, Course          {},{}", fix.speed, fix.course),
        format!("RMC Variation, GGA HDOP    {},{}", fix.variation, fix.hdop),
        format!("GGA Altitude               {}", fix.altitude),
    ];

    for (slot, sat) in fix.satellites.iter().enumerate() {
        lines.push(format!(
            "GSV PRN, SNR, Azimuth Sat({}) {},{},{}",
            slot, sat.prn, sat.snr, sat.azimuth
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::SatelliteObservation;
    use chrono::NaiveDate;

    #[test]
    fn test_summary_lines() {
        let mut fix = Fix {
            validity: "A".to_string(),
            fix_quality: 1,
            satellites_in_use: 8,
            satellites_in_view: 12,
            latitude: 48.1173,
            longitude: 11.516667,
            date: NaiveDate::from_ymd_opt(1994, 3, 23),
            ..Fix::default()
        };
        fix.satellites[1] = SatelliteObservation { prn: 2, snr: 41, azimuth: 308 };

        let lines = summary_lines(&fix);
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "RMC Validity (A), GGA GPS Quality Indicator (GPS) 8/12");
        assert!(lines[1].contains("1994-03-23 -"));
        assert!(lines[3].ends_with("48.117300,11.516667"));
        assert_eq!(lines[8], "GSV PRN, SNR, Azimuth Sat(1) 2,41,308");
    }
}
