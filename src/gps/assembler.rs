// src/gps/assembler.rs
//! Assembles one fix per acquisition cycle from RMC, GGA and GSV sentences.
//!
//! Each sentence family latches on its first accepted sentence; later sentences
//! of the same family are ignored until the cycle completes and the session is
//! reset. A cycle completes once all three families have latched.

use super::data::{Fix, SatelliteObservation, SATELLITE_SLOTS};
use super::nmea::{self, GgaData, GsvData, RmcData, Sentence};
use chrono::Utc;

/// Default number of tracked satellites a GSV sentence must report
pub const DEFAULT_MIN_SATELLITES_IN_VIEW: usize = 4;

/// Latch state and the fix being filled in for the current cycle
#[derive(Debug, Clone, Default)]
pub struct AcquisitionSession {
    pub position_seen: bool,
    pub fix_seen: bool,
    pub satellites_seen: bool,
    pub fix: Fix,
}

impl AcquisitionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.position_seen && self.fix_seen && self.satellites_seen
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply one decoded sentence. Returns true if the sentence was accepted.
    pub fn apply(&mut self, sentence: &Sentence, min_satellites_in_view: usize) -> bool {
        match sentence {
            Sentence::Rmc(rmc) => self.apply_position(rmc),
            Sentence::Gga(gga) => self.apply_fix_quality(gga),
            Sentence::Gsv(gsv) => self.apply_satellites(gsv, min_satellites_in_view),
        }
    }

    fn apply_position(&mut self, rmc: &RmcData) -> bool {
        if self.position_seen || rmc.latitude == 0.0 || rmc.longitude == 0.0 {
            return false;
        }

        self.position_seen = true;
        let fix = &mut self.fix;
        fix.acquired_at = Utc::now();
        fix.date = rmc.date;
        fix.time = rmc.time;
        fix.validity = rmc.validity.clone();
        fix.latitude = rmc.latitude;
        fix.longitude = rmc.longitude;
        fix.speed = rmc.speed;
        fix.course = rmc.course;
        fix.variation = rmc.variation;
        fix.raw_position = rmc.raw.clone();
        true
    }

    fn apply_fix_quality(&mut self, gga: &GgaData) -> bool {
        if self.fix_seen || gga.latitude == 0.0 || gga.longitude == 0.0 {
            return false;
        }

        self.fix_seen = true;
        let fix = &mut self.fix;
        fix.fix_quality = gga.fix_quality;
        fix.satellites_in_use = gga.satellites;
        fix.hdop = gga.hdop;
        fix.altitude = gga.altitude;
        true
    }

    fn apply_satellites(&mut self, gsv: &GsvData, min_satellites_in_view: usize) -> bool {
        let threshold = min_satellites_in_view.clamp(1, SATELLITE_SLOTS) - 1;
        let mut accepted = false;

        for (slot, sat) in gsv.info.iter().take(SATELLITE_SLOTS).enumerate() {
            if sat.snr == 0 || self.satellites_seen {
                continue;
            }

            self.fix.satellites[slot] = SatelliteObservation {
                prn: sat.prn,
                snr: sat.snr,
                azimuth: sat.azimuth,
            };
            accepted = true;

            if slot >= threshold {
                self.satellites_seen = true;
                self.fix.satellites_in_view = gsv.satellites_in_view;
            }
        }

        accepted
    }
}

/// Feeds raw lines through the decoder into an [`AcquisitionSession`]
#[derive(Debug)]
pub struct FixAssembler {
    session: AcquisitionSession,
    min_satellites_in_view: usize,
}

impl FixAssembler {
    pub fn new(min_satellites_in_view: usize) -> Self {
        Self {
            session: AcquisitionSession::new(),
            min_satellites_in_view,
        }
    }

    /// Process one line. Returns the completed fix when this line closes the
    /// cycle; the session is reset before returning.
    pub fn process(&mut self, line: &str) -> Option<Fix> {
        let sentence = match nmea::decode(line) {
            Ok(sentence) => sentence,
            Err(e) => {
                log::debug!("Dropping sentence {:?}: {}", line.trim(), e);
                return None;
            }
        };

        if !self.session.apply(&sentence, self.min_satellites_in_view) {
            log::trace!("{} sentence ignored for this cycle", sentence.kind());
            return None;
        }

        if !self.cycle_complete() {
            return None;
        }

        let fix = std::mem::take(&mut self.session.fix);
        self.reset();
        Some(fix)
    }

    pub fn cycle_complete(&self) -> bool {
        self.session.is_complete()
    }

    pub fn session(&self) -> &AcquisitionSession {
        &self.session
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }
}

impl Default for FixAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SATELLITES_IN_VIEW)
    }
}
