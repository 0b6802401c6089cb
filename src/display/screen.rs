// src/display/screen.rs
//! Device screen consumer: LCD (20x4 character) and OLED layouts
//!
//! Rendering is best effort. A sink error is logged and the next fix is drawn
//! as usual.

use super::DisplaySink;
use crate::distributor::FixReceiver;
use crate::gps::Fix;

/// Row 0 of the LCD belongs to the rest of the device UI
pub const LCD_FIRST_ROW: u16 = 1;
pub const OLED_FIRST_ROW: u16 = 4;
pub const OLED_COLUMN: u16 = 1;

type BoxedSink = Box<dyn DisplaySink + Send>;

#[derive(Default)]
pub struct ScreenDisplay {
    lcd: Option<BoxedSink>,
    oled: Option<BoxedSink>,
}

pub fn status_line(fix: &Fix) -> String {
    format!("GPS OK {}", fix.acquired_at.format("%H:%M:%S"))
}

/// LCD rows 1..=3
pub fn lcd_rows(fix: &Fix) -> [String; 3] {
    [
        status_line(fix),
        format!("lat:{:.6}", fix.latitude),
        format!("lon:{:.6} s:{:.2}", fix.longitude, fix.speed_kmh()),
    ]
}

/// OLED rows 4..=7
pub fn oled_rows(fix: &Fix) -> [String; 4] {
    [
        status_line(fix),
        format!("lat: {:.6}", fix.latitude),
        format!("lon: {:.6}", fix.longitude),
        format!("sp: {:.2}", fix.speed_kmh()),
    ]
}

impl ScreenDisplay {
    pub const NAME: &'static str = "screen";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lcd(mut self, sink: impl DisplaySink + Send + 'static) -> Self {
        self.lcd = Some(Box::new(sink));
        self
    }

    pub fn with_oled(mut self, sink: impl DisplaySink + Send + 'static) -> Self {
        self.oled = Some(Box::new(sink));
        self
    }

    pub fn render(&mut self, fix: &Fix) {
        log::info!(
            "Device Screen Latitude : {:.6} Longitude : {:.6}",
            fix.latitude,
            fix.longitude
        );

        if let Some(lcd) = self.lcd.as_mut() {
            for (row, text) in (LCD_FIRST_ROW..).zip(lcd_rows(fix).iter()) {
                if let Err(e) = lcd.write_line(row, 0, text) {
                    log::warn!("LCD render failed: {}", e);
                    break;
                }
            }
        }

        if let Some(oled) = self.oled.as_mut() {
            for (row, text) in (OLED_FIRST_ROW..).zip(oled_rows(fix).iter()) {
                if let Err(e) = oled.write_line(row, OLED_COLUMN, text) {
                    log::warn!("OLED render failed: {}", e);
                    break;
                }
            }
        }
    }

    pub async fn run(mut self, mut receiver: FixReceiver) {
        while let Some(fix) = receiver.recv().await {
            self.render(&fix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TrackerError};
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    type Lines = Arc<Mutex<Vec<(u16, u16, String)>>>;

    struct RecordingSink {
        lines: Lines,
    }

    impl DisplaySink for RecordingSink {
        fn write_line(&mut self, row: u16, column: u16, text: &str) -> Result<()> {
            self.lines.lock().unwrap().push((row, column, text.to_string()));
            Ok(())
        }
    }

    struct BrokenSink;

    impl DisplaySink for BrokenSink {
        fn write_line(&mut self, _row: u16, _column: u16, _text: &str) -> Result<()> {
            Err(TrackerError::Other("display not connected".to_string()))
        }
    }

    fn sample_fix() -> Fix {
        Fix {
            acquired_at: Utc.with_ymd_and_hms(2024, 3, 7, 18, 4, 9).unwrap(),
            latitude: 48.1173,
            longitude: 11.516667,
            speed: 10.0,
            ..Fix::default()
        }
    }

    #[test]
    fn test_layouts() {
        let fix = sample_fix();
        assert_eq!(
            lcd_rows(&fix),
            [
                "GPS OK 18:04:09".to_string(),
                "lat:48.117300".to_string(),
                "lon:11.516667 s:18.52".to_string(),
            ]
        );
        assert_eq!(oled_rows(&fix)[3], "sp: 18.52");
    }

    #[test]
    fn test_render_to_both_sinks() {
        let lcd: Lines = Arc::default();
        let oled: Lines = Arc::default();
        let mut screen = ScreenDisplay::new()
            .with_lcd(RecordingSink { lines: lcd.clone() })
            .with_oled(RecordingSink { lines: oled.clone() });

        screen.render(&sample_fix());

        let lcd = lcd.lock().unwrap();
        assert_eq!(lcd.len(), 3);
        assert_eq!(lcd[0], (1, 0, "GPS OK 18:04:09".to_string()));

        let oled = oled.lock().unwrap();
        assert_eq!(oled.len(), 4);
        assert_eq!(oled[0].0, 4);
        assert_eq!(oled[3], (7, 1, "sp: 18.52".to_string()));
    }

    #[test]
    fn test_render_failure_is_not_propagated() {
        let oled: Lines = Arc::default();
        let mut screen = ScreenDisplay::new()
            .with_lcd(BrokenSink)
            .with_oled(RecordingSink { lines: oled.clone() });

        screen.render(&sample_fix());
        screen.render(&sample_fix());
        assert_eq!(oled.lock().unwrap().len(), 8);
    }
}
