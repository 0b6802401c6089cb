// src/monitor.rs
//! Pipeline coordination: consumers, transport and the acquisition loop

use crate::{
    config::TrackerConfig,
    display::{ConsoleDisplay, ScreenDisplay, TerminalSink},
    distributor::Distributor,
    error::{Result, TrackerError},
    gps::FixAssembler,
    traccar::{OpenGtsClient, OsmAndClient, T55Client},
    transport::TransportSession,
};
use crossterm::style::Color;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt},
    task::JoinHandle,
};

/// Longest line kept from the receiver; NMEA sentences are at most 82 bytes
pub const MAX_LINE_LENGTH: usize = 4096;

/// Terminal row where the LCD stand-in starts; the OLED rows follow below it
const SCREEN_ORIGIN_ROW: u16 = 1;

/// Coordinates acquisition and distribution for one receiver
pub struct TrackerMonitor {
    config: TrackerConfig,
    screen: Option<ScreenDisplay>,
}

impl TrackerMonitor {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            screen: None,
        }
    }

    /// Render the screen consumer to these sinks instead of the terminal
    pub fn with_screen(mut self, screen: ScreenDisplay) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Validate settings, start the consumers, open the port and run the
    /// acquisition loop until the stream ends. Returns the number of fixes
    /// published.
    pub async fn start(mut self) -> Result<u64> {
        let gnss = &self.config.gnss;
        if !gnss.enabled {
            return Err(TrackerError::Config("gnss not enabled".to_string()));
        }
        let settings = gnss.serial_settings()?;
        let assembler = FixAssembler::new(gnss.min_satellites_in_view);

        let mut distributor = Distributor::default();
        let consumers = self.spawn_consumers(&mut distributor);
        log::info!(
            "{} consumer(s) registered: {}",
            consumers.len(),
            distributor.consumer_names().join(", ")
        );

        let session = TransportSession::open(&settings).await?;
        let reader = session.reader()?;

        run_acquisition(reader, assembler, distributor).await
    }

    /// Register and spawn every enabled consumer. A consumer whose settings
    /// are invalid is reported once and left out.
    pub fn spawn_consumers(&mut self, distributor: &mut Distributor) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        let display = self.config.display.clone();
        let traccar = self.config.traccar.clone();

        if display.console {
            let receiver = distributor.register(ConsoleDisplay::NAME);
            handles.push(tokio::spawn(ConsoleDisplay::new().run(receiver)));
        }

        if display.screen {
            let screen = self.screen.take().unwrap_or_else(|| terminal_screen(display.lcd, display.oled));
            let receiver = distributor.register(ScreenDisplay::NAME);
            handles.push(tokio::spawn(screen.run(receiver)));
        }

        if traccar.osmand.enabled {
            match traccar
                .osmand_endpoint()
                .and_then(|endpoint| OsmAndClient::new(endpoint, traccar.retry.clone()))
            {
                Ok(client) => {
                    let receiver = distributor.register(OsmAndClient::NAME);
                    handles.push(tokio::spawn(client.run(receiver)));
                }
                Err(e) => log::error!("OsmAnd forwarding disabled: {}", e),
            }
        }

        if traccar.t55.enabled {
            match traccar.t55_endpoint() {
                Ok(endpoint) => {
                    let client = T55Client::new(endpoint, traccar.retry.clone());
                    let receiver = distributor.register(T55Client::NAME);
                    handles.push(tokio::spawn(client.run(receiver)));
                }
                Err(e) => log::error!("T55 forwarding disabled: {}", e),
            }
        }

        if traccar.opengts.enabled {
            match traccar
                .opengts_endpoint()
                .and_then(|endpoint| OpenGtsClient::new(endpoint, traccar.retry.clone()))
            {
                Ok(client) => {
                    let receiver = distributor.register(OpenGtsClient::NAME);
                    handles.push(tokio::spawn(client.run(receiver)));
                }
                Err(e) => log::error!("OpenGTS forwarding disabled: {}", e),
            }
        }

        handles
    }
}

fn terminal_screen(lcd: bool, oled: bool) -> ScreenDisplay {
    let mut screen = ScreenDisplay::new();
    let title = match (lcd, oled) {
        (true, true) => "LCD / OLED",
        (true, false) => "LCD",
        (false, true) => "OLED",
        (false, false) => {
            log::warn!("Screen enabled without an LCD or OLED; nothing will be drawn");
            return screen;
        }
    };

    let mut header = TerminalSink::stdout(SCREEN_ORIGIN_ROW, Color::Green);
    if let Err(e) = header.draw_header(title) {
        log::warn!("Cannot draw screen frame: {}", e);
    }

    // Both layouts share one origin; LCD rows and OLED rows do not overlap
    if lcd {
        screen = screen.with_lcd(TerminalSink::stdout(SCREEN_ORIGIN_ROW, Color::Cyan));
    }
    if oled {
        screen = screen.with_oled(TerminalSink::stdout(SCREEN_ORIGIN_ROW, Color::Yellow));
    }
    screen
}

/// Read lines, assemble fixes and publish each completed one. Runs until the
/// reader reaches end of stream; a read error ends it with a transport error.
/// A cycle still open at the end is dropped.
pub async fn run_acquisition<R>(
    mut reader: R,
    mut assembler: FixAssembler,
    mut distributor: Distributor,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut published = 0;
    let mut buf = Vec::new();
    let mut discarding = false;

    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_LINE_LENGTH as u64)
            .read_until(b'\n', &mut buf)
            .await;
        match read {
            Ok(0) => break, // EOF
            Ok(_) => {
                let complete = buf.ends_with(b"\n");
                if discarding {
                    // Rest of an overlong line
                    discarding = !complete;
                    continue;
                }
                if !complete && buf.len() >= MAX_LINE_LENGTH {
                    log::debug!("Dropping line longer than {} bytes", MAX_LINE_LENGTH);
                    discarding = true;
                    continue;
                }

                let line = String::from_utf8_lossy(&buf);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(fix) = assembler.process(line) {
                    let delivered = distributor.publish(&fix).await;
                    log::debug!("Fix delivered to {} consumer(s)", delivered);
                    published += 1;
                }
            }
            Err(e) => {
                return Err(TrackerError::Transport(format!(
                    "Error reading from serial port: {}",
                    e
                )));
            }
        }
    }

    if assembler.session().position_seen || assembler.session().fix_seen {
        log::debug!("Stream ended mid-cycle, discarding partial fix");
    }
    log::info!("Receiver stream ended after {} fix(es)", published);
    Ok(published)
}
