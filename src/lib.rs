// src/lib.rs
//! GNSS Tracker Library
//!
//! Reads NMEA sentences from a serial GNSS receiver, assembles one fix per
//! acquisition cycle and hands each fix to the local displays and to the
//! Traccar forwarders (OsmAnd, T55 and OpenGTS).

pub mod config;
pub mod display;
pub mod distributor;
pub mod error;
pub mod gps;
pub mod monitor;
pub mod traccar;
pub mod transport;

// Re-export main types for convenience
pub use config::TrackerConfig;
pub use distributor::{Distributor, FixReceiver};
pub use error::{Result, TrackerError};
pub use gps::{Fix, FixAssembler};
pub use monitor::{run_acquisition, TrackerMonitor};
