// src/gps/mod.rs
//! NMEA decoding and fix assembly

pub mod assembler;
pub mod data;
pub mod nmea;

pub use assembler::{AcquisitionSession, FixAssembler};
pub use data::{Fix, SatelliteObservation};
