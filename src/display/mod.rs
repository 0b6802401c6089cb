// src/display/mod.rs
//! Local presentation of fixes

pub mod console;
pub mod screen;
pub mod terminal;

use crate::error::Result;

pub use console::ConsoleDisplay;
pub use screen::ScreenDisplay;
pub use terminal::TerminalSink;

/// A character display that can show a line of text at a row/column.
/// Implemented by the terminal renderer, and by hardware drivers outside this crate.
pub trait DisplaySink {
    fn write_line(&mut self, row: u16, column: u16, text: &str) -> Result<()>;
}
