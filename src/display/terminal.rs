// src/display/terminal.rs
//! Terminal stand-in for a character display, drawn with crossterm

use super::DisplaySink;
use crate::error::Result;
use crossterm::{
    cursor::{MoveTo, RestorePosition, SavePosition},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

/// Widest line a 20x4 LCD or 128x64 OLED can show
pub const MAX_COLUMNS: usize = 21;

pub struct TerminalSink<W: Write> {
    out: W,
    origin_row: u16,
    color: Color,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(origin_row: u16, color: Color) -> Self {
        Self::new(io::stdout(), origin_row, color)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, origin_row: u16, color: Color) -> Self {
        Self {
            out,
            origin_row,
            color,
        }
    }

    /// Draw a titled separator above the display area
    pub fn draw_header(&mut self, title: &str) -> Result<()> {
        queue!(
            self.out,
            MoveTo(0, self.origin_row.saturating_sub(1)),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Green),
            Print(format!("{:=<width$}", format!("= {} ", title), width = MAX_COLUMNS + 2)),
            ResetColor
        )?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn write_line(&mut self, row: u16, column: u16, text: &str) -> Result<()> {
        let text: String = text.chars().take(MAX_COLUMNS).collect();
        queue!(
            self.out,
            SavePosition,
            MoveTo(column, self.origin_row + row),
            Clear(ClearType::UntilNewLine),
            SetForegroundColor(self.color),
            Print(text),
            ResetColor,
            RestorePosition
        )?;
        self.out.flush()?;
        Ok(())
    }
}
