//! Virtual 16x2 character LCD.
//!
//! Mirrors the I2C character display mounted above the keypad: two lines of
//! sixteen columns, text written from column 0 and cut at the edge. Used by
//! the tests and by the console binary, where every redraw is logged.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use smartlock_hardware::{DisplayDevice, VirtualLcd};
//!
//! let mut lcd = VirtualLcd::builder().with_idle_message("Enter PIN").build();
//! assert_eq!(lcd.line(0).unwrap().trim_end(), "Enter PIN");
//!
//! lcd.show("Access", "OPENED", Some(Duration::from_secs(2))).unwrap();
//! assert_eq!(lcd.line(1).unwrap().trim_end(), "OPENED");
//! assert!(!lcd.is_idle());
//! ```

use std::time::{Duration, Instant};

use smartlock_core::constants::{LCD_COLUMNS, LCD_LINES};
use tracing::debug;

use crate::error::{HardwareError, Result};
use crate::traits::DisplayDevice;

/// Virtual character display.
///
/// A screen shown with an auto-clear delay reverts to the idle message
/// the first time [`DisplayDevice::tick`] runs after the delay.
#[derive(Debug, Clone)]
pub struct VirtualLcd {
    /// Number of lines in the display.
    lines: usize,

    /// Number of columns per line.
    columns: usize,

    /// Current display buffer, each line padded to `columns`.
    buffer: Vec<String>,

    /// Message drawn on line 0 when the screen is idle.
    idle_message: String,

    /// When the current temporary screen expires.
    clear_at: Option<Instant>,
}

impl VirtualLcd {
    /// Create a display with the given geometry and idle message.
    pub fn new(lines: usize, columns: usize, idle_message: impl Into<String>) -> Self {
        let mut lcd = Self {
            lines,
            columns,
            buffer: vec![" ".repeat(columns); lines],
            idle_message: idle_message.into(),
            clear_at: None,
        };
        lcd.reset_to_idle();
        lcd
    }

    /// Create a builder for a display with custom configuration.
    pub fn builder() -> VirtualLcdBuilder {
        VirtualLcdBuilder::default()
    }

    /// Text on a line (0-based), padded to the column width.
    ///
    /// # Errors
    ///
    /// Returns an error if the line index is out of range.
    pub fn line(&self, line: usize) -> Result<&str> {
        self.check_line(line)?;
        Ok(&self.buffer[line])
    }

    /// All lines, top to bottom.
    pub fn lines(&self) -> Vec<&str> {
        self.buffer.iter().map(String::as_str).collect()
    }

    /// `true` when the idle message is showing and no temporary screen is
    /// pending.
    pub fn is_idle(&self) -> bool {
        let Some((first, rest)) = self.buffer.split_first() else {
            return self.clear_at.is_none();
        };
        self.clear_at.is_none()
            && first.trim_end() == truncate_text(&self.idle_message, self.columns)
            && rest.iter().all(|l| l.trim().is_empty())
    }

    /// Redraw the idle screen and drop any pending auto-clear.
    pub fn reset_to_idle(&mut self) {
        self.clear_at = None;
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
        if self.lines > 0 {
            self.buffer[0] = pad_text(&self.idle_message, self.columns);
        }
        self.render();
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line >= self.lines {
            return Err(HardwareError::invalid_data(format!(
                "Display line {line} out of range (max {})",
                self.lines.saturating_sub(1)
            )));
        }
        Ok(())
    }

    fn set(&mut self, line: usize, text: &str) -> Result<()> {
        self.check_line(line)?;
        self.buffer[line] = pad_text(&sanitize_text(text), self.columns);
        Ok(())
    }

    fn render(&self) {
        debug!(
            line1 = self.buffer.first().map(|l| l.trim_end()).unwrap_or(""),
            line2 = self.buffer.get(1).map(|l| l.trim_end()).unwrap_or(""),
            "LCD"
        );
    }
}

impl Default for VirtualLcd {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DisplayDevice for VirtualLcd {
    fn show(&mut self, line1: &str, line2: &str, auto_clear: Option<Duration>) -> Result<()> {
        self.set(0, line1)?;
        if self.lines > 1 {
            self.set(1, line2)?;
        }
        self.clear_at = auto_clear.map(|delay| Instant::now() + delay);
        self.render();
        Ok(())
    }

    fn write_line(&mut self, line: usize, text: &str) -> Result<()> {
        self.set(line, text)?;
        // Fresh input takes over the screen
        self.clear_at = None;
        self.render();
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
        self.clear_at = None;
        self.render();
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        if let Some(deadline) = self.clear_at
            && Instant::now() >= deadline
        {
            self.reset_to_idle();
        }
        Ok(())
    }
}

/// Builder for [`VirtualLcd`].
#[derive(Debug)]
pub struct VirtualLcdBuilder {
    lines: usize,
    columns: usize,
    idle_message: String,
}

impl VirtualLcdBuilder {
    /// Set the display size (lines and columns).
    pub fn with_size(mut self, lines: usize, columns: usize) -> Self {
        self.lines = lines;
        self.columns = columns;
        self
    }

    /// Set the message shown when idle.
    pub fn with_idle_message(mut self, message: impl Into<String>) -> Self {
        self.idle_message = message.into();
        self
    }

    pub fn build(self) -> VirtualLcd {
        VirtualLcd::new(self.lines, self.columns, self.idle_message)
    }
}

impl Default for VirtualLcdBuilder {
    fn default() -> Self {
        Self {
            lines: LCD_LINES,
            columns: LCD_COLUMNS,
            idle_message: String::new(),
        }
    }
}

/// Truncate text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use smartlock_hardware::display::truncate_text;
///
/// assert_eq!(truncate_text("Motion Detected!", 6), "Motion");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Truncate, then left-align within `width` columns.
fn pad_text(text: &str, width: usize) -> String {
    format!("{:<width$}", truncate_text(text, width))
}

/// The panel's character ROM only covers printable ASCII.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcd() -> VirtualLcd {
        VirtualLcd::builder().with_idle_message("Enter PIN").build()
    }

    #[test]
    fn test_starts_idle() {
        let lcd = lcd();
        assert!(lcd.is_idle());
        assert_eq!(lcd.line(0).unwrap(), "Enter PIN       ");
        assert_eq!(lcd.line(1).unwrap(), " ".repeat(16));
    }

    #[test]
    fn test_show_truncates_to_columns() {
        let mut lcd = lcd();
        lcd.show("A very long first line", "second", None).unwrap();

        assert_eq!(lcd.line(0).unwrap(), "A very long firs");
        assert_eq!(lcd.line(1).unwrap().trim_end(), "second");
        assert!(!lcd.is_idle());
    }

    #[test]
    fn test_write_line_keeps_other_line() {
        let mut lcd = lcd();
        lcd.write_line(1, "****").unwrap();

        assert_eq!(lcd.line(0).unwrap().trim_end(), "Enter PIN");
        assert_eq!(lcd.line(1).unwrap().trim_end(), "****");
    }

    #[test]
    fn test_write_line_out_of_range() {
        let mut lcd = lcd();
        assert!(lcd.write_line(2, "x").is_err());
        assert!(lcd.line(5).is_err());
    }

    #[test]
    fn test_auto_clear_reverts_to_idle() {
        let mut lcd = lcd();
        lcd.show("Access", "DENIED", Some(Duration::ZERO)).unwrap();
        assert!(!lcd.is_idle());

        lcd.tick().unwrap();
        assert!(lcd.is_idle());
    }

    #[test]
    fn test_tick_before_deadline_keeps_screen() {
        let mut lcd = lcd();
        lcd.show("Access", "OPENED", Some(Duration::from_secs(60)))
            .unwrap();

        lcd.tick().unwrap();
        assert_eq!(lcd.line(1).unwrap().trim_end(), "OPENED");
    }

    #[test]
    fn test_persistent_show_survives_tick() {
        let mut lcd = lcd();
        lcd.show("Door", "CLOSED", None).unwrap();

        lcd.tick().unwrap();
        assert_eq!(lcd.line(0).unwrap().trim_end(), "Door");
    }

    #[test]
    fn test_clear_blanks_everything() {
        let mut lcd = lcd();
        lcd.clear().unwrap();
        assert!(lcd.lines().iter().all(|l| l.trim().is_empty()));
    }

    #[test]
    fn test_non_ascii_is_replaced() {
        let mut lcd = lcd();
        lcd.show("Zámek", "", None).unwrap();
        assert_eq!(lcd.line(0).unwrap().trim_end(), "Z?mek");
    }
}
