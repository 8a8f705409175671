//! Texts shown on the 16x2 keypad display.
//!
//! Every screen is a pair of lines. Result screens stay up for the keypad's
//! result delay, then the display falls back to [`DisplayMessages::PROMPT`].
//!
//! ```
//! use smartlock_access::DisplayMessages;
//!
//! assert_eq!(DisplayMessages::ACCESS_OPENED, ("Access", "OPENED"));
//! assert_eq!(DisplayMessages::lockout_remaining(42), ("LOCKED", "42s".to_string()));
//! ```

use smartlock_core::constants::LCD_COLUMNS;

/// Display texts (ASCII only, at most 16 characters per line).
pub struct DisplayMessages;

impl DisplayMessages {
    /// Idle prompt on line 1.
    pub const PROMPT: &'static str = "Enter PIN";

    /// Valid code, lock opened.
    pub const ACCESS_OPENED: (&'static str, &'static str) = ("Access", "OPENED");

    /// Unknown code.
    pub const ACCESS_DENIED: (&'static str, &'static str) = ("Access", "DENIED");

    /// Master override sequence, lock closed.
    pub const ACCESS_LOCKED: (&'static str, &'static str) = ("Access", "LOCKED");

    /// `A` key.
    pub const MANUAL_OPEN: (&'static str, &'static str) = ("Manual", "OPEN");

    /// `B` key.
    pub const MANUAL_CLOSE: (&'static str, &'static str) = ("Manual", "CLOSE");

    /// Header of the lockout screen.
    pub const LOCKED_OUT: &'static str = "LOCKED";

    /// Lockout screen with whole seconds left, e.g. `LOCKED` / `42s`.
    pub fn lockout_remaining(seconds: i64) -> (&'static str, String) {
        (Self::LOCKED_OUT, format!("{}s", seconds.max(0)))
    }

    /// Masked echo of `len` typed characters.
    pub fn masked_input(len: usize) -> String {
        "*".repeat(len.min(LCD_COLUMNS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_fit_display() {
        let screens = [
            DisplayMessages::ACCESS_OPENED,
            DisplayMessages::ACCESS_DENIED,
            DisplayMessages::ACCESS_LOCKED,
            DisplayMessages::MANUAL_OPEN,
            DisplayMessages::MANUAL_CLOSE,
        ];

        assert!(DisplayMessages::PROMPT.len() <= LCD_COLUMNS);
        for (line1, line2) in screens {
            assert!(!line1.is_empty() && line1.len() <= LCD_COLUMNS);
            assert!(!line2.is_empty() && line2.len() <= LCD_COLUMNS);
            assert!(line1.is_ascii() && line2.is_ascii());
        }
    }

    #[test]
    fn test_masked_input_capped() {
        assert_eq!(DisplayMessages::masked_input(4), "****");
        assert_eq!(DisplayMessages::masked_input(40).len(), LCD_COLUMNS);
    }

    #[test]
    fn test_lockout_never_negative() {
        assert_eq!(DisplayMessages::lockout_remaining(-3).1, "0s");
    }
}
