//! Mock keypad implementation for testing and development.
//!
//! Key presses are queued through a [`MockKeypadHandle`] and handed out one
//! per poll, exactly like a debounced matrix scan would.

use crate::{
    HardwareError, Result,
    traits::{Key, KeypadDevice},
};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Mock keypad device for testing and development.
///
/// # Examples
///
/// ```
/// use smartlock_hardware::mock::MockKeypad;
/// use smartlock_hardware::{Key, KeypadDevice};
///
/// let (mut keypad, handle) = MockKeypad::new();
/// handle.press(Key::A).unwrap();
///
/// assert_eq!(keypad.poll_key().unwrap(), Some(Key::A));
/// assert_eq!(keypad.poll_key().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated key presses
    input_rx: mpsc::UnboundedReceiver<Key>,
}

impl MockKeypad {
    /// Create a new mock keypad.
    ///
    /// Returns the keypad together with the handle used to press its keys.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        (Self { input_rx }, MockKeypadHandle { input_tx })
    }
}

impl KeypadDevice for MockKeypad {
    fn poll_key(&mut self) -> Result<Option<Key>> {
        match self.input_rx.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("Keypad input channel closed"))
            }
        }
    }
}

/// Handle for pressing keys on a [`MockKeypad`].
///
/// Cloneable; usable from sync and async code alike.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated key presses
    input_tx: mpsc::UnboundedSender<Key>,
}

impl MockKeypadHandle {
    /// Press a single key.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub fn press(&self, key: Key) -> Result<()> {
        self.input_tx
            .send(key)
            .map_err(|_| HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Press every key named in `keys`, in order.
    ///
    /// Whitespace is skipped, so `"1234 #"` is fine.
    ///
    /// # Errors
    ///
    /// Returns an error on a character that is not a keypad legend, or if
    /// the keypad has been dropped. Keys before the bad character have
    /// already been pressed.
    pub fn press_str(&self, keys: &str) -> Result<()> {
        for c in keys.chars().filter(|c| !c.is_whitespace()) {
            self.press(Key::from_char(c)?)?;
        }
        Ok(())
    }

    /// Enter a complete PIN followed by `#`.
    ///
    /// # Errors
    ///
    /// Same as [`MockKeypadHandle::press_str`].
    pub fn send_pin(&self, pin: &str) -> Result<()> {
        self.press_str(pin)?;
        self.press(Key::Hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_empty_returns_none() {
        let (mut keypad, _handle) = MockKeypad::new();
        assert_eq!(keypad.poll_key().unwrap(), None);
    }

    #[test]
    fn test_send_pin_appends_hash() {
        let (mut keypad, handle) = MockKeypad::new();
        handle.send_pin("42").unwrap();

        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(4)));
        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(2)));
        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Hash));
    }

    #[test]
    fn test_press_str_rejects_unknown_key() {
        let (_keypad, handle) = MockKeypad::new();
        assert!(handle.press_str("12x").is_err());
    }

    #[test]
    fn test_handle_clone_shares_queue() {
        let (mut keypad, handle) = MockKeypad::new();
        let other = handle.clone();

        handle.press(Key::Digit(1)).unwrap();
        other.press(Key::Digit(2)).unwrap();

        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(1)));
        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(2)));
    }

    #[test]
    fn test_closed_channel_reports_disconnect() {
        let (mut keypad, handle) = MockKeypad::new();
        drop(handle);

        assert!(matches!(
            keypad.poll_key(),
            Err(HardwareError::Disconnected { .. })
        ));
    }

    #[test]
    fn test_press_after_keypad_dropped() {
        let (keypad, handle) = MockKeypad::new();
        drop(keypad);

        assert!(handle.press(Key::Star).is_err());
    }
}
