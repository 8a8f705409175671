//! Hardware device trait definitions.
//!
//! These traits are the contract between the access core and the lock's
//! peripherals: a 4x4 matrix keypad, a 16x2 character display, a relay
//! driving the lock bolt and a PIR motion sensor.
//!
//! Unlike most of the workspace these traits are **blocking**. The keypad
//! loop runs on a dedicated OS thread and is allowed to wait on physical
//! I/O timing; it only talks to the async side through the event bridge.
//! All traits are object-safe and `Send`, so devices can be moved into that
//! thread as `Box<dyn Trait>`.

use std::fmt;
use std::time::Duration;

use crate::error::{HardwareError, Result};

/// A single debounced key press from the 4x4 keypad.
///
/// Layout:
///
/// ```text
/// 1 2 3 A
/// 4 5 6 B
/// 7 8 9 C
/// * 0 # D
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),
    A,
    B,
    C,
    D,
    /// Star key (*).
    Star,
    /// Hash/pound key (#).
    Hash,
}

impl Key {
    /// Create a digit key.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartlock_hardware::Key;
    ///
    /// assert_eq!(Key::digit(5).unwrap().as_digit(), Some(5));
    /// assert!(Key::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {d}"
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Map a keypad legend character to a key.
    ///
    /// Letters are accepted in either case.
    ///
    /// # Errors
    ///
    /// Returns an error for characters that are not on the keypad.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartlock_hardware::Key;
    ///
    /// assert_eq!(Key::from_char('#').unwrap(), Key::Hash);
    /// assert_eq!(Key::from_char('b').unwrap(), Key::B);
    /// assert!(Key::from_char('x').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            d @ '0'..='9' => Ok(Self::Digit(d as u8 - b'0')),
            'A' => Ok(Self::A),
            'B' => Ok(Self::B),
            'C' => Ok(Self::C),
            'D' => Ok(Self::D),
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            other => Err(HardwareError::invalid_data(format!(
                "Not a keypad key: {other:?}"
            ))),
        }
    }

    /// The legend printed on the key.
    pub fn as_char(self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::Star => '*',
            Self::Hash => '#',
        }
    }

    /// Check if this key is a digit.
    pub fn is_digit(&self) -> bool {
        matches!(self, Self::Digit(_))
    }

    /// Get the digit value if this is a digit key.
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Keypad device abstraction.
///
/// Debouncing is the driver's job: each physical press is reported exactly
/// once, with no repeats while the key is held.
pub trait KeypadDevice: Send {
    /// Return the next pending key press, if any.
    ///
    /// Returns `Ok(None)` when no key has been pressed since the last poll.
    /// May block briefly while the driver scans the matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or unreadable.
    fn poll_key(&mut self) -> Result<Option<Key>>;
}

/// Character display abstraction.
///
/// Purely a sink: nothing the display does feeds back into the core.
pub trait DisplayDevice: Send {
    /// Replace the whole screen with two lines of text.
    ///
    /// With `auto_clear` set, the screen reverts on its own once the delay
    /// has passed (see [`DisplayDevice::tick`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be written.
    fn show(&mut self, line1: &str, line2: &str, auto_clear: Option<Duration>) -> Result<()>;

    /// Overwrite a single line (0-based), leaving the other untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the line index is out of range or the display
    /// cannot be written.
    fn write_line(&mut self, line: usize, text: &str) -> Result<()>;

    /// Blank the screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be written.
    fn clear(&mut self) -> Result<()>;

    /// Advance display timers; called once per keypad poll.
    ///
    /// Displays that clear themselves in hardware can keep the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be written.
    fn tick(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Relay driving the lock bolt.
///
/// Energising the relay (`on`) engages the bolt; releasing it (`off`)
/// frees the door.
pub trait LockActuator: Send {
    /// Energise the relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    fn on(&mut self) -> Result<()>;

    /// Release the relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    fn off(&mut self) -> Result<()>;
}

/// Motion sensor abstraction.
pub trait MotionSensor: Send {
    /// Block until the sensor reports motion.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor is disconnected.
    fn wait_for_motion(&mut self) -> Result<()>;
}
