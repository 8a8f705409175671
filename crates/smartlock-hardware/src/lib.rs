//! Hardware abstraction layer for the smart lock.
//!
//! This crate defines the blocking device traits the access core drives
//! ([`KeypadDevice`], [`DisplayDevice`], [`LockActuator`], [`MotionSensor`]),
//! a [`VirtualLcd`] that emulates the 16x2 character display, and mock
//! devices for tests and console runs.
//!
//! Real GPIO drivers live outside this workspace; they only need to
//! implement the traits.
//!
//! # Example
//!
//! ```
//! use smartlock_hardware::{Key, KeypadDevice, mock::MockKeypad};
//!
//! let (mut keypad, handle) = MockKeypad::new();
//! handle.press_str("12#").unwrap();
//!
//! assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(1)));
//! assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(2)));
//! assert_eq!(keypad.poll_key().unwrap(), Some(Key::Hash));
//! assert_eq!(keypad.poll_key().unwrap(), None);
//! ```

pub mod display;
pub mod error;
pub mod mock;
pub mod traits;

pub use display::{VirtualLcd, VirtualLcdBuilder};
pub use error::{HardwareError, Result};
pub use traits::{DisplayDevice, Key, KeypadDevice, LockActuator, MotionSensor};
