//! Mock device implementations for testing and development.
//!
//! Each mock comes paired with a handle that tests (or the console binary)
//! use to drive it: pressing keys, triggering motion, or inspecting what the
//! relay was told to do.

pub mod keypad;
pub mod motion;
pub mod relay;

pub use keypad::{MockKeypad, MockKeypadHandle};
pub use motion::{MockMotionSensor, MockMotionSensorHandle};
pub use relay::{MockRelay, MockRelayHandle};
