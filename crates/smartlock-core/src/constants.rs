//! Core constants for the smart lock access-control core.
//!
//! These values define the default lockout policy, keypad conventions and
//! the limits applied to access codes. Library configuration types
//! (`LockoutPolicy`, `KeypadConfig`) take their defaults from here, and the
//! binary may override the policy values through the environment.
//!
//! # Usage
//!
//! ```
//! use smartlock_core::constants::*;
//!
//! assert_eq!(DEFAULT_MAX_ATTEMPTS, 5);
//! assert_eq!(MASTER_OVERRIDE_PIN, "0000");
//!
//! use std::time::Duration;
//! let poll = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
//! assert_eq!(poll.as_millis(), 100);
//! ```

// ============================================================================
// Lockout Policy
// ============================================================================

/// Consecutive invalid codes that trigger a lockout.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Length of a lockout window, in seconds.
///
/// While the window is active every code, valid or not, is denied without
/// consulting the credential store.
pub const DEFAULT_LOCKOUT_SECS: i64 = 60;

// ============================================================================
// Access Codes
// ============================================================================

/// Longest accepted access code, in characters.
pub const MAX_CODE_LENGTH: usize = 32;

/// Keypad sequence that always forces the lock closed.
///
/// Entered as `0000#`. This bypasses credential validation and lockout
/// entirely and cannot be used to open the lock.
pub const MASTER_OVERRIDE_PIN: &str = "0000";

/// Default number of uses for a one-time code.
pub const DEFAULT_ONE_TIME_USES: u32 = 1;

/// Lower bound (inclusive) of generated one-time codes.
pub const ONE_TIME_CODE_MIN: u32 = 100_000;

/// Upper bound (inclusive) of generated one-time codes.
pub const ONE_TIME_CODE_MAX: u32 = 999_999;

// ============================================================================
// Keypad and Display
// ============================================================================

/// Keypad sampling interval in milliseconds (~10 samples per second).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// How long result screens (granted, denied, locked) stay up, in seconds.
pub const RESULT_DISPLAY_SECS: u64 = 2;

/// Character LCD geometry: 2 lines.
pub const LCD_LINES: usize = 2;

/// Character LCD geometry: 16 columns.
pub const LCD_COLUMNS: usize = 16;

/// Longest PIN buffered on the keypad before further keys are ignored.
pub const MAX_PIN_LENGTH: usize = LCD_COLUMNS;

// ============================================================================
// Motion Sensor
// ============================================================================

/// Minimum gap between two reported motion events, in milliseconds.
///
/// A PIR sensor keeps its output high for a while and retriggers; triggers
/// closer together than this are folded into one event.
pub const MOTION_COOLDOWN_MS: u64 = 2_000;
