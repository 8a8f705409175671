//! Access control core for a single smart lock.
//!
//! - [`LockoutGuard`] - consecutive-failure counter with a lockout window
//! - [`AccessControlEngine`] - lockout check, then credential lookup, as one
//!   atomic decision
//! - [`LockStateMachine`] - OPEN/CLOSED with relay actuation
//! - [`AppContext`] - the shared handles passed to every input path
//! - [`run_keypad_loop`] - PIN entry on the blocking keypad thread
//! - [`spawn_motion_monitor`] - motion sensor thread
//!
//! Every outcome is published on the event bridge; nothing here talks to
//! the operator directly.
//!
//! # Lock Ordering
//!
//! The engine takes the lockout mutex, then the credential store mutex.
//! The lock state machine's mutex is never held together with either.

pub mod context;
pub mod engine;
pub mod keypad;
pub mod lock;
pub mod lockout;
pub mod messages;
pub mod motion;

pub use context::AppContext;
pub use engine::{AccessControlEngine, DenialReason, ValidationResult};
pub use keypad::{KeyOutcome, KeypadConfig, KeypadController, run_keypad_loop};
pub use lock::{LockSnapshot, LockStateMachine, LockTransition, MAX_HISTORY_SIZE};
pub use lockout::{LockoutGuard, LockoutOutcome, LockoutPolicy};
pub use messages::DisplayMessages;
pub use motion::{default_motion_cooldown, spawn_motion_monitor};
