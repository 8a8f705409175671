//! Remote operator interface for the smart lock.
//!
//! - [`RemoteCommand`] - parsing of slash commands and menu buttons
//! - [`CommandDispatcher`] - single-operator authorization and execution
//! - [`run_notifier`] - drains the event bridge into a [`NotificationChannel`]
//!
//! The chat transport itself is not part of this crate; anything able to
//! deliver text and hand over incoming messages can drive it.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod notify;

pub use command::{MENU_BUTTONS, RemoteCommand};
pub use dispatcher::CommandDispatcher;
pub use error::{RemoteError, Result};
pub use notify::{EventHook, NotificationChannel, NotifierStats, TracingHook, render, run_notifier};
