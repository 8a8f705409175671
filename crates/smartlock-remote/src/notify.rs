//! Notification side of the event bridge.
//!
//! [`run_notifier`] is the single consumer of the bridge. For every event it
//! runs the registered [`EventHook`]s, renders one line of text and hands it
//! to the [`NotificationChannel`]. A failing hook or delivery is logged and
//! skipped; the loop only ends when every producer is gone.

#![allow(async_fn_in_trait)]

use smartlock_core::{DomainEvent, EventReceiver, mask_code};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Outgoing transport to the operator (chat, console, ...).
pub trait NotificationChannel: Send {
    /// Deliver one message to the operator.
    async fn deliver(&mut self, text: &str) -> Result<()>;
}

/// Consumer-side reaction to an event, run before the notification is sent.
///
/// Hooks run on the notifier task; keep them short.
pub trait EventHook: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn on_event(&mut self, event: &DomainEvent) -> Result<()>;
}

/// Hook writing every event to the log at `info` level.
#[derive(Debug, Default)]
pub struct TracingHook;

impl EventHook for TracingHook {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_event(&mut self, event: &DomainEvent) -> Result<()> {
        info!(event = event.name(), "{}", render(event));
        Ok(())
    }
}

/// Human-readable, single-line text for an event.
///
/// Codes from failed attempts are masked.
///
/// # Examples
///
/// ```
/// use smartlock_core::DomainEvent;
/// use smartlock_remote::render;
///
/// let text = render(&DomainEvent::AccessDenied { attempted_code: "1234".into() });
/// assert_eq!(text, "Wrong code entered on the keypad: ****");
/// ```
pub fn render(event: &DomainEvent) -> String {
    match event {
        DomainEvent::AccessGranted { kind, .. } => {
            format!("Access granted with a {kind} code.")
        }
        DomainEvent::AccessDenied { attempted_code } => {
            format!(
                "Wrong code entered on the keypad: {}",
                mask_code(attempted_code)
            )
        }
        DomainEvent::LockedOut { duration } => format!(
            "Too many failed attempts. Keypad locked for {} seconds.",
            duration.num_seconds()
        ),
        DomainEvent::LockOpened { reason } => format!("Door opened ({reason})."),
        DomainEvent::LockClosed { reason } => format!("Door closed ({reason})."),
        DomainEvent::OneTimeCodeConsumed { code } => {
            format!("One-time code {code} was used.")
        }
        DomainEvent::MotionDetected => "Motion detected!".to_string(),
        DomainEvent::PersistenceFailed { error } => {
            format!("Warning: code change not saved ({error}). It will be lost on restart.")
        }
    }
}

/// Counters returned when the notifier stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierStats {
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub failed_hooks: usize,
}

/// Drain the bridge until every sender is dropped.
pub async fn run_notifier<C>(
    mut events: EventReceiver,
    mut channel: C,
    mut hooks: Vec<Box<dyn EventHook>>,
) -> NotifierStats
where
    C: NotificationChannel,
{
    let mut stats = NotifierStats::default();
    info!(hooks = hooks.len(), "Notifier started");

    while let Some(event) = events.recv().await {
        debug!(event = event.name(), "Event drained");

        for hook in hooks.iter_mut() {
            if let Err(e) = hook.on_event(&event) {
                stats.failed_hooks += 1;
                warn!(hook = hook.name(), event = event.name(), error = %e, "Event hook failed");
            }
        }

        let text = render(&event);
        match channel.deliver(&text).await {
            Ok(()) => stats.delivered += 1,
            Err(e) => {
                stats.failed_deliveries += 1;
                warn!(event = event.name(), error = %e, "Notification not delivered");
            }
        }
    }

    info!(
        delivered = stats.delivered,
        failed = stats.failed_deliveries,
        "Notifier stopped"
    );
    stats
}
