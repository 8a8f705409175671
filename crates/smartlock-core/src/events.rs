//! Domain events and the bridge that carries them to the notifier.
//!
//! Producers live on the synchronous side (keypad thread, motion thread,
//! lock transitions) and must never block; the single consumer is an async
//! task that drains the bridge and forwards each event to the notification
//! channel.
//!
//! ```text
//! ┌──────────────┐
//! │ Keypad loop  │──┐
//! └──────────────┘  │    ┌──────────────────┐
//! ┌──────────────┐  ├───►│   EventBridge    │───► Notifier task
//! │ Motion loop  │──┤    │ (unbounded FIFO) │
//! └──────────────┘  │    └──────────────────┘
//! ┌──────────────┐  │
//! │ Remote cmds  │──┘
//! └──────────────┘
//! ```
//!
//! # Examples
//!
//! ```
//! use smartlock_core::{DomainEvent, LockReason, event_bridge};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (events, mut drain) = event_bridge();
//!
//! // Publishing works from any thread and never blocks.
//! events.publish(DomainEvent::LockOpened { reason: LockReason::RemoteCommand });
//!
//! let event = drain.recv().await.unwrap();
//! assert_eq!(event, DomainEvent::LockOpened { reason: LockReason::RemoteCommand });
//! # }
//! ```

use chrono::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{AccessCode, CredentialKind, LockReason};

/// Immutable record of something the operator should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A credential matched and access was granted.
    AccessGranted {
        code: AccessCode,
        kind: CredentialKind,
    },

    /// A presented code matched nothing.
    ///
    /// The attempted code is kept verbatim; it may not even be a
    /// well-formed [`AccessCode`]. Renderers are expected to mask it.
    AccessDenied { attempted_code: String },

    /// Too many consecutive failures; all codes are refused for `duration`.
    LockedOut { duration: Duration },

    /// Lock transitioned to (or was re-asserted) OPEN.
    LockOpened { reason: LockReason },

    /// Lock transitioned to (or was re-asserted) CLOSED.
    LockClosed { reason: LockReason },

    /// A one-time code was used. Emitted in addition to `AccessGranted`.
    OneTimeCodeConsumed { code: AccessCode },

    /// The motion sensor fired.
    MotionDetected,

    /// A credential change made by the keypad could not be saved.
    ///
    /// The in-memory store is ahead of the file: a spent one-time code may
    /// be accepted again after a restart.
    PersistenceFailed { error: String },
}

impl DomainEvent {
    /// Short, stable name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::AccessGranted { .. } => "access_granted",
            DomainEvent::AccessDenied { .. } => "access_denied",
            DomainEvent::LockedOut { .. } => "locked_out",
            DomainEvent::LockOpened { .. } => "lock_opened",
            DomainEvent::LockClosed { .. } => "lock_closed",
            DomainEvent::OneTimeCodeConsumed { .. } => "one_time_code_consumed",
            DomainEvent::MotionDetected => "motion_detected",
            DomainEvent::PersistenceFailed { .. } => "persistence_failed",
        }
    }
}

/// Create a connected sender/receiver pair.
///
/// The queue is unbounded: events published before the receiver is polled
/// stay queued until it is.
#[must_use]
pub fn event_bridge() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer end of the bridge. Cheap to clone, safe to use from blocking
/// threads.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl EventSender {
    /// Enqueue an event.
    ///
    /// Never blocks. If the consumer has already gone away (shutdown), the
    /// event is discarded.
    pub fn publish(&self, event: DomainEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            debug!(event = name, "Event dropped: consumer has shut down");
        } else {
            debug!(event = name, "Event queued");
        }
    }
}

/// Consumer end of the bridge. Exactly one exists per bridge.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<DomainEvent>,
}

impl EventReceiver {
    /// Wait for the next event, in FIFO order.
    ///
    /// Returns `None` once every sender has been dropped and the queue is
    /// empty.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every event currently queued, without waiting.
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_queue_before_consumer_polls() {
        let (events, mut drain) = event_bridge();

        events.publish(DomainEvent::MotionDetected);
        events.publish(DomainEvent::LockClosed {
            reason: LockReason::ManualOverride,
        });

        assert_eq!(
            drain.drain(),
            vec![
                DomainEvent::MotionDetected,
                DomainEvent::LockClosed {
                    reason: LockReason::ManualOverride
                },
            ]
        );
        assert!(drain.try_recv().is_none());
    }

    #[test]
    fn test_publish_after_consumer_dropped_is_silent() {
        let (events, drain) = event_bridge();
        drop(drain);

        // Must not panic or block
        events.publish(DomainEvent::MotionDetected);
    }

    #[test]
    fn test_fifo_across_threads() {
        let (events, mut drain) = event_bridge();

        let producer = {
            let events = events.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    events.publish(DomainEvent::MotionDetected);
                }
                events.publish(DomainEvent::LockOpened {
                    reason: LockReason::PinEntered,
                });
            })
        };
        producer.join().unwrap();

        let drained = drain.drain();
        assert_eq!(drained.len(), 101);
        assert_eq!(
            drained.last(),
            Some(&DomainEvent::LockOpened {
                reason: LockReason::PinEntered
            })
        );
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_dropped() {
        let (events, mut drain) = event_bridge();
        events.publish(DomainEvent::MotionDetected);
        drop(events);

        assert_eq!(drain.recv().await, Some(DomainEvent::MotionDetected));
        assert_eq!(drain.recv().await, None);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(DomainEvent::MotionDetected.name(), "motion_detected");
        assert_eq!(
            DomainEvent::LockedOut {
                duration: Duration::seconds(60)
            }
            .name(),
            "locked_out"
        );
    }
}
