//! Lock state machine.
//!
//! Two states, OPEN and CLOSED, starting CLOSED. Any transition is allowed,
//! including re-entering the current state: asking an open lock to open
//! drives the actuator again and emits `LockOpened` again.
//!
//! # Actuation
//!
//! The actuator is a relay that holds the bolt when energised:
//! - `open` → `off()` (release)
//! - `close` → `on()` (engage)
//!
//! A failed actuator call is logged and recorded on the transition; the
//! state still changes. The relay has no feedback line, so the software
//! state is the best available truth.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use smartlock_access::LockStateMachine;
//! use smartlock_core::{LockReason, LockState, event_bridge};
//! use smartlock_hardware::mock::MockRelay;
//!
//! let (events, mut drain) = event_bridge();
//! let (relay, relay_state) = MockRelay::new();
//! let lock = LockStateMachine::new(relay, events);
//!
//! assert_eq!(lock.state(), LockState::Closed);
//!
//! lock.open(LockReason::RemoteCommand, Utc::now());
//! assert_eq!(lock.state(), LockState::Open);
//! assert!(!relay_state.is_energized());
//! assert_eq!(drain.drain().len(), 1);
//! ```

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use smartlock_core::{DomainEvent, EventSender, LockReason, LockState};
use smartlock_hardware::LockActuator;
use tracing::{error, info};

/// Maximum number of transitions kept in history.
///
/// Roughly a day of normal use on a front door; enough to see what happened
/// around an incident without growing without bound.
pub const MAX_HISTORY_SIZE: usize = 100;

/// A single recorded transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTransition {
    /// The state transitioned from.
    pub from: LockState,

    /// The state transitioned to.
    pub to: LockState,

    /// What asked for the transition.
    pub reason: LockReason,

    /// When the transition occurred.
    pub at: DateTime<Utc>,

    /// Whether the actuator accepted the command.
    pub actuated: bool,
}

/// Consistent view of the lock at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSnapshot {
    pub state: LockState,

    /// `None` until the first transition.
    pub last_transition_at: Option<DateTime<Utc>>,
}

struct Inner {
    state: LockState,
    last_transition_at: Option<DateTime<Utc>>,
    history: VecDeque<LockTransition>,
    actuator: Box<dyn LockActuator>,
}

/// Thread-safe lock state machine.
///
/// State, actuator and history live behind one mutex. Events are published
/// while it is held, so the event order always matches the order in which
/// transitions were applied.
pub struct LockStateMachine {
    inner: Mutex<Inner>,
    events: EventSender,
}

impl LockStateMachine {
    /// Create a state machine in the CLOSED state.
    ///
    /// The actuator is not driven here; the first `open`/`close` sets it.
    pub fn new(actuator: impl LockActuator + 'static, events: EventSender) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LockState::Closed,
                last_transition_at: None,
                history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
                actuator: Box::new(actuator),
            }),
            events,
        }
    }

    /// Release the bolt.
    ///
    /// # Arguments
    ///
    /// * `reason` - What asked for the transition (carried into the event)
    /// * `now` - Transition timestamp
    ///
    /// # Returns
    ///
    /// The recorded transition.
    pub fn open(&self, reason: LockReason, now: DateTime<Utc>) -> LockTransition {
        self.transition(LockState::Open, reason, now)
    }

    /// Engage the bolt.
    ///
    /// Same contract as [`LockStateMachine::open`].
    pub fn close(&self, reason: LockReason, now: DateTime<Utc>) -> LockTransition {
        self.transition(LockState::Closed, reason, now)
    }

    /// Current state.
    pub fn state(&self) -> LockState {
        self.inner.lock().state
    }

    /// State and last transition time, read together.
    pub fn snapshot(&self) -> LockSnapshot {
        let inner = self.inner.lock();
        LockSnapshot {
            state: inner.state,
            last_transition_at: inner.last_transition_at,
        }
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> Vec<LockTransition> {
        self.inner.lock().history.iter().cloned().collect()
    }

    /// Up to `count` most recent transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<LockTransition> {
        let inner = self.inner.lock();
        let skip = inner.history.len().saturating_sub(count);
        inner.history.iter().skip(skip).cloned().collect()
    }

    fn transition(&self, to: LockState, reason: LockReason, now: DateTime<Utc>) -> LockTransition {
        let mut inner = self.inner.lock();

        let result = match to {
            LockState::Open => inner.actuator.off(),
            LockState::Closed => inner.actuator.on(),
        };
        if let Err(e) = &result {
            error!(error = %e, target_state = %to, "Lock actuator failed");
        }

        let transition = LockTransition {
            from: inner.state,
            to,
            reason,
            at: now,
            actuated: result.is_ok(),
        };

        inner.state = to;
        inner.last_transition_at = Some(now);
        if inner.history.len() >= MAX_HISTORY_SIZE {
            inner.history.pop_front();
        }
        inner.history.push_back(transition.clone());

        info!(from = %transition.from, to = %to, %reason, "Lock transition");

        self.events.publish(match to {
            LockState::Open => DomainEvent::LockOpened { reason },
            LockState::Closed => DomainEvent::LockClosed { reason },
        });

        transition
    }
}

impl std::fmt::Debug for LockStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LockStateMachine")
            .field("state", &inner.state)
            .field("last_transition_at", &inner.last_transition_at)
            .field("history_len", &inner.history.len())
            .finish_non_exhaustive()
    }
}
