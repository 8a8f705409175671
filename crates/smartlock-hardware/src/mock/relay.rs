//! Mock relay for the lock bolt.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{HardwareError, Result, traits::LockActuator};

#[derive(Debug, Default)]
struct RelayState {
    energized: AtomicBool,
    switches: AtomicUsize,
}

/// Mock relay that records what it was told to do.
///
/// # Examples
///
/// ```
/// use smartlock_hardware::LockActuator;
/// use smartlock_hardware::mock::MockRelay;
///
/// let (mut relay, handle) = MockRelay::new();
/// relay.on().unwrap();
///
/// assert!(handle.is_energized());
/// assert_eq!(handle.switch_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockRelay {
    state: Arc<RelayState>,
    fail: bool,
}

impl MockRelay {
    /// Create a working relay, initially released.
    pub fn new() -> (Self, MockRelayHandle) {
        Self::build(false)
    }

    /// Create a relay whose every switch fails.
    ///
    /// Useful to check that actuator failures never stop a transition.
    pub fn failing() -> (Self, MockRelayHandle) {
        Self::build(true)
    }

    fn build(fail: bool) -> (Self, MockRelayHandle) {
        let state = Arc::new(RelayState::default());
        let handle = MockRelayHandle {
            state: Arc::clone(&state),
        };
        (Self { state, fail }, handle)
    }

    fn switch(&mut self, energized: bool) -> Result<()> {
        if self.fail {
            return Err(HardwareError::communication("relay output not writable"));
        }
        self.state.energized.store(energized, Ordering::SeqCst);
        self.state.switches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl LockActuator for MockRelay {
    fn on(&mut self) -> Result<()> {
        self.switch(true)
    }

    fn off(&mut self) -> Result<()> {
        self.switch(false)
    }
}

/// Read-only view of a [`MockRelay`].
#[derive(Debug, Clone)]
pub struct MockRelayHandle {
    state: Arc<RelayState>,
}

impl MockRelayHandle {
    /// Whether the relay is currently energised (bolt engaged).
    pub fn is_energized(&self) -> bool {
        self.state.energized.load(Ordering::SeqCst)
    }

    /// Number of successful `on`/`off` calls.
    pub fn switch_count(&self) -> usize {
        self.state.switches.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_off_tracks_state() {
        let (mut relay, handle) = MockRelay::new();
        assert!(!handle.is_energized());

        relay.on().unwrap();
        assert!(handle.is_energized());

        relay.off().unwrap();
        assert!(!handle.is_energized());
        assert_eq!(handle.switch_count(), 2);
    }

    #[test]
    fn test_failing_relay_leaves_state_untouched() {
        let (mut relay, handle) = MockRelay::failing();

        assert!(relay.on().is_err());
        assert!(!handle.is_energized());
        assert_eq!(handle.switch_count(), 0);
    }
}
