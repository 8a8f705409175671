//! Application context shared by the keypad loop, the motion monitor and the
//! remote dispatcher.

use std::sync::Arc;

use smartlock_core::EventSender;
use smartlock_hardware::LockActuator;
use smartlock_storage::CredentialStore;

use crate::engine::AccessControlEngine;
use crate::lock::LockStateMachine;
use crate::lockout::LockoutPolicy;

/// Handles to every shared component. Cheap to clone.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use smartlock_access::{AppContext, LockoutPolicy};
/// use smartlock_core::event_bridge;
/// use smartlock_hardware::mock::MockRelay;
/// use smartlock_storage::{CredentialStore, MemoryGateway};
///
/// let (events, _drain) = event_bridge();
/// let (relay, _relay_state) = MockRelay::new();
/// let store = Arc::new(CredentialStore::load(MemoryGateway::new()));
///
/// let ctx = AppContext::new(store, relay, LockoutPolicy::default(), events);
/// assert!(ctx.lock.state().is_closed());
/// ```
#[derive(Debug, Clone)]
pub struct AppContext {
    pub store: Arc<CredentialStore>,
    pub engine: Arc<AccessControlEngine>,
    pub lock: Arc<LockStateMachine>,
    pub events: EventSender,
}

impl AppContext {
    pub fn new(
        store: Arc<CredentialStore>,
        actuator: impl LockActuator + 'static,
        policy: LockoutPolicy,
        events: EventSender,
    ) -> Self {
        let engine = AccessControlEngine::new(Arc::clone(&store), policy, events.clone());
        let lock = LockStateMachine::new(actuator, events.clone());

        Self {
            store,
            engine: Arc::new(engine),
            lock: Arc::new(lock),
            events,
        }
    }
}
