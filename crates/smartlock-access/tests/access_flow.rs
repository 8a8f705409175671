//! End-to-end behaviour of the access core: engine, lockout, lock state and
//! keypad controller over the mock hardware.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, Utc};
use rstest::rstest;
use smartlock_access::{
    AppContext, DenialReason, KeyOutcome, KeypadConfig, KeypadController, LockoutOutcome,
    LockoutPolicy, ValidationResult,
};
use smartlock_core::{
    AccessCode, CredentialKind, DomainEvent, EventReceiver, LockReason, LockState, event_bridge,
};
use smartlock_hardware::mock::{MockRelay, MockRelayHandle};
use smartlock_hardware::{Key, VirtualLcd};
use smartlock_storage::{CredentialStore, MemoryGateway};

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000, 0).unwrap()
}

fn code(s: &str) -> AccessCode {
    AccessCode::new(s).unwrap()
}

struct Harness {
    ctx: AppContext,
    drain: EventReceiver,
    relay: MockRelayHandle,
}

fn harness() -> Harness {
    let (events, drain) = event_bridge();
    let (relay, relay_handle) = MockRelay::new();
    let store = Arc::new(CredentialStore::load(MemoryGateway::new()));
    let _ = store.add_permanent(code("4821"));

    Harness {
        ctx: AppContext::new(store, relay, LockoutPolicy::default(), events),
        drain,
        relay: relay_handle,
    }
}

#[test]
fn test_unknown_code_counts_one_failure() {
    let h = harness();

    let result = h.ctx.engine.validate("9999", t0());

    assert_eq!(
        result,
        ValidationResult::Denied(DenialReason::InvalidCode {
            lockout: LockoutOutcome::StillCounting {
                attempts_remaining: 4
            }
        })
    );
    assert_eq!(h.ctx.engine.consecutive_failures(), 1);
}

#[rstest]
#[case::valid_code("4821", 1)]
#[case::invalid_code("9999", 1)]
#[case::end_of_window("4821", 59)]
fn test_lockout_refuses_everything(#[case] presented: &str, #[case] after_secs: i64) {
    let h = harness();
    for _ in 0..4 {
        let _ = h.ctx.engine.validate("9999", t0());
    }
    assert_eq!(
        h.ctx.engine.validate("9999", t0()),
        ValidationResult::Denied(DenialReason::InvalidCode {
            lockout: LockoutOutcome::JustLockedOut {
                duration: Duration::seconds(60)
            }
        })
    );

    let result = h
        .ctx
        .engine
        .validate(presented, t0() + Duration::seconds(after_secs));
    assert!(matches!(
        result,
        ValidationResult::Denied(DenialReason::LockedOut { .. })
    ));
}

#[test]
fn test_lockout_expires_after_window() {
    let h = harness();
    for _ in 0..5 {
        let _ = h.ctx.engine.validate("9999", t0());
    }

    let result = h.ctx.engine.validate("4821", t0() + Duration::seconds(60));
    assert!(result.is_granted());
}

#[test]
fn test_temporary_code_lifecycle() {
    let h = harness();
    let ttl = Duration::minutes(30);
    let _ = h.ctx.store.add_temporary(code("5555"), ttl, t0());

    assert_eq!(
        h.ctx
            .engine
            .validate("5555", t0() + ttl - Duration::seconds(1)),
        ValidationResult::Granted {
            kind: CredentialKind::Temporary
        }
    );
    assert!(!h
        .ctx
        .engine
        .validate("5555", t0() + ttl + Duration::seconds(1))
        .is_granted());
    assert!(h
        .ctx
        .store
        .list(t0() + ttl + Duration::seconds(1))
        .temporary
        .is_empty());
}

#[test]
fn test_one_time_code_single_use() {
    let mut h = harness();
    let _ = h.ctx.store.add_one_time(code("612944"), 1);

    assert_eq!(
        h.ctx.engine.validate("612944", t0()),
        ValidationResult::Granted {
            kind: CredentialKind::OneTime
        }
    );
    assert!(matches!(
        h.ctx.engine.validate("612944", t0()),
        ValidationResult::Denied(DenialReason::InvalidCode { .. })
    ));

    let events = h.drain.drain();
    assert!(events.contains(&DomainEvent::OneTimeCodeConsumed {
        code: code("612944")
    }));
}

#[test]
fn test_open_then_close_events() {
    let mut h = harness();

    h.ctx.lock.open(LockReason::RemoteCommand, t0());
    h.ctx.lock.close(LockReason::RemoteCommand, t0());

    assert_eq!(h.ctx.lock.state(), LockState::Closed);
    assert!(h.relay.is_energized());
    assert_eq!(
        h.drain.drain(),
        vec![
            DomainEvent::LockOpened {
                reason: LockReason::RemoteCommand
            },
            DomainEvent::LockClosed {
                reason: LockReason::RemoteCommand
            },
        ]
    );
}

#[rstest]
#[case::while_open(true, false)]
#[case::while_locked_out(false, true)]
#[case::both(true, true)]
fn test_master_override_always_closes(#[case] start_open: bool, #[case] locked_out: bool) {
    let h = harness();
    if start_open {
        h.ctx.lock.open(LockReason::ManualOverride, t0());
    }
    if locked_out {
        for _ in 0..5 {
            let _ = h.ctx.engine.validate("9999", t0());
        }
    }

    let mut keypad = KeypadController::new(h.ctx.clone(), VirtualLcd::default(), KeypadConfig::default());
    let mut last = KeyOutcome::Ignored;
    for key in [Key::Digit(0), Key::Digit(0), Key::Digit(0), Key::Digit(0), Key::Hash] {
        last = keypad.handle_key(key, t0() + Duration::seconds(1));
    }

    assert_eq!(last, KeyOutcome::MasterClose);
    assert_eq!(h.ctx.lock.state(), LockState::Closed);
    assert!(h.relay.is_energized());
}

#[test]
fn test_keypad_grant_emits_granted_then_opened() {
    let mut h = harness();
    let mut keypad = KeypadController::new(h.ctx.clone(), VirtualLcd::default(), KeypadConfig::default());

    for ch in "4821#".chars() {
        keypad.handle_key(Key::from_char(ch).unwrap(), t0());
    }

    assert_eq!(
        h.drain.drain(),
        vec![
            DomainEvent::AccessGranted {
                code: code("4821"),
                kind: CredentialKind::Permanent
            },
            DomainEvent::LockOpened {
                reason: LockReason::PinEntered
            },
        ]
    );
}

#[test]
fn test_racing_failures_cannot_outrun_lockout() {
    let mut h = harness();
    let engine = Arc::clone(&h.ctx.engine);

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..10)
                    .map(|_| engine.validate("9999", t0()))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<ValidationResult> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();

    let counted = results
        .iter()
        .filter(|r| matches!(r, ValidationResult::Denied(DenialReason::InvalidCode { .. })))
        .count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, ValidationResult::Denied(DenialReason::LockedOut { .. })))
        .count();

    assert_eq!(counted, 5);
    assert_eq!(refused, 75);

    let events = h.drain.drain();
    let lockouts = events
        .iter()
        .filter(|e| matches!(e, DomainEvent::LockedOut { .. }))
        .count();
    let denials = events
        .iter()
        .filter(|e| matches!(e, DomainEvent::AccessDenied { .. }))
        .count();
    assert_eq!(lockouts, 1);
    assert_eq!(denials, 80);
}

#[test]
fn test_concurrent_transitions_leave_consistent_state() {
    let mut h = harness();

    let workers: Vec<_> = (0..6)
        .map(|i| {
            let ctx = h.ctx.clone();
            thread::spawn(move || {
                for n in 0..50 {
                    if (i + n) % 2 == 0 {
                        ctx.lock.open(LockReason::RemoteCommand, t0());
                    } else {
                        ctx.lock.close(LockReason::RemoteCommand, t0());
                    }
                    let _ = ctx.engine.validate("4821", t0());
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let last_lock_event = h
        .drain
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            DomainEvent::LockOpened { .. } => Some(LockState::Open),
            DomainEvent::LockClosed { .. } => Some(LockState::Closed),
            _ => None,
        })
        .last();

    let state = h.ctx.lock.state();
    assert_eq!(last_lock_event, Some(state));
    assert_eq!(h.ctx.lock.history().last().map(|t| t.to), Some(state));
    assert_eq!(h.relay.is_energized(), state.is_closed());
    assert_eq!(h.ctx.engine.consecutive_failures(), 0);
}
