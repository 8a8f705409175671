//! Access decision: lockout first, then credential lookup.
//!
//! # Validation Flow
//!
//! 1. Lockout active → deny, no lookup, no counter change
//! 2. Credential lookup (permanent → temporary → one-time)
//! 3. Match → reset failure counter, emit `AccessGranted`
//!    (plus `OneTimeCodeConsumed` for one-time codes)
//! 4. No match → count the failure, emit `LockedOut` if this failure started
//!    a lockout, then `AccessDenied`
//!
//! A lookup that changed the store (one-time use, expired entry pruned) but
//! could not be saved emits `PersistenceFailed` before the outcome events.
//!
//! The lockout mutex is held for the whole decision and the store is locked
//! inside it, so two racing codes are decided one after the other and the
//! failure count can never be outrun.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use smartlock_core::{AccessCode, CredentialKind, DomainEvent, EventSender, mask_code};
use smartlock_storage::{ConsumeOutcome, CredentialStore};
use tracing::{info, warn};

use crate::lockout::{LockoutGuard, LockoutOutcome, LockoutPolicy};

/// Why a code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The code matched nothing; the failure has been counted.
    InvalidCode { lockout: LockoutOutcome },

    /// A lockout is in force. The code was not looked at.
    LockedOut { remaining: Duration },
}

/// Result of [`AccessControlEngine::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Granted { kind: CredentialKind },
    Denied(DenialReason),
}

impl ValidationResult {
    pub fn is_granted(&self) -> bool {
        matches!(self, ValidationResult::Granted { .. })
    }
}

/// Combines the credential store and the lockout guard.
#[derive(Debug)]
pub struct AccessControlEngine {
    store: Arc<CredentialStore>,
    guard: Mutex<LockoutGuard>,
    events: EventSender,
}

impl AccessControlEngine {
    pub fn new(store: Arc<CredentialStore>, policy: LockoutPolicy, events: EventSender) -> Self {
        Self {
            store,
            guard: Mutex::new(LockoutGuard::new(policy)),
            events,
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Decide on a presented code.
    ///
    /// While locked out, every code is denied, and an `AccessDenied` event is
    /// still emitted so the operator hears about the attempt.
    pub fn validate(&self, code: &str, now: DateTime<Utc>) -> ValidationResult {
        let mut guard = self.guard.lock();

        if let Some(remaining) = guard.remaining(now) {
            warn!(
                code = %mask_code(code),
                remaining_secs = remaining.num_seconds(),
                "Code refused, keypad locked out"
            );
            self.events.publish(DomainEvent::AccessDenied {
                attempted_code: code.to_string(),
            });
            return ValidationResult::Denied(DenialReason::LockedOut { remaining });
        }

        // A string that is not a well-formed code cannot be stored either
        let matched = AccessCode::new(code).ok().and_then(|candidate| {
            let committed = self.store.try_consume(candidate.as_str(), now);
            if let Some(e) = &committed.warning {
                warn!(code = %candidate.masked(), error = %e, "Credential change after lookup not saved");
                self.events.publish(DomainEvent::PersistenceFailed {
                    error: e.to_string(),
                });
            }
            let outcome = committed.into_value();
            outcome.kind().map(|kind| (candidate, kind, outcome))
        });

        match matched {
            Some((code, kind, outcome)) => {
                guard.record_success();
                info!(code = %code.masked(), %kind, "Access granted");

                self.events.publish(DomainEvent::AccessGranted {
                    code: code.clone(),
                    kind,
                });
                if let ConsumeOutcome::OneTimeMatch { .. } = outcome {
                    self.events.publish(DomainEvent::OneTimeCodeConsumed { code });
                }

                ValidationResult::Granted { kind }
            }
            None => {
                let lockout = guard.record_failure(now);
                warn!(code = %mask_code(code), "Access denied, unknown code");

                if let LockoutOutcome::JustLockedOut { duration } = lockout {
                    self.events.publish(DomainEvent::LockedOut { duration });
                }
                self.events.publish(DomainEvent::AccessDenied {
                    attempted_code: code.to_string(),
                });

                ValidationResult::Denied(DenialReason::InvalidCode { lockout })
            }
        }
    }

    /// Remaining lockout at `now`, if any.
    pub fn lockout_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.guard.lock().remaining(now)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.guard.lock().consecutive_failures()
    }
}
