//! Brute-force lockout.
//!
//! The guard counts consecutive invalid codes. When the count reaches the
//! policy threshold it opens a lockout window and starts counting again from
//! zero. The window is never shortened: a later success resets the counter
//! but leaves `locked_until` alone, and it simply expires.

use chrono::{DateTime, Duration, Utc};
use smartlock_core::constants::{DEFAULT_LOCKOUT_SECS, DEFAULT_MAX_ATTEMPTS};
use tracing::warn;

/// Threshold and window length.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use smartlock_access::LockoutPolicy;
///
/// let policy = LockoutPolicy::default()
///     .with_max_attempts(3)
///     .with_duration(Duration::seconds(30));
///
/// assert_eq!(policy.max_attempts, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lockout. Never below one.
    pub max_attempts: u32,

    /// How long a lockout lasts.
    pub duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, duration: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            duration,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::seconds(DEFAULT_LOCKOUT_SECS),
        )
    }
}

/// What a recorded failure led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutOutcome {
    /// Below the threshold.
    StillCounting { attempts_remaining: u32 },

    /// This failure reached the threshold and started a lockout.
    JustLockedOut { duration: Duration },
}

/// Consecutive-failure counter with a lockout deadline.
#[derive(Debug, Clone)]
pub struct LockoutGuard {
    policy: LockoutPolicy,
    consecutive_failures: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl LockoutGuard {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
            locked_until: None,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.locked_until
    }

    /// `true` while `now` is before the lockout deadline.
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Time left in the current lockout, if one is active.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Count one invalid code.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> LockoutOutcome {
        self.consecutive_failures += 1;

        if self.consecutive_failures >= self.policy.max_attempts {
            let until = now + self.policy.duration;
            self.locked_until = Some(until);
            self.consecutive_failures = 0;

            warn!(
                attempts = self.policy.max_attempts,
                seconds = self.policy.duration.num_seconds(),
                %until,
                "Too many invalid codes, keypad locked out"
            );

            return LockoutOutcome::JustLockedOut {
                duration: self.policy.duration,
            };
        }

        LockoutOutcome::StillCounting {
            attempts_remaining: self.policy.max_attempts - self.consecutive_failures,
        }
    }

    /// Reset the failure counter. An active lockout stays in force.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }
}

impl Default for LockoutGuard {
    fn default() -> Self {
        Self::new(LockoutPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    #[test]
    fn test_fifth_failure_locks_out() {
        let mut guard = LockoutGuard::default();

        for remaining in (1..=4).rev() {
            assert_eq!(
                guard.record_failure(t0()),
                LockoutOutcome::StillCounting {
                    attempts_remaining: remaining
                }
            );
        }
        assert_eq!(
            guard.record_failure(t0()),
            LockoutOutcome::JustLockedOut {
                duration: Duration::seconds(60)
            }
        );
        assert_eq!(guard.consecutive_failures(), 0);
    }

    #[test]
    fn test_lockout_window_bounds() {
        let mut guard = LockoutGuard::new(LockoutPolicy::new(1, Duration::seconds(60)));
        guard.record_failure(t0());

        assert!(guard.is_locked_out(t0()));
        assert!(guard.is_locked_out(t0() + Duration::seconds(59)));
        assert!(!guard.is_locked_out(t0() + Duration::seconds(60)));
        assert_eq!(
            guard.remaining(t0() + Duration::seconds(45)),
            Some(Duration::seconds(15))
        );
        assert_eq!(guard.remaining(t0() + Duration::seconds(61)), None);
    }

    #[test]
    fn test_success_keeps_active_lockout() {
        let mut guard = LockoutGuard::new(LockoutPolicy::new(1, Duration::seconds(60)));
        guard.record_failure(t0());
        guard.record_success();

        assert!(guard.is_locked_out(t0() + Duration::seconds(1)));
    }

    #[test]
    fn test_success_resets_counter() {
        let mut guard = LockoutGuard::default();
        guard.record_failure(t0());
        guard.record_failure(t0());
        guard.record_success();

        assert_eq!(guard.consecutive_failures(), 0);
        assert!(matches!(
            guard.record_failure(t0()),
            LockoutOutcome::StillCounting {
                attempts_remaining: 4
            }
        ));
    }

    #[test]
    fn test_zero_threshold_clamped() {
        assert_eq!(LockoutPolicy::new(0, Duration::seconds(1)).max_attempts, 1);
        assert_eq!(LockoutPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    proptest! {
        /// Replays a random failure/success sequence against a plain counter.
        #[test]
        fn prop_lockout_every_threshold_failures(
            max_attempts in 1u32..8,
            steps in proptest::collection::vec(any::<bool>(), 0..64),
        ) {
            let mut guard = LockoutGuard::new(LockoutPolicy::new(max_attempts, Duration::seconds(60)));
            let mut expected = 0u32;

            for failed in steps {
                if failed {
                    expected += 1;
                    let outcome = guard.record_failure(t0());
                    if expected == max_attempts {
                        expected = 0;
                        let locked = matches!(outcome, LockoutOutcome::JustLockedOut { .. });
                        prop_assert!(locked, "failure {} did not lock out", max_attempts);
                    } else {
                        prop_assert_eq!(
                            outcome,
                            LockoutOutcome::StillCounting { attempts_remaining: max_attempts - expected }
                        );
                    }
                } else {
                    expected = 0;
                    guard.record_success();
                }

                prop_assert_eq!(guard.consecutive_failures(), expected);
                prop_assert!(guard.consecutive_failures() < max_attempts);
            }
        }

        #[test]
        fn prop_lockout_deadline_never_moves_back(
            offsets in proptest::collection::vec(0i64..600, 1..32),
        ) {
            let mut guard = LockoutGuard::new(LockoutPolicy::new(1, Duration::seconds(60)));
            let mut sorted = offsets;
            sorted.sort_unstable();
            let mut last = None;

            for offset in sorted {
                guard.record_failure(t0() + Duration::seconds(offset));
                guard.record_success();
                let until = guard.locked_until();
                prop_assert!(until >= last);
                last = until;
            }
        }
    }
}
