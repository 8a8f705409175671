//! Results of credential store operations.

use chrono::{DateTime, Utc};
use smartlock_core::{AccessCode, CredentialKind};

use crate::error::StorageError;

/// Outcome of a mutating store call.
///
/// The in-memory change has always been applied. `warning` is set when the
/// change could not be written through the gateway; it is not rolled back.
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub warning: Option<StorageError>,
}

impl<T> Committed<T> {
    pub(crate) fn new(value: T, warning: Option<StorageError>) -> Self {
        Self { value, warning }
    }

    pub(crate) fn clean(value: T) -> Self {
        Self::new(value, None)
    }

    /// Whether the change reached durable storage.
    pub fn is_durable(&self) -> bool {
        self.warning.is_none()
    }

    /// Drop the warning and keep the value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Committed<U> {
        Committed {
            value: f(self.value),
            warning: self.warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Result of presenting a code to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    PermanentMatch,
    TemporaryMatch { expires_at: DateTime<Utc> },
    /// The use has been counted; at zero the code is gone.
    OneTimeMatch { uses_remaining: u32 },
    NoMatch,
}

impl ConsumeOutcome {
    /// Kind of credential that matched, if any.
    pub fn kind(&self) -> Option<CredentialKind> {
        match self {
            ConsumeOutcome::PermanentMatch => Some(CredentialKind::Permanent),
            ConsumeOutcome::TemporaryMatch { .. } => Some(CredentialKind::Temporary),
            ConsumeOutcome::OneTimeMatch { .. } => Some(CredentialKind::OneTime),
            ConsumeOutcome::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, ConsumeOutcome::NoMatch)
    }
}

/// Point-in-time view of the store, for the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialListing {
    pub permanent: Vec<AccessCode>,
    /// Unexpired temporary codes with whole seconds left.
    pub temporary: Vec<(AccessCode, i64)>,
    /// One-time codes with uses left.
    pub one_time: Vec<(AccessCode, u32)>,
}

impl CredentialListing {
    pub fn is_empty(&self) -> bool {
        self.permanent.is_empty() && self.temporary.is_empty() && self.one_time.is_empty()
    }
}
