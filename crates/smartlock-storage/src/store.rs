//! Credential store.
//!
//! Owns the [`CredentialSet`] behind a single mutex and writes the whole set
//! through its [`PersistenceGateway`] after every change, before the call
//! returns. The write happens under the same lock, so the file always
//! reflects a state the store actually passed through.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use smartlock_core::AccessCode;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::gateway::PersistenceGateway;
use crate::models::{
    AddOutcome, Committed, ConsumeOutcome, CredentialListing, CredentialSet, RemoveOutcome,
};

/// Thread-safe credential store.
pub struct CredentialStore {
    codes: Mutex<CredentialSet>,
    gateway: Box<dyn PersistenceGateway>,
}

impl CredentialStore {
    /// Load the stored set through `gateway`.
    ///
    /// Nothing stored yet gives an empty store. So does a failed load
    /// (unreadable file, wrong key, bad JSON), after a warning.
    pub fn load(gateway: impl PersistenceGateway + 'static) -> Self {
        let codes = match gateway.load() {
            Ok(Some(bytes)) => match CredentialSet::from_json(&bytes) {
                Ok(codes) => codes,
                Err(e) => {
                    warn!(error = %e, "Credential file unreadable, starting empty");
                    CredentialSet::default()
                }
            },
            Ok(None) => {
                info!("No credential file yet, starting empty");
                CredentialSet::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load credentials, starting empty");
                CredentialSet::default()
            }
        };

        info!(
            permanent = codes.permanent.len(),
            temporary = codes.temporary.len(),
            one_time = codes.one_time.len(),
            "Credential store ready"
        );

        Self::with_codes(codes, gateway)
    }

    /// Store seeded with `codes`; nothing is read from the gateway.
    pub fn with_codes(codes: CredentialSet, gateway: impl PersistenceGateway + 'static) -> Self {
        Self {
            codes: Mutex::new(codes),
            gateway: Box::new(gateway),
        }
    }

    /// Add a permanent code.
    pub fn add_permanent(&self, code: AccessCode) -> Committed<AddOutcome> {
        let mut codes = self.codes.lock();
        let masked = code.masked();

        if !codes.permanent.insert(code) {
            return Committed::clean(AddOutcome::AlreadyExists);
        }

        info!(code = %masked, "Permanent code added");
        Committed::new(AddOutcome::Added, self.persist(&codes))
    }

    /// Add or replace a temporary code valid for `ttl` from `now`.
    ///
    /// Returns the expiry instant.
    pub fn add_temporary(
        &self,
        code: AccessCode,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Committed<DateTime<Utc>> {
        let mut codes = self.codes.lock();
        let expires_at = now + ttl;

        info!(code = %code.masked(), %expires_at, "Temporary code set");
        codes.temporary.insert(code, expires_at);
        Committed::new(expires_at, self.persist(&codes))
    }

    /// Add or replace a one-time code with `uses` uses. Zero counts as one.
    pub fn add_one_time(&self, code: AccessCode, uses: u32) -> Committed<()> {
        let mut codes = self.codes.lock();
        let uses = uses.max(1);

        info!(code = %code.masked(), uses, "One-time code set");
        codes.one_time.insert(code, uses);
        Committed::new((), self.persist(&codes))
    }

    /// Remove a code from every map that holds it.
    pub fn remove(&self, code: &str) -> Committed<RemoveOutcome> {
        let mut codes = self.codes.lock();

        let removed_permanent = codes.permanent.remove(code);
        let removed_temporary = codes.temporary.remove(code).is_some();
        let removed_one_time = codes.one_time.remove(code).is_some();

        if !(removed_permanent || removed_temporary || removed_one_time) {
            return Committed::clean(RemoveOutcome::NotFound);
        }

        info!(
            code = %smartlock_core::mask_code(code),
            removed_permanent, removed_temporary, removed_one_time,
            "Code removed"
        );
        Committed::new(RemoveOutcome::Removed, self.persist(&codes))
    }

    /// Present a code.
    ///
    /// Maps are searched permanent, temporary, one-time; the first match
    /// wins. An expired temporary entry is deleted and the search goes on.
    /// A one-time match uses up one use and deletes the code at zero.
    pub fn try_consume(&self, code: &str, now: DateTime<Utc>) -> Committed<ConsumeOutcome> {
        let mut codes = self.codes.lock();

        if codes.permanent.contains(code) {
            return Committed::clean(ConsumeOutcome::PermanentMatch);
        }

        let mut changed = false;

        if let Some(&expires_at) = codes.temporary.get(code) {
            // Still accepted at the expiry instant, though `list` already
            // leaves it out there.
            if now <= expires_at {
                return Committed::clean(ConsumeOutcome::TemporaryMatch { expires_at });
            }
            codes.temporary.remove(code);
            changed = true;
            debug!(code = %smartlock_core::mask_code(code), "Expired temporary code pruned");
        }

        let mut outcome = ConsumeOutcome::NoMatch;
        if let Some(uses) = codes.one_time.get_mut(code) {
            *uses = uses.saturating_sub(1);
            let uses_remaining = *uses;
            if uses_remaining == 0 {
                codes.one_time.remove(code);
            }
            changed = true;
            outcome = ConsumeOutcome::OneTimeMatch { uses_remaining };
            info!(code = %smartlock_core::mask_code(code), uses_remaining, "One-time code used");
        }

        let warning = if changed { self.persist(&codes) } else { None };
        Committed::new(outcome, warning)
    }

    /// Current credentials, without touching the store.
    ///
    /// Temporary codes are left out from their expiry instant on, so a code
    /// with zero seconds left is never listed.
    pub fn list(&self, now: DateTime<Utc>) -> CredentialListing {
        let codes = self.codes.lock();

        CredentialListing {
            permanent: codes.permanent.iter().cloned().collect(),
            temporary: codes
                .temporary
                .iter()
                .filter(|(_, expires_at)| **expires_at > now)
                .map(|(code, expires_at)| (code.clone(), (*expires_at - now).num_seconds()))
                .collect(),
            one_time: codes
                .one_time
                .iter()
                .map(|(code, uses)| (code.clone(), *uses))
                .collect(),
        }
    }

    /// Copy of the raw maps, expired entries included.
    pub fn snapshot(&self) -> CredentialSet {
        self.codes.lock().clone()
    }

    fn persist(&self, codes: &CredentialSet) -> Option<StorageError> {
        let result = codes
            .to_json()
            .and_then(|bytes| self.gateway.save(&bytes));

        match result {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Credential change not persisted");
                Some(e)
            }
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes = self.codes.lock();
        f.debug_struct("CredentialStore")
            .field("permanent", &codes.permanent.len())
            .field("temporary", &codes.temporary.len())
            .field("one_time", &codes.one_time.len())
            .finish_non_exhaustive()
    }
}
