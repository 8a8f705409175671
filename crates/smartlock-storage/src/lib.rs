//! Credential storage for the smart lock.
//!
//! - [`CredentialStore`] - permanent, temporary and one-time codes behind one
//!   mutex, written through after every change
//! - [`PersistenceGateway`] - where the serialized set goes;
//!   [`EncryptedFileGateway`] seals it with XChaCha20-Poly1305
//! - [`StorageKey`] - key file management
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use smartlock_core::AccessCode;
//! use smartlock_storage::{ConsumeOutcome, CredentialStore, MemoryGateway};
//!
//! let store = CredentialStore::load(MemoryGateway::new());
//! let now = Utc::now();
//!
//! let _ = store.add_temporary(AccessCode::new("5555").unwrap(), Duration::minutes(10), now);
//!
//! assert!(matches!(
//!     store.try_consume("5555", now).value,
//!     ConsumeOutcome::TemporaryMatch { .. }
//! ));
//! ```

pub mod crypto;
pub mod error;
pub mod gateway;
pub mod models;
pub mod store;

pub use crypto::StorageKey;
pub use error::{StorageError, StorageResult};
pub use gateway::{EncryptedFileGateway, MemoryGateway, PersistenceGateway};
pub use models::{
    AddOutcome, Committed, ConsumeOutcome, CredentialListing, CredentialSet, RemoveOutcome,
};
pub use store::CredentialStore;
