use thiserror::Error;

/// Storage-specific error types for the smart lock.
///
/// None of these are fatal to the access core. A failure while saving
/// (`PersistenceWriteFailed` in operator terms) leaves the in-memory
/// credentials intact and is surfaced as a warning; a failure while loading
/// (`PersistenceLoadFailed`) makes the store start empty.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential set could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sealing the blob failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Blob failed authentication: wrong key or tampered file
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Key material is malformed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Blob is structurally invalid (e.g. shorter than a nonce)
    #[error("Corrupted blob: {0}")]
    Corrupted(String),

    /// Injected or backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
