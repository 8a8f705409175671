//! Encryption at rest for the credential file.
//!
//! The on-disk blob is `nonce (24 bytes) || XChaCha20-Poly1305 ciphertext`.
//! The key lives in its own file as 64 hex characters and is created on
//! first start.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{StorageError, StorageResult};

/// Key length in bytes (256-bit)
pub const KEY_LEN: usize = 32;

/// XChaCha20 nonce length in bytes
pub const NONCE_LEN: usize = 24;

/// Symmetric key protecting the credential file.
///
/// Wiped from memory on drop. `Debug` never prints the key material.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct StorageKey([u8; KEY_LEN]);

impl StorageKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse a hex-encoded key. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` if the text is not exactly
    /// 64 hex characters.
    pub fn from_hex(text: &str) -> StorageResult<Self> {
        let decoded = Zeroizing::new(
            hex::decode(text.trim()).map_err(|e| StorageError::InvalidKey(e.to_string()))?,
        );
        let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            StorageError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                decoded.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Hex encoding of the key.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    /// Load the key stored at `path`, creating a fresh one if the file does
    /// not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if a new key cannot be written.
    pub fn load_or_generate(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(text) => {
                let text = Zeroizing::new(text);
                debug!(path = %path.display(), "Loaded storage key");
                Self::from_hex(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let key = Self::generate();
                write_private(path, key.to_hex().as_bytes())?;
                info!(path = %path.display(), "Generated new storage key");
                Ok(key)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StorageKey([REDACTED])")
    }
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns `StorageError::Encryption` if the cipher rejects the input.
pub fn seal(key: &StorageKey, plaintext: &[u8]) -> StorageResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| StorageError::Encryption(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`seal`].
///
/// # Errors
///
/// Returns `StorageError::Corrupted` if the blob is shorter than a nonce,
/// or `StorageError::Decryption` if authentication fails (wrong key or
/// tampered data).
pub fn open(key: &StorageKey, blob: &[u8]) -> StorageResult<Vec<u8>> {
    if blob.len() < NONCE_LEN {
        return Err(StorageError::Corrupted(format!(
            "blob is {} bytes, shorter than the {NONCE_LEN}-byte nonce",
            blob.len()
        )));
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|e| StorageError::Decryption(e.to_string()))
}

/// Create `path` readable by the owner only.
fn write_private(path: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}
