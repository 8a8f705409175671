//! Persistence backends for the serialized credential set.
//!
//! A gateway stores one opaque blob. [`EncryptedFileGateway`] is the
//! production backend; [`MemoryGateway`] keeps the blob in memory and can be
//! told to fail, which the tests use to exercise write-failure handling.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::crypto::{self, StorageKey};
use crate::error::{StorageError, StorageResult};

/// Durable storage for the serialized credential set.
pub trait PersistenceGateway: Send + Sync {
    /// Replace the stored blob.
    fn save(&self, blob: &[u8]) -> StorageResult<()>;

    /// Read the stored blob, or `None` if nothing has been saved yet.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Arc<G> {
    fn save(&self, blob: &[u8]) -> StorageResult<()> {
        (**self).save(blob)
    }

    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        (**self).load()
    }
}

/// Encrypted single-file backend.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous file intact.
#[derive(Debug)]
pub struct EncryptedFileGateway {
    path: PathBuf,
    key: StorageKey,
}

impl EncryptedFileGateway {
    pub fn new(path: impl Into<PathBuf>, key: StorageKey) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceGateway for EncryptedFileGateway {
    fn save(&self, blob: &[u8]) -> StorageResult<()> {
        let sealed = crypto::seal(&self.key, blob)?;
        let temp = self.temp_path();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        {
            use std::io::Write;
            let mut file = fs::File::create(&temp)?;
            file.write_all(&sealed)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), bytes = sealed.len(), "Credential file written");
        Ok(())
    }

    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        let sealed = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        crypto::open(&self.key, &sealed).map(Some)
    }
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    blob: Mutex<Option<Vec<u8>>>,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-stored blob.
    pub fn with_blob(blob: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
            ..Self::default()
        }
    }

    /// Make every following `save` fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make every following `load` fail (or succeed again).
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Last successfully saved blob.
    pub fn stored(&self) -> Option<Vec<u8>> {
        self.blob.lock().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl PersistenceGateway for MemoryGateway {
    fn save(&self, blob: &[u8]) -> StorageResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("write rejected".to_string()));
        }
        *self.blob.lock() = Some(blob.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("read rejected".to_string()));
        }
        Ok(self.blob.lock().clone())
    }
}
