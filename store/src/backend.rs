//! Key-value backends with atomic single-key replacement.

use std::io::Write;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Storage primitive visible to every process of the app.
///
/// Implementations must make `set` atomic per key: a concurrent `get` sees
/// the old bytes or the new bytes, never a mix.
pub trait KeyValueBackend: Send + Sync {
    /// Read the bytes stored under `key`, `None` if nothing was written.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Process-local backend, used by tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Directory-backed store shared between processes.
///
/// Each key is a `{dir}/{key}.json` file. Writes go to a uniquely named
/// temp file in the same directory, are fsynced, then renamed over the
/// target, which is atomic on the same filesystem.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open the store for `namespace` under `root`, creating it if needed.
    pub fn open(root: impl AsRef<Path>, namespace: &str) -> StoreResult<Self> {
        validate_key(namespace)?;
        let dir = root.as_ref().join(namespace);
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        match std::fs::read(self.record_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };

        let tmp_path = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        let write_result = (|| {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(value)?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, self.record_path(key))
        })();

        if let Err(source) = write_result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(io_err(source));
        }

        debug!(key, bytes = value.len(), "Record replaced");
        Ok(())
    }
}
