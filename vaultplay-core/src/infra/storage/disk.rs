use std::{
    fmt,
    path::{Path, PathBuf},
};

use vaultplay_contracts::{DurableStorage, StorageError};

/// Root directory for the on-disk client store.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DiskStorageRoot(PathBuf);

impl DiskStorageRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for DiskStorageRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DiskStorageRoot").field(&self.0).finish()
    }
}

/// A thin typed wrapper over `cacache` used as durable key/value storage.
///
/// Uses the synchronous `cacache` API so a write is on disk before
/// [`DurableStorage::set`] returns.
///
/// `cacache` appends to a key's index bucket and keeps every blob it was
/// given, so an overwrite removes the key's bucket and blob before writing.
/// Each key holds at most one bucket and one blob. Blobs are stored as
/// `{key}\n{value}` so two keys with the same value never share a blob.
#[derive(Clone, Debug)]
pub struct DiskStorage {
    root: DiskStorageRoot,
}

impl DiskStorage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|err| {
            StorageError::Unavailable(format!(
                "cannot create store at {}: {err}",
                root.display()
            ))
        })?;
        Ok(Self {
            root: DiskStorageRoot::new(root),
        })
    }

    pub fn root(&self) -> &DiskStorageRoot {
        &self.root
    }

    /// Delete the key's index bucket together with its blob.
    fn remove_entry(&self, key: &str) -> Result<(), StorageError> {
        cacache::index::RemoveOpts::new()
            .remove_fully(true)
            .remove_sync(self.root.as_path(), key)
            .map_err(|err| map_cacache_error(key, err))
    }
}

fn encode_entry(key: &str, value: &str) -> Vec<u8> {
    let mut entry = Vec::with_capacity(key.len() + 1 + value.len());
    entry.extend_from_slice(key.as_bytes());
    entry.push(b'\n');
    entry.extend_from_slice(value.as_bytes());
    entry
}

fn decode_entry(key: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
    let corrupt = |reason: String| StorageError::Corrupt {
        key: key.to_string(),
        reason,
    };
    let value = bytes
        .strip_prefix(key.as_bytes())
        .and_then(|rest| rest.strip_prefix(b"\n"))
        .ok_or_else(|| corrupt("entry does not belong to this key".into()))?;
    String::from_utf8(value.to_vec()).map_err(|err| corrupt(err.to_string()))
}

fn map_cacache_error(key: &str, err: cacache::Error) -> StorageError {
    match err {
        cacache::Error::IntegrityError(err) => StorageError::Corrupt {
            key: key.to_string(),
            reason: format!("integrity check failed ({err})"),
        },
        cacache::Error::SizeMismatch(wanted, actual) => StorageError::Corrupt {
            key: key.to_string(),
            reason: format!("size mismatch: wanted={wanted}, actual={actual}"),
        },
        cacache::Error::IoError(_, msg) => {
            StorageError::Unavailable(format!("cacache I/O error: {msg}"))
        }
        other => StorageError::Unavailable(format!("cacache error: {other}")),
    }
}

impl DurableStorage for DiskStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let meta = cacache::metadata_sync(self.root.as_path(), key)
            .map_err(|err| map_cacache_error(key, err))?;
        if meta.is_none() {
            return Ok(None);
        }

        let bytes = cacache::read_sync(self.root.as_path(), key)
            .map_err(|err| map_cacache_error(key, err))?;
        decode_entry(key, bytes).map(Some)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let entry = encode_entry(key, value);
        let current = cacache::metadata_sync(self.root.as_path(), key)
            .map_err(|err| map_cacache_error(key, err))?;
        if let Some(meta) = current {
            if meta.integrity.check(&entry).is_ok() {
                return Ok(());
            }
            self.remove_entry(key)?;
        }

        cacache::write_sync(self.root.as_path(), key, entry)
            .map(|_| ())
            .map_err(|err| map_cacache_error(key, err))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let exists = cacache::metadata_sync(self.root.as_path(), key)
            .map_err(|err| map_cacache_error(key, err))?
            .is_some();
        if !exists {
            return Ok(());
        }
        self.remove_entry(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in cacache::list_sync(self.root.as_path()) {
            let meta = match entry {
                Ok(meta) => meta,
                // Nothing written yet: the index directory does not exist.
                Err(cacache::Error::IoError(err, _))
                    if err.kind() == std::io::ErrorKind::NotFound =>
                {
                    continue;
                }
                Err(err) => return Err(map_cacache_error(prefix, err)),
            };
            if meta.key.starts_with(prefix) {
                keys.push(meta.key);
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = DiskStorage::open(dir.path()).unwrap();
            storage.set("progress:s:e", "42").unwrap();
            storage.set("progress:s:e", "43.5").unwrap();
        }

        let reopened = DiskStorage::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("progress:s:e").unwrap().as_deref(),
            Some("43.5")
        );
        assert_eq!(reopened.get("missing").unwrap(), None);
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                if entry.file_type().unwrap().is_dir() {
                    file_count(&entry.path())
                } else {
                    1
                }
            })
            .sum()
    }

    #[test]
    fn overwriting_a_key_keeps_one_bucket_and_one_blob() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).unwrap();
        storage.set("entitlement", "{}").unwrap();
        let baseline = file_count(dir.path());

        for step in 0..500 {
            let offset = f64::from(step) * 0.25;
            storage.set("progress:s:e", &offset.to_string()).unwrap();
        }
        storage.set("progress:s:e", "124.75").unwrap();

        assert_eq!(file_count(dir.path()), baseline + 2);
        assert_eq!(
            storage.get("progress:s:e").unwrap().as_deref(),
            Some("124.75")
        );
        assert_eq!(storage.get("entitlement").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn equal_values_under_different_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).unwrap();
        storage.set("progress:a:1", "42").unwrap();
        storage.set("progress:b:1", "42").unwrap();

        storage.remove("progress:a:1").unwrap();
        storage.set("progress:b:1", "43").unwrap();
        storage.set("progress:b:1", "42").unwrap();

        assert_eq!(storage.get("progress:a:1").unwrap(), None);
        assert_eq!(storage.get("progress:b:1").unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn remove_and_prefix_listing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).unwrap();
        storage.set("progress:a:1", "1").unwrap();
        storage.set("progress:b:2", "2").unwrap();
        storage.set("entitlement", "{}").unwrap();

        assert_eq!(
            storage.keys_with_prefix("progress:").unwrap(),
            vec!["progress:a:1", "progress:b:2"]
        );

        storage.remove("progress:a:1").unwrap();
        storage.remove("never-written").unwrap();
        assert_eq!(storage.get("progress:a:1").unwrap(), None);
    }
}
