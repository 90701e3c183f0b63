use std::fmt::{self, Display};

/// Failure reported by a [`DurableStorage`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend refused the operation (quota exceeded, access denied, ...).
    Unavailable(String),
    /// Stored bytes could not be decoded.
    Corrupt { key: String, reason: String },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => {
                write!(f, "storage unavailable: {msg}")
            }
            StorageError::Corrupt { key, reason } => {
                write!(f, "corrupt entry '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Durable client-side key/value storage.
///
/// Writes must be durable when `set`/`remove` return `Ok`. Implementations
/// are shared between the entitlement and progress stores, so they take
/// `&self` and handle their own synchronisation.
pub trait DurableStorage: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`. Repeated writes to one key must not
    /// accumulate in the backend; progress is checkpointed on every time
    /// update.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Keys currently stored under `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Persistence operation that failed, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistenceOp {
    LoadEntitlement,
    SaveEntitlement,
    LoadProgress,
    SaveProgress,
    ClearProgress,
}

impl Display for PersistenceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PersistenceOp::LoadEntitlement => "load_entitlement",
            PersistenceOp::SaveEntitlement => "save_entitlement",
            PersistenceOp::LoadProgress => "load_progress",
            PersistenceOp::SaveProgress => "save_progress",
            PersistenceOp::ClearProgress => "clear_progress",
        };
        f.write_str(label)
    }
}

/// Sink for best-effort persistence failures.
///
/// Stores never propagate these to playback; they are reported here instead.
pub trait PersistenceObserver: Send + Sync + fmt::Debug {
    fn persistence_failed(&self, op: PersistenceOp, key: &str, error: &StorageError);
}
