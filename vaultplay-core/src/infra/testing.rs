//! Recording doubles for the engine's collaborators.
//!
//! Every double hands out a cloneable log handle, so a test (or the CLI
//! simulation) can keep inspecting what the machine did after the double has
//! been moved into it.

use parking_lot::Mutex;
use std::sync::Arc;
use vaultplay_contracts::{
    DurableStorage, GateSurface, MediaPrimitive, PersistenceObserver,
    PersistenceOp, StorageError,
};
use vaultplay_model::GateView;

use super::storage::MemoryStorage;

/// Command issued to a [`MediaPrimitive`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    Play,
    Pause,
    Seek(f64),
}

/// Media primitive that records commands instead of decoding anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingMedia {
    log: Arc<Mutex<Vec<MediaCommand>>>,
}

impl RecordingMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<MediaCommand> {
        self.log.lock().clone()
    }

    pub fn last(&self) -> Option<MediaCommand> {
        self.log.lock().last().copied()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl MediaPrimitive for RecordingMedia {
    fn play(&mut self) {
        self.log.lock().push(MediaCommand::Play);
    }

    fn pause(&mut self) {
        self.log.lock().push(MediaCommand::Pause);
    }

    fn seek(&mut self, offset_seconds: f64) {
        self.log.lock().push(MediaCommand::Seek(offset_seconds));
    }
}

/// Surface that records every view and error it is handed.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    views: Arc<Mutex<Vec<GateView>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn views(&self) -> Vec<GateView> {
        self.views.lock().clone()
    }

    pub fn current(&self) -> GateView {
        self.views.lock().last().cloned().unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl GateSurface for RecordingSurface {
    fn show(&mut self, view: &GateView) {
        self.views.lock().push(view.clone());
    }

    fn playback_failed(&mut self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

/// Observer that keeps every reported failure.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    failures: Arc<Mutex<Vec<(PersistenceOp, String)>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<(PersistenceOp, String)> {
        self.failures.lock().clone()
    }
}

impl PersistenceObserver for RecordingObserver {
    fn persistence_failed(&self, op: PersistenceOp, key: &str, _error: &StorageError) {
        self.failures.lock().push((op, key.to_string()));
    }
}

/// Storage whose writes can be switched to fail, as when the browser store
/// reports its quota exhausted. Reads keep working.
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: Mutex<bool>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if *self.fail_writes.lock() {
            Err(StorageError::Unavailable("quota exceeded".into()))
        } else {
            Ok(())
        }
    }
}

impl DurableStorage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.inner.remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.keys_with_prefix(prefix)
    }
}
