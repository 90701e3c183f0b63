//! Trait surfaces that describe the collaborators of the Vaultplay engine.

pub mod media;
pub mod storage;

pub use media::{GateSurface, MediaPrimitive};
pub use storage::{
    DurableStorage, PersistenceObserver, PersistenceOp, StorageError,
};

/// Frequently used trait combinators for engine hosts.
pub mod prelude {
    pub use super::media::{GateSurface, MediaPrimitive};
    pub use super::storage::{DurableStorage, PersistenceObserver};
}
