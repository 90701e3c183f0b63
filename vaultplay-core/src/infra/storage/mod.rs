//! [`DurableStorage`](vaultplay_contracts::DurableStorage) backends.

#[cfg(feature = "disk")]
#[cfg_attr(docsrs, doc(cfg(feature = "disk")))]
pub mod disk;
pub mod memory;

#[cfg(feature = "disk")]
pub use disk::{DiskStorage, DiskStorageRoot};
pub use memory::MemoryStorage;
