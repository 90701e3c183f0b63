//! Collaborator implementations: storage backends, clocks, observers and
//! recording doubles.

pub mod observer;
pub mod storage;
pub mod testing;
pub mod time;

pub use observer::TracingPersistenceObserver;
pub use time::{SystemTimeProvider, TimeProvider, VirtualTimeProvider};
