//! # Vaultplay Core
//!
//! Client-side playback gating engine: decides whether premium content may
//! play, enforces a bounded preview window, converts purchases into local
//! entitlements and checkpoints resume positions.
//!
//! ## Overview
//!
//! - **Access decisions**: a single [`gate::decide`] function
//! - **Entitlements**: [`entitlement::EntitlementStore`], shared through `Arc`
//! - **Resume progress**: [`progress::ProgressStore`], withheld past 90%
//! - **Preview window**: [`playback::PreviewTimer`] with generation-checked
//!   tickets delivered by a [`playback::PreviewScheduler`]
//! - **Playback**: [`playback::PlaybackMachine`] and its async driver
//!   [`playback::PlaybackSession`]
//!
//! ## Feature Flags
//!
//! - `disk` (default): `cacache`-backed [`infra::storage::DiskStorage`]
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use vaultplay_core::{
//!     entitlement::EntitlementStore,
//!     infra::{TracingPersistenceObserver, storage::MemoryStorage},
//! };
//! use vaultplay_model::ContentRef;
//!
//! let store = EntitlementStore::open(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(TracingPersistenceObserver),
//! );
//! let episode = ContentRef::new("night-shift", "s01e07").unwrap();
//! store.unlock_content(&episode);
//! assert!(store.is_entitled(&episode));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Entitlement store with durable write-through and change notification
pub mod entitlement;

/// Error types and error handling utilities
pub mod error;

/// Access decision shared by playback and presentation
pub mod gate;

/// Storage backends, clocks, observers and recording doubles
pub mod infra;

/// Preview timer, gate overlay and the playback state machine
pub mod playback;

/// Preview, completion and skip tunables
pub mod policy;

/// Resume-position checkpoints
pub mod progress;

pub use error::{GateError, Result};
pub use policy::GatePolicy;
