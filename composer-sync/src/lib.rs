//! # Composer Sync
//!
//! Persistence adapter for the composer editor.
//!
//! The editor reports every committed change as a
//! [`SceneChange`](composer_core::SceneChange). This crate takes those
//! changes off the editing path: a background task waits for a quiet period
//! per scene, merges everything that happened in the meantime and hands one
//! patch per scene to a [`SceneSink`]. Failed writes are reported on a
//! broadcast channel and kept until the caller asks for a retry.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod sink;

pub use adapter::{spawn_persistence, PersistenceHandle, SyncStatus};
pub use config::SyncConfig;
pub use error::{SinkError, SyncError, SyncResult};
pub use queue::{Enqueued, PendingWrite, PendingWrites};
pub use sink::{FileSink, SceneRecord, SceneSink};
