#![forbid(unsafe_code)]

//! Durable storage for progress records.
//!
//! The core only ever sees the `ProgressRepository` trait; adapters here
//! provide an in-memory implementation for tests and a sqlite one for real
//! deployments. Writes are guarded by an optimistic version so concurrent
//! gradings of the same (user, question) pair cannot lose updates.

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, ProgressRepository, Storage, StorageError, VersionedRecord,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
