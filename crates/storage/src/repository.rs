use async_trait::async_trait;
use progress_core::model::{ProgressRecord, QuestionId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The compare-and-swap on `put` observed a different version than the
    /// caller expected; reload and retry.
    #[error("version conflict")]
    VersionConflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── VERSIONED RECORD ──────────────────────────────────────────────────────────
//

/// A progress record together with the storage version it was read at.
///
/// The version is opaque to callers; it only exists to be handed back to
/// [`ProgressRepository::put`] so the write can detect a concurrent update.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRecord {
    pub record: ProgressRecord,
    pub version: i64,
}

//
// ─── REPOSITORY CONTRACT ───────────────────────────────────────────────────────
//

/// Keyed storage of progress records, one per (user, question) pair.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record for a pair, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached.
    async fn get(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
    ) -> Result<Option<VersionedRecord>, StorageError>;

    /// Persist a record, compare-and-swapping on its version.
    ///
    /// `expected_version` of `None` asserts the pair has no record yet
    /// (insert); `Some(v)` asserts the stored version is still `v` (update).
    /// The write is all-or-nothing. Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::VersionConflict` when the assertion fails,
    /// other `StorageError`s when the store misbehaves.
    async fn put(
        &self,
        record: &ProgressRecord,
        expected_version: Option<i64>,
    ) -> Result<i64, StorageError>;

    /// All records for one user, ordered by question id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>, StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository for tests and prototyping.
///
/// Versioning behaves exactly like the sqlite adapter: inserts start at 1,
/// every successful update increments by 1.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<HashMap<(UserId, QuestionId), (i64, ProgressRecord)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
    ) -> Result<Option<VersionedRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(user_id.clone(), question_id.clone()))
            .map(|(version, record)| VersionedRecord {
                record: record.clone(),
                version: *version,
            }))
    }

    async fn put(
        &self,
        record: &ProgressRecord,
        expected_version: Option<i64>,
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = (record.user_id.clone(), record.question_id.clone());

        let new_version = match (expected_version, guard.get(&key)) {
            (None, None) => 1,
            (Some(expected), Some((current, _))) if *current == expected => expected + 1,
            _ => return Err(StorageError::VersionConflict),
        };

        guard.insert(key, (new_version, record.clone()));
        Ok(new_version)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<ProgressRecord> = guard
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|(_, (_, record))| record.clone())
            .collect();
        records.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        Ok(records)
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Progress repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
