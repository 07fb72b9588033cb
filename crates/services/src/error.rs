//! Shared error types for the services crate.

use thiserror::Error;

use progress_core::grading::GradeError;
use storage::repository::StorageError;

/// Errors emitted by `SchedulerService`.
///
/// Version conflicts are retried internally; everything that reaches the
/// caller is final for this attempt. Retrying a failed `record_answer` is
/// the caller's decision and is not a replay: a successful retry appends to
/// history like any other call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedulerServiceError {
    /// The outcome was rejected before any state changed.
    #[error(transparent)]
    Grading(#[from] GradeError),

    /// The store could not serve the operation, including a compare-and-swap
    /// that kept conflicting after the retry budget.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),
}

impl From<StorageError> for SchedulerServiceError {
    fn from(err: StorageError) -> Self {
        Self::StorageUnavailable(err)
    }
}
