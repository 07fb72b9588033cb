use chrono::{DateTime, Utc};

use progress_core::{
    grading::{GradingEngine, GradingParams},
    model::{Outcome, ProgressRecord, QuestionId, UserId},
    queue::build_due_queue,
    time::Clock,
};
use storage::repository::{Storage, StorageError};

use crate::error::SchedulerServiceError;

/// How many times a conflicting `record_answer` write is retried before the
/// conflict is surfaced as a storage failure.
const MAX_PUT_ATTEMPTS: u32 = 3;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates the grading engine and the progress store.
///
/// This is the boundary the web layer calls: `record_answer` grades one
/// attempt and persists the result, `due_queue` lists what a user should
/// review next. The service holds no cross-call state of its own; the store
/// is the only shared resource.
///
/// Concurrent `record_answer` calls for the same (user, question) pair are
/// serialized by the store's compare-and-swap: a writer that loses the race
/// reloads the record and regrades against the winner's state, up to
/// [`MAX_PUT_ATTEMPTS`] times. Calls for different pairs proceed in parallel.
pub struct SchedulerService {
    clock: Clock,
    engine: GradingEngine,
    storage: Storage,
}

impl SchedulerService {
    /// Service with default SM-2 parameters and the system clock.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            clock: Clock::default(),
            engine: GradingEngine::new(),
            storage,
        }
    }

    /// Override the grading parameters.
    #[must_use]
    pub fn with_params(mut self, params: GradingParams) -> Self {
        self.engine = GradingEngine::with_params(params);
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Grade one answer and persist the updated record.
    ///
    /// Reads the prior record (absent on the first attempt), runs the grading
    /// engine, and writes the result back with a compare-and-swap on the
    /// stored version. A lost race reloads and regrades; after
    /// [`MAX_PUT_ATTEMPTS`] conflicts the failure is surfaced. The write is
    /// all-or-nothing, so a failed call never leaves a partial update.
    ///
    /// Deliberately not idempotent: replaying the same outcome appends to
    /// history and advances the schedule again.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerServiceError::Grading` for an out-of-range quality
    /// (nothing is persisted) and `SchedulerServiceError::StorageUnavailable`
    /// when the store fails or the retry budget is exhausted.
    pub async fn record_answer(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
        outcome: Outcome,
    ) -> Result<ProgressRecord, SchedulerServiceError> {
        let now = self.clock.now();

        for attempt in 1..=MAX_PUT_ATTEMPTS {
            let prior = self.storage.progress.get(user_id, question_id).await?;
            let (prior_record, expected_version) = match prior.as_ref() {
                Some(versioned) => (Some(&versioned.record), Some(versioned.version)),
                None => (None, None),
            };

            let graded =
                self.engine
                    .grade(user_id, question_id, prior_record, outcome.clone(), now)?;

            match self.storage.progress.put(&graded, expected_version).await {
                Ok(_) => {
                    tracing::debug!(
                        user = %user_id,
                        question = %question_id,
                        status = graded.status.as_str(),
                        interval_days = graded.interval_days,
                        "answer recorded"
                    );
                    return Ok(graded);
                }
                Err(StorageError::VersionConflict) if attempt < MAX_PUT_ATTEMPTS => {
                    tracing::warn!(
                        user = %user_id,
                        question = %question_id,
                        attempt,
                        "version conflict, reloading record"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(SchedulerServiceError::StorageUnavailable(
            StorageError::VersionConflict,
        ))
    }

    /// Questions due for review, most urgent first, at most `limit` entries.
    ///
    /// Read-only and side-effect free; an empty queue is a normal result,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerServiceError::StorageUnavailable` if the user's
    /// records cannot be listed. Never returns a partial queue.
    pub async fn due_queue(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QuestionId>, SchedulerServiceError> {
        let records = self.storage.progress.list_by_user(user_id).await?;
        Ok(build_due_queue(&records, now, limit))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
