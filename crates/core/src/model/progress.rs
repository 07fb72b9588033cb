use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EaseFactor, Outcome, QuestionId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised when rebuilding a record from persisted state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressStateError {
    #[error("unknown progress status: {0}")]
    UnknownStatus(String),
}

//
// ─── PROGRESS STATUS ───────────────────────────────────────────────────────────
//

/// Mastery stage of a (user, question) pair.
///
/// Advances monotonically on successful reviews; a lapse (quality below 3)
/// regresses the record to `Learning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Never graded.
    New,
    /// In the short-interval (re)learning steps.
    Learning,
    /// Graduated to multiplicative interval growth.
    Review,
    /// Held a long interval with a strong recall.
    Mastered,
}

impl ProgressStatus {
    /// Storage string for this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::New => "new",
            ProgressStatus::Learning => "learning",
            ProgressStatus::Review => "review",
            ProgressStatus::Mastered => "mastered",
        }
    }

    /// Parses a storage string back into a status.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStateError::UnknownStatus` for unrecognized input.
    pub fn parse(s: &str) -> Result<Self, ProgressStateError> {
        match s {
            "new" => Ok(ProgressStatus::New),
            "learning" => Ok(ProgressStatus::Learning),
            "review" => Ok(ProgressStatus::Review),
            "mastered" => Ok(ProgressStatus::Mastered),
            other => Err(ProgressStateError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Scheduling state for one (user, question) pair.
///
/// Created on the first grading call and from then on replaced wholesale by
/// the grading engine; callers decide persistence. `next_review_at` is always
/// `last_review_at + interval_days` once a review has happened, and both are
/// unset before the first one.
///
/// The outcome history is append-only: entries can be added through
/// [`push_outcome`](Self::push_outcome) but never mutated or removed. It
/// exists for analytics; scheduling reads only the current ease, interval,
/// and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub status: ProgressStatus,
    pub ease_factor: EaseFactor,
    pub interval_days: u32,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    history: Vec<Outcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Fresh record for a pair that has never been graded.
    #[must_use]
    pub fn new(user_id: UserId, question_id: QuestionId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            question_id,
            status: ProgressStatus::New,
            ease_factor: EaseFactor::DEFAULT,
            interval_days: 0,
            last_review_at: None,
            next_review_at: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a record from persisted state.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        question_id: QuestionId,
        status: ProgressStatus,
        ease_factor: EaseFactor,
        interval_days: u32,
        last_review_at: Option<DateTime<Utc>>,
        next_review_at: Option<DateTime<Utc>>,
        history: Vec<Outcome>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            question_id,
            status,
            ease_factor,
            interval_days,
            last_review_at,
            next_review_at,
            history,
            created_at,
            updated_at,
        }
    }

    /// Past outcomes, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Outcome] {
        &self.history
    }

    /// Appends one outcome to the history. Append-only: there is no way to
    /// edit or drop an entry once recorded.
    pub fn push_outcome(&mut self, outcome: Outcome) {
        self.history.push(outcome);
    }

    /// Due iff never scheduled or the scheduled date has arrived.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at {
            None => true,
            Some(at) => at <= now,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
