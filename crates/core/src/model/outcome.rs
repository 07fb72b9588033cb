use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest self-assessed recall quality a learner can report.
pub const MAX_QUALITY: u8 = 5;

//
// ─── ANSWER RESULT ─────────────────────────────────────────────────────────────
//

/// Whether the learner answered the question correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerResult {
    Correct,
    Incorrect,
}

impl AnswerResult {
    /// Storage string for this result.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerResult::Correct => "correct",
            AnswerResult::Incorrect => "incorrect",
        }
    }
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// One review attempt as reported by the learner.
///
/// `quality` is the 0-5 self-assessed recall strength; the grading engine
/// rejects values above [`MAX_QUALITY`]. Duration is in whole seconds and
/// cannot be negative by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub result: AnswerResult,
    pub quality: u8,
    pub duration_secs: u32,
    pub recorded_at: DateTime<Utc>,
}

impl Outcome {
    #[must_use]
    pub fn new(
        result: AnswerResult,
        quality: u8,
        duration_secs: u32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            result,
            quality,
            duration_secs,
            recorded_at,
        }
    }

    /// True when the reported quality is inside the 0-5 scale.
    #[must_use]
    pub fn quality_in_range(&self) -> bool {
        self.quality <= MAX_QUALITY
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
