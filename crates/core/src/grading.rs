use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{
    EaseFactor, MAX_QUALITY, Outcome, ProgressRecord, ProgressStatus, QuestionId, UserId,
};

/// Lowest quality that counts as a successful recall; anything below is a lapse.
pub const SUCCESS_THRESHOLD: u8 = 3;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradeError {
    #[error("recall quality must be in 0..={MAX_QUALITY}, got {provided}")]
    InvalidQuality { provided: u8 },
}

//
// ─── PARAMETERS ────────────────────────────────────────────────────────────────
//

/// Tunable scheduling constants.
///
/// Defaults are the standard SM-2 values. They are parameters rather than
/// constants so product can adjust step lengths and the mastery bar without
/// touching the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingParams {
    /// Interval after the first successful review (and after relearning).
    pub first_interval_days: u32,
    /// Interval after the second consecutive successful review.
    pub second_interval_days: u32,
    /// Interval a lapse resets to.
    pub lapse_interval_days: u32,
    /// Interval a record must reach before it can be considered mastered.
    pub mastered_threshold_days: u32,
    /// Minimum quality required on the review that crosses the threshold.
    pub mastered_min_quality: u8,
}

impl Default for GradingParams {
    fn default() -> Self {
        Self {
            first_interval_days: 1,
            second_interval_days: 6,
            lapse_interval_days: 1,
            mastered_threshold_days: 21,
            mastered_min_quality: 4,
        }
    }
}

//
// ─── GRADING ENGINE ────────────────────────────────────────────────────────────
//

/// Pure SM-2 grading: maps a prior record and one outcome to the next record.
///
/// No I/O and no hidden clock; given the same inputs the output is
/// bit-identical. The prior record is never mutated, so the caller owns the
/// decision of whether and how the result is persisted.
///
/// # Examples
///
/// ```
/// use progress_core::grading::GradingEngine;
/// use progress_core::model::{AnswerResult, Outcome, ProgressStatus, QuestionId, UserId};
/// use progress_core::time::fixed_now;
///
/// let engine = GradingEngine::new();
/// let now = fixed_now();
/// let outcome = Outcome::new(AnswerResult::Correct, 5, 14, now);
///
/// let record = engine
///     .grade(&UserId::new("u1"), &QuestionId::new("q1"), None, outcome, now)?;
/// assert_eq!(record.status, ProgressStatus::Review);
/// assert_eq!(record.interval_days, 1);
/// # Ok::<(), progress_core::grading::GradeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct GradingEngine {
    params: GradingParams,
}

impl GradingEngine {
    /// Engine with the default SM-2 parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with custom parameters.
    #[must_use]
    pub fn with_params(params: GradingParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> &GradingParams {
        &self.params
    }

    /// Grade one review attempt.
    ///
    /// With no prior record a default one (status new, interval 0, ease 2.50)
    /// is synthesized first. The outcome is appended to the returned record's
    /// history; `next_review_at` is exactly `now + interval` days.
    ///
    /// # Errors
    ///
    /// Returns `GradeError::InvalidQuality` when the outcome's quality is
    /// outside the 0-5 scale. Nothing is computed in that case.
    pub fn grade(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
        prior: Option<&ProgressRecord>,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, GradeError> {
        if !outcome.quality_in_range() {
            return Err(GradeError::InvalidQuality {
                provided: outcome.quality,
            });
        }

        let mut record = match prior {
            Some(existing) => existing.clone(),
            None => ProgressRecord::new(user_id.clone(), question_id.clone(), now),
        };

        let quality = outcome.quality;
        let ease = record.ease_factor.adjusted(quality);

        let (interval, status) = if quality < SUCCESS_THRESHOLD {
            self.lapse_step()
        } else {
            self.success_step(&record, ease, quality)
        };

        record.status = status;
        record.ease_factor = ease;
        record.interval_days = interval;
        record.last_review_at = Some(now);
        record.next_review_at = Some(now + Duration::days(i64::from(interval)));
        record.updated_at = now;
        record.push_outcome(outcome);

        Ok(record)
    }

    fn lapse_step(&self) -> (u32, ProgressStatus) {
        // A graded record must carry a positive interval; interval 0 is
        // reserved for never-scheduled records.
        let interval = self.params.lapse_interval_days.max(1);
        (interval, ProgressStatus::Learning)
    }

    fn success_step(
        &self,
        prior: &ProgressRecord,
        ease: EaseFactor,
        quality: u8,
    ) -> (u32, ProgressStatus) {
        let interval = match prior.status {
            // First success, whether brand new or relearning after a lapse.
            ProgressStatus::New | ProgressStatus::Learning => self.params.first_interval_days,
            // Second consecutive success: the prior interval is still at the
            // first step, so jump to the second.
            _ if prior.interval_days <= self.params.first_interval_days => {
                self.params.second_interval_days
            }
            // Mature record: multiplicative growth with the updated ease.
            _ => ease.grow_interval(prior.interval_days),
        };

        // Successes only ever promote; a lapse is the sole path back down.
        let status = if prior.status == ProgressStatus::Mastered
            || (interval >= self.params.mastered_threshold_days
                && quality >= self.params.mastered_min_quality)
        {
            ProgressStatus::Mastered
        } else {
            ProgressStatus::Review
        };

        (interval.max(1), status)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerResult;
    use crate::time::fixed_now;

    fn user() -> UserId {
        UserId::new("u1")
    }

    fn question() -> QuestionId {
        QuestionId::new("q1")
    }

    fn outcome(quality: u8) -> Outcome {
        let result = if quality >= SUCCESS_THRESHOLD {
            AnswerResult::Correct
        } else {
            AnswerResult::Incorrect
        };
        Outcome::new(result, quality, 15, fixed_now())
    }

    fn grade(
        engine: &GradingEngine,
        prior: Option<&ProgressRecord>,
        quality: u8,
    ) -> ProgressRecord {
        engine
            .grade(&user(), &question(), prior, outcome(quality), fixed_now())
            .unwrap()
    }

    #[test]
    fn first_grading_synthesizes_record() {
        let engine = GradingEngine::new();
        let record = grade(&engine, None, 5);

        assert_eq!(record.user_id, user());
        assert_eq!(record.question_id, question());
        assert_eq!(record.status, ProgressStatus::Review);
        assert_eq!(record.interval_days, 1);
        assert_eq!(
            record.next_review_at,
            Some(fixed_now() + Duration::days(1))
        );
        // quality 5 lifts ease above the 2.50 default
        assert!(record.ease_factor.scaled() > 250);
        assert_eq!(record.history().len(), 1);
    }

    #[test]
    fn quality_above_scale_is_rejected() {
        let engine = GradingEngine::new();
        let err = engine
            .grade(&user(), &question(), None, outcome(6), fixed_now())
            .unwrap_err();
        assert_eq!(err, GradeError::InvalidQuality { provided: 6 });
    }

    #[test]
    fn successful_intervals_progress_1_6_then_multiplied() {
        let engine = GradingEngine::new();

        let first = grade(&engine, None, 4);
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.status, ProgressStatus::Review);

        let second = grade(&engine, Some(&first), 4);
        assert_eq!(second.interval_days, 6);
        // quality 4 leaves ease at 2.50
        assert_eq!(second.ease_factor.scaled(), 250);

        let third = grade(&engine, Some(&second), 4);
        // round(6 * 2.50) = 15, long enough for mastery at quality >= 4
        assert_eq!(third.interval_days, 15);
        assert_eq!(third.status, ProgressStatus::Review);
    }

    #[test]
    fn lapse_resets_interval_regardless_of_prior() {
        let engine = GradingEngine::new();
        let mut prior = ProgressRecord::new(user(), question(), fixed_now());
        prior.status = ProgressStatus::Review;
        prior.ease_factor = EaseFactor::from_scaled(250);
        prior.interval_days = 6;
        prior.next_review_at = Some(fixed_now());

        for quality in 0..SUCCESS_THRESHOLD {
            let after = grade(&engine, Some(&prior), quality);
            assert_eq!(after.interval_days, 1);
            assert_eq!(after.status, ProgressStatus::Learning);
            assert!(after.ease_factor.scaled() < 250);
            assert!(after.ease_factor >= EaseFactor::MINIMUM);
        }
    }

    #[test]
    fn lapse_scenario_from_six_day_review() {
        // prior = {interval: 6, ef: 2.50, status: review}, quality 2
        let engine = GradingEngine::new();
        let mut prior = ProgressRecord::new(user(), question(), fixed_now());
        prior.status = ProgressStatus::Review;
        prior.interval_days = 6;

        let after = grade(&engine, Some(&prior), 2);
        assert_eq!(after.interval_days, 1);
        assert_eq!(after.status, ProgressStatus::Learning);
        assert_eq!(after.ease_factor.scaled(), 218);
    }

    #[test]
    fn ease_never_drops_below_floor_for_any_quality() {
        let engine = GradingEngine::new();
        let mut record = ProgressRecord::new(user(), question(), fixed_now());
        record.ease_factor = EaseFactor::MINIMUM;
        record.status = ProgressStatus::Review;
        record.interval_days = 4;

        for quality in 0..=MAX_QUALITY {
            let after = grade(&engine, Some(&record), quality);
            assert!(after.ease_factor >= EaseFactor::MINIMUM);
        }
    }

    #[test]
    fn next_review_is_last_review_plus_interval() {
        let engine = GradingEngine::new();
        let mut record = grade(&engine, None, 4);
        for quality in [3, 4, 5, 2, 4] {
            record = grade(&engine, Some(&record), quality);
            let last = record.last_review_at.unwrap();
            let next = record.next_review_at.unwrap();
            assert_eq!(next, last + Duration::days(i64::from(record.interval_days)));
        }
    }

    #[test]
    fn mastery_requires_threshold_and_strong_recall() {
        let engine = GradingEngine::new();
        let mut prior = ProgressRecord::new(user(), question(), fixed_now());
        prior.status = ProgressStatus::Review;
        prior.interval_days = 10;

        // 10 * 2.50 = 25 days >= 21, quality 4 -> mastered
        let mastered = grade(&engine, Some(&prior), 4);
        assert_eq!(mastered.interval_days, 25);
        assert_eq!(mastered.status, ProgressStatus::Mastered);

        // same interval growth at quality 3 (ease 2.36 -> 24 days) stays review
        let plain = grade(&engine, Some(&prior), 3);
        assert_eq!(plain.interval_days, 24);
        assert_eq!(plain.status, ProgressStatus::Review);
    }

    #[test]
    fn mastered_record_survives_a_modest_success() {
        let engine = GradingEngine::new();
        let mut prior = ProgressRecord::new(user(), question(), fixed_now());
        prior.status = ProgressStatus::Mastered;
        prior.interval_days = 30;

        // quality 3 is a success but below the mastery bar; status only ever
        // promotes on success, so the record stays mastered
        let after = grade(&engine, Some(&prior), 3);
        assert_eq!(after.status, ProgressStatus::Mastered);
        assert!(after.interval_days > 30);
    }

    #[test]
    fn mastered_record_lapses_back_to_learning() {
        let engine = GradingEngine::new();
        let mut prior = ProgressRecord::new(user(), question(), fixed_now());
        prior.status = ProgressStatus::Mastered;
        prior.interval_days = 30;

        let after = grade(&engine, Some(&prior), 1);
        assert_eq!(after.status, ProgressStatus::Learning);
        assert_eq!(after.interval_days, 1);
    }

    #[test]
    fn relearning_after_lapse_repeats_the_step_ladder() {
        let engine = GradingEngine::new();
        let mut prior = ProgressRecord::new(user(), question(), fixed_now());
        prior.status = ProgressStatus::Review;
        prior.interval_days = 15;

        let lapsed = grade(&engine, Some(&prior), 0);
        assert_eq!(lapsed.status, ProgressStatus::Learning);

        let relearned = grade(&engine, Some(&lapsed), 4);
        assert_eq!(relearned.interval_days, 1);
        assert_eq!(relearned.status, ProgressStatus::Review);

        let consolidated = grade(&engine, Some(&relearned), 4);
        assert_eq!(consolidated.interval_days, 6);
    }

    #[test]
    fn grading_is_deterministic_and_leaves_prior_untouched() {
        let engine = GradingEngine::new();
        let prior = grade(&engine, None, 4);
        let snapshot = prior.clone();

        let a = grade(&engine, Some(&prior), 3);
        let b = grade(&engine, Some(&prior), 3);

        assert_eq!(a, b);
        assert_eq!(prior, snapshot);
    }

    #[test]
    fn history_keeps_prior_entries_and_appends() {
        let engine = GradingEngine::new();
        let first = grade(&engine, None, 2);
        let second = grade(&engine, Some(&first), 5);

        assert_eq!(second.history().len(), 2);
        assert_eq!(second.history()[0].quality, 2);
        assert_eq!(second.history()[1].quality, 5);
    }

    #[test]
    fn custom_params_change_the_step_ladder() {
        let engine = GradingEngine::with_params(GradingParams {
            first_interval_days: 2,
            second_interval_days: 8,
            lapse_interval_days: 1,
            mastered_threshold_days: 30,
            mastered_min_quality: 5,
        });

        let first = grade(&engine, None, 4);
        assert_eq!(first.interval_days, 2);

        let second = grade(&engine, Some(&first), 4);
        assert_eq!(second.interval_days, 8);
    }
}
