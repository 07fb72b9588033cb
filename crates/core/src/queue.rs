use chrono::{DateTime, Utc};

use crate::model::{ProgressRecord, QuestionId};

/// Builds the ordered review queue for one user from their progress records.
///
/// A record is due when it has never been scheduled or its scheduled date has
/// arrived. Ordering, most urgent first:
///
/// 1. ascending `next_review_at`, never-scheduled records first;
/// 2. ascending ease factor, so harder questions surface before easier ones
///    that are equally overdue;
/// 3. ascending question id, as a stable deterministic tie-break.
///
/// Pure and restartable: the same records, `now`, and `limit` always produce
/// the same queue. At most `limit` entries are returned; a zero limit yields
/// an empty queue.
#[must_use]
pub fn build_due_queue<'a, I>(records: I, now: DateTime<Utc>, limit: usize) -> Vec<QuestionId>
where
    I: IntoIterator<Item = &'a ProgressRecord>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut due: Vec<&ProgressRecord> = records
        .into_iter()
        .filter(|record| record.is_due(now))
        .collect();

    // Option sorts None first, which is exactly the "never reviewed is most
    // urgent" rule.
    due.sort_by(|a, b| {
        (a.next_review_at, a.ease_factor, &a.question_id)
            .cmp(&(b.next_review_at, b.ease_factor, &b.question_id))
    });
    due.truncate(limit);

    due.into_iter()
        .map(|record| record.question_id.clone())
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
