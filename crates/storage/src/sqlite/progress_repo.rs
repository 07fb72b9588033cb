use progress_core::model::{ProgressRecord, QuestionId, UserId};

use super::{
    SqliteRepository,
    mapping::{history_to_json, map_progress_row, map_versioned_row},
};
use crate::repository::{ProgressRepository, StorageError, VersionedRecord};

const COLUMNS: &str = "user_id, question_id, status, ease_factor, interval_days, \
                       last_review_at, next_review_at, history, version, created_at, updated_at";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
    ) -> Result<Option<VersionedRecord>, StorageError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM user_progress WHERE user_id = ?1 AND question_id = ?2"
        );

        let row = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(question_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_versioned_row).transpose()
    }

    async fn put(
        &self,
        record: &ProgressRecord,
        expected_version: Option<i64>,
    ) -> Result<i64, StorageError> {
        let history = history_to_json(record)?;
        let interval = i64::from(record.interval_days);
        let ease = i64::from(record.ease_factor.scaled());

        match expected_version {
            None => {
                // INSERT OR IGNORE: a concurrent insert of the same pair
                // leaves rows_affected at 0, which is our version conflict.
                let res = sqlx::query(
                    r"
                    INSERT OR IGNORE INTO user_progress (
                        user_id, question_id, status, ease_factor, interval_days,
                        last_review_at, next_review_at, history, version,
                        created_at, updated_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)
                    ",
                )
                .bind(record.user_id.as_str())
                .bind(record.question_id.as_str())
                .bind(record.status.as_str())
                .bind(ease)
                .bind(interval)
                .bind(record.last_review_at)
                .bind(record.next_review_at)
                .bind(history)
                .bind(record.created_at)
                .bind(record.updated_at)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;

                if res.rows_affected() == 0 {
                    return Err(StorageError::VersionConflict);
                }
                Ok(1)
            }
            Some(expected) => {
                let res = sqlx::query(
                    r"
                    UPDATE user_progress SET
                        status = ?3,
                        ease_factor = ?4,
                        interval_days = ?5,
                        last_review_at = ?6,
                        next_review_at = ?7,
                        history = ?8,
                        updated_at = ?9,
                        version = version + 1
                    WHERE user_id = ?1 AND question_id = ?2 AND version = ?10
                    ",
                )
                .bind(record.user_id.as_str())
                .bind(record.question_id.as_str())
                .bind(record.status.as_str())
                .bind(ease)
                .bind(interval)
                .bind(record.last_review_at)
                .bind(record.next_review_at)
                .bind(history)
                .bind(record.updated_at)
                .bind(expected)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;

                if res.rows_affected() == 0 {
                    return Err(StorageError::VersionConflict);
                }
                Ok(expected + 1)
            }
        }
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM user_progress WHERE user_id = ?1 ORDER BY question_id ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_progress_row(row)?);
        }
        Ok(out)
    }
}
