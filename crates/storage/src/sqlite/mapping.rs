use progress_core::model::{
    EaseFactor, Outcome, ProgressRecord, ProgressStatus, QuestionId, UserId,
};
use sqlx::Row;

use crate::repository::{StorageError, VersionedRecord};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressRecord, StorageError> {
    let status_str: String = row.try_get("status").map_err(ser)?;
    let status = ProgressStatus::parse(&status_str).map_err(ser)?;

    let ease_scaled = u32_from_i64("ease_factor", row.try_get("ease_factor").map_err(ser)?)?;
    let interval_days = u32_from_i64("interval_days", row.try_get("interval_days").map_err(ser)?)?;

    let history_json: String = row.try_get("history").map_err(ser)?;
    let history: Vec<Outcome> = serde_json::from_str(&history_json).map_err(ser)?;

    Ok(ProgressRecord::from_persisted(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
        status,
        EaseFactor::from_scaled(ease_scaled),
        interval_days,
        row.try_get("last_review_at").map_err(ser)?,
        row.try_get("next_review_at").map_err(ser)?,
        history,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_versioned_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<VersionedRecord, StorageError> {
    let record = map_progress_row(row)?;
    let version: i64 = row.try_get("version").map_err(ser)?;
    Ok(VersionedRecord { record, version })
}

pub(crate) fn history_to_json(record: &ProgressRecord) -> Result<String, StorageError> {
    serde_json::to_string(record.history()).map_err(ser)
}
