use interview_core::model::{FeedbackReport, InterviewId, Role};
use sqlx::Row;

use crate::repository::{InterviewRecord, MessageRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn score_from_i64(field: &'static str, v: Option<i64>) -> Result<Option<u8>, StorageError> {
    v.map(|raw| {
        u8::try_from(raw)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| StorageError::Serialization(format!("invalid {field}: {raw}")))
    })
    .transpose()
}

pub(crate) fn map_interview_row(row: &sqlx::sqlite::SqliteRow) -> Result<InterviewRecord, StorageError> {
    let id: InterviewId = row.try_get::<String, _>("id").map_err(ser)?.parse().map_err(ser)?;
    let topics: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("topics").map_err(ser)?).map_err(ser)?;
    let feedback: Option<FeedbackReport> = row
        .try_get::<Option<String>, _>("feedback")
        .map_err(ser)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(ser)?;

    Ok(InterviewRecord {
        id,
        user_id: row.try_get("user_id").map_err(ser)?,
        title: row.try_get("title").map_err(ser)?,
        interview_type: row
            .try_get::<String, _>("interview_type")
            .map_err(ser)?
            .parse()
            .map_err(ser)?,
        topics,
        difficulty: row
            .try_get::<String, _>("difficulty")
            .map_err(ser)?
            .parse()
            .map_err(ser)?,
        score: score_from_i64("score", row.try_get("score").map_err(ser)?)?,
        feedback,
        duration: row.try_get("duration").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_message_row(row: &sqlx::sqlite::SqliteRow) -> Result<MessageRecord, StorageError> {
    let interview_id: InterviewId = row
        .try_get::<String, _>("interview_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let role: Role = row.try_get::<String, _>("role").map_err(ser)?.parse().map_err(ser)?;

    Ok(MessageRecord {
        interview_id,
        role,
        content: row.try_get("content").map_err(ser)?,
        score: score_from_i64("score", row.try_get("score").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
