use interview_core::model::InterviewId;

use super::SqliteRepository;
use super::mapping::{conn, map_message_row};
use crate::repository::{MessageRecord, MessageRepository, StorageError};

#[async_trait::async_trait]
impl MessageRepository for SqliteRepository {
    async fn append_message(&self, message: &MessageRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO messages (interview_id, role, content, score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(message.interview_id.to_string())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.score.map(i64::from))
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let orphan = e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation());
            if orphan { StorageError::NotFound } else { conn(e) }
        })?;

        tracing::trace!(interview_id = %message.interview_id, role = %message.role, "message appended");
        Ok(())
    }

    async fn list_messages(
        &self,
        interview_id: InterviewId,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT interview_id, role, content, score, created_at
            FROM messages
            WHERE interview_id = ?1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(interview_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_message_row).collect()
    }
}
