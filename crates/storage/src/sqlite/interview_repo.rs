use interview_core::model::{FeedbackReport, InterviewId};

use super::SqliteRepository;
use super::mapping::{conn, map_interview_row, ser};
use crate::repository::{InterviewRecord, InterviewRepository, StorageError};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait::async_trait]
impl InterviewRepository for SqliteRepository {
    async fn create_interview(&self, interview: &InterviewRecord) -> Result<(), StorageError> {
        let topics = serde_json::to_string(&interview.topics).map_err(ser)?;
        let feedback = interview
            .feedback
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO interviews (id, user_id, title, interview_type, topics, difficulty, score, feedback, duration, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(interview.id.to_string())
        .bind(&interview.user_id)
        .bind(&interview.title)
        .bind(interview.interview_type.slug())
        .bind(topics)
        .bind(interview.difficulty.slug())
        .bind(interview.score.map(i64::from))
        .bind(feedback)
        .bind(interview.duration.as_deref())
        .bind(interview.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                conn(e)
            }
        })?;

        tracing::debug!(interview_id = %interview.id, user_id = %interview.user_id, "interview stored");
        Ok(())
    }

    async fn get_interview(&self, id: InterviewId) -> Result<Option<InterviewRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, title, interview_type, topics, difficulty, score, feedback, duration, created_at
            FROM interviews
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_interview_row).transpose()
    }

    async fn list_interviews(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<InterviewRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, title, interview_type, topics, difficulty, score, feedback, duration, created_at
            FROM interviews
            WHERE user_id = ?1
            ORDER BY created_at DESC, id ASC
            LIMIT ?2
            ",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_interview_row).collect()
    }

    async fn save_feedback(
        &self,
        id: InterviewId,
        report: &FeedbackReport,
        duration: &str,
    ) -> Result<(), StorageError> {
        let feedback = serde_json::to_string(report).map_err(ser)?;

        let res = sqlx::query(
            r"
            UPDATE interviews
            SET score = ?2, feedback = ?3, duration = ?4
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(i64::from(report.overall_score))
        .bind(feedback)
        .bind(duration)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        tracing::debug!(interview_id = %id, score = report.overall_score, "feedback saved");
        Ok(())
    }
}
