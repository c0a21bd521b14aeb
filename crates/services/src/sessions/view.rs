use chrono::{DateTime, Utc};
use std::sync::Arc;

use interview_core::model::{DifficultyLevel, FeedbackReport, InterviewId, InterviewType};
use storage::repository::{
    InterviewRecord, InterviewRepository, MessageRecord, MessageRepository, Storage, StorageError,
};

use crate::error::InterviewError;

/// Presentation-agnostic list item for a stored interview.
///
/// Timestamps stay typed; the caller formats them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewListItem {
    pub id: InterviewId,
    pub title: String,
    pub interview_type: InterviewType,
    pub difficulty: DifficultyLevel,
    pub topics: Vec<String>,
    pub score: Option<u8>,
    pub duration: Option<String>,
    pub questions_answered: usize,
    pub created_at: DateTime<Utc>,
}

impl InterviewListItem {
    #[must_use]
    pub fn from_record(record: &InterviewRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            interview_type: record.interview_type,
            difficulty: record.difficulty,
            topics: record.topics.clone(),
            score: record.score,
            duration: record.duration.clone(),
            questions_answered: answered(record),
            created_at: record.created_at,
        }
    }
}

/// Dashboard totals across a user's interviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total_interviews: usize,
    /// Rounded mean; unscored interviews count as 0.
    pub average_score: u8,
    pub questions_answered: usize,
}

impl HistoryStats {
    #[must_use]
    pub fn from_records(records: &[InterviewRecord]) -> Self {
        let n = records.len();
        if n == 0 {
            return Self::default();
        }
        let total: usize = records.iter().map(|r| usize::from(r.score.unwrap_or(0))).sum();
        // half-up, matching the report's overall score
        let average = (2 * total + n) / (2 * n);
        Self {
            total_interviews: n,
            average_score: u8::try_from(average).unwrap_or(u8::MAX),
            questions_answered: records.iter().map(answered).sum(),
        }
    }
}

fn answered(record: &InterviewRecord) -> usize {
    record
        .feedback
        .as_ref()
        .map_or(0, |f| f.question_scores.len())
}

/// Read-side access to stored interviews.
#[derive(Clone)]
pub struct InterviewHistoryService {
    interviews: Arc<dyn InterviewRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl InterviewHistoryService {
    #[must_use]
    pub fn new(
        interviews: Arc<dyn InterviewRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            interviews,
            messages,
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.interviews), Arc::clone(&storage.messages))
    }

    /// Most recent interviews for `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<InterviewListItem>, InterviewError> {
        let records = self.interviews.list_interviews(user_id, limit).await?;
        Ok(records.iter().map(InterviewListItem::from_record).collect())
    }

    /// Stored report for an interview, or `None` if it was never finished.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` with `StorageError::NotFound` if the
    /// interview does not exist.
    pub async fn get_report(
        &self,
        interview_id: InterviewId,
    ) -> Result<Option<FeedbackReport>, InterviewError> {
        let record = self
            .interviews
            .get_interview(interview_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        Ok(record.feedback)
    }

    /// Full transcript, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` on repository failures.
    pub async fn transcript(
        &self,
        interview_id: InterviewId,
    ) -> Result<Vec<MessageRecord>, InterviewError> {
        Ok(self.messages.list_messages(interview_id).await?)
    }

    /// Totals across every interview `user_id` has taken.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` on repository failures.
    pub async fn stats(&self, user_id: &str) -> Result<HistoryStats, InterviewError> {
        let records = self.interviews.list_interviews(user_id, u32::MAX).await?;
        Ok(HistoryStats::from_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::QuestionScore;
    use interview_core::time::fixed_now;

    fn record(score: Option<u8>, answered: usize) -> InterviewRecord {
        let mut record = InterviewRecord::started(
            InterviewId::generate(),
            "u1",
            InterviewType::Frontend,
            vec!["CSS".into()],
            DifficultyLevel::Beginner,
            fixed_now(),
        );
        record.score = score;
        if score.is_some() {
            record.feedback = Some(FeedbackReport {
                strengths: Vec::new(),
                improvements: Vec::new(),
                overall_score: score.unwrap_or(0),
                detailed_analysis: String::new(),
                question_scores: (0..answered)
                    .map(|_| QuestionScore {
                        question: "q".into(),
                        answer: "a".into(),
                        score: 50,
                        feedback: "f".into(),
                    })
                    .collect(),
                resources: Vec::new(),
            });
        }
        record
    }

    #[test]
    fn stats_of_nothing_are_zero() {
        assert_eq!(HistoryStats::from_records(&[]), HistoryStats::default());
    }

    #[test]
    fn unscored_interviews_pull_average_down() {
        let stats = HistoryStats::from_records(&[record(Some(80), 3), record(None, 0), record(Some(71), 2)]);
        assert_eq!(stats.total_interviews, 3);
        // (80 + 0 + 71) / 3 = 50.33
        assert_eq!(stats.average_score, 50);
        assert_eq!(stats.questions_answered, 5);
    }

    #[test]
    fn average_rounds_half_up() {
        let stats = HistoryStats::from_records(&[record(Some(70), 1), record(Some(71), 1)]);
        assert_eq!(stats.average_score, 71);
    }

    #[tokio::test]
    async fn missing_interview_report_is_not_found() {
        let history = InterviewHistoryService::from_storage(&Storage::in_memory());
        let err = history.get_report(InterviewId::generate()).await.unwrap_err();
        assert!(matches!(err, InterviewError::Storage(StorageError::NotFound)));
    }
}
