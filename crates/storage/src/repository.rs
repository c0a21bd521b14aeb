use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_core::model::{DifficultyLevel, FeedbackReport, InterviewId, InterviewType, Role};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of one interview and, once finished, its report.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewRecord {
    pub id: InterviewId,
    pub user_id: String,
    pub title: String,
    pub interview_type: InterviewType,
    pub topics: Vec<String>,
    pub difficulty: DifficultyLevel,
    pub score: Option<u8>,
    pub feedback: Option<FeedbackReport>,
    /// Elapsed time as `MM:SS`.
    pub duration: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InterviewRecord {
    /// A freshly started interview with no score or feedback yet.
    #[must_use]
    pub fn started(
        id: InterviewId,
        user_id: impl Into<String>,
        interview_type: InterviewType,
        topics: Vec<String>,
        difficulty: DifficultyLevel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            title: format!("{} Interview", interview_type.title()),
            interview_type,
            topics,
            difficulty,
            score: None,
            feedback: None,
            duration: None,
            created_at,
        }
    }
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub interview_id: InterviewId,
    pub role: Role,
    pub content: String,
    /// Score shown next to assistant replies that follow a scored answer.
    pub score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    #[must_use]
    pub fn new(
        interview_id: InterviewId,
        role: Role,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            interview_id,
            role,
            content: content.into(),
            score: None,
            created_at,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }
}

/// Repository contract for interviews and their final reports.
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Persist a new interview.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists, or other storage errors.
    async fn create_interview(&self, interview: &InterviewRecord) -> Result<(), StorageError>;

    /// Fetch an interview by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_interview(&self, id: InterviewId) -> Result<Option<InterviewRecord>, StorageError>;

    /// List a user's interviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_interviews(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<InterviewRecord>, StorageError>;

    /// Attach the final report; the interview score becomes the report's overall score.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the interview is missing, or other storage errors.
    async fn save_feedback(
        &self,
        id: InterviewId,
        report: &FeedbackReport,
        duration: &str,
    ) -> Result<(), StorageError>;
}

/// Repository contract for interview transcripts.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append one message to an interview transcript.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the message cannot be stored.
    async fn append_message(&self, message: &MessageRecord) -> Result<(), StorageError>;

    /// Full transcript, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_messages(&self, interview_id: InterviewId)
    -> Result<Vec<MessageRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    interviews: Arc<Mutex<HashMap<InterviewId, InterviewRecord>>>,
    messages: Arc<Mutex<Vec<MessageRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InterviewRepository for InMemoryRepository {
    async fn create_interview(&self, interview: &InterviewRecord) -> Result<(), StorageError> {
        let mut guard = self
            .interviews
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&interview.id) {
            return Err(StorageError::Conflict);
        }
        guard.insert(interview.id, interview.clone());
        Ok(())
    }

    async fn get_interview(&self, id: InterviewId) -> Result<Option<InterviewRecord>, StorageError> {
        let guard = self
            .interviews
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_interviews(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<InterviewRecord>, StorageError> {
        let guard = self
            .interviews
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<_> = guard
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }

    async fn save_feedback(
        &self,
        id: InterviewId,
        report: &FeedbackReport,
        duration: &str,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .interviews
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let interview = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        interview.score = Some(report.overall_score);
        interview.feedback = Some(report.clone());
        interview.duration = Some(duration.to_string());
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for InMemoryRepository {
    async fn append_message(&self, message: &MessageRecord) -> Result<(), StorageError> {
        {
            let interviews = self
                .interviews
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            if !interviews.contains_key(&message.interview_id) {
                return Err(StorageError::NotFound);
            }
        }
        let mut guard = self
            .messages
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(message.clone());
        Ok(())
    }

    async fn list_messages(
        &self,
        interview_id: InterviewId,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let guard = self
            .messages
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<_> = guard
            .iter()
            .filter(|m| m.interview_id == interview_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep insertion order
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub interviews: Arc<dyn InterviewRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let interviews: Arc<dyn InterviewRepository> = Arc::new(repo.clone());
        let messages: Arc<dyn MessageRepository> = Arc::new(repo);
        Self {
            interviews,
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::{QuestionScore, Resource};
    use interview_core::time::fixed_now;

    fn build_interview(user: &str, minutes_ago: i64) -> InterviewRecord {
        InterviewRecord::started(
            InterviewId::generate(),
            user,
            InterviewType::Frontend,
            vec!["React".into()],
            DifficultyLevel::Intermediate,
            fixed_now() - chrono::Duration::minutes(minutes_ago),
        )
    }

    fn build_report(score: u8) -> FeedbackReport {
        FeedbackReport {
            strengths: vec!["s".into()],
            improvements: vec!["i".into()],
            overall_score: score,
            detailed_analysis: "d".into(),
            question_scores: vec![QuestionScore {
                question: "q".into(),
                answer: "a".into(),
                score,
                feedback: "f".into(),
            }],
            resources: vec![Resource::new("t", "d")],
        }
    }

    #[test]
    fn started_record_derives_title() {
        let record = build_interview("u1", 0);
        assert_eq!(record.title, "Frontend Developer Interview");
        assert!(record.score.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let repo = InMemoryRepository::new();
        let interview = build_interview("u1", 0);
        repo.create_interview(&interview).await.unwrap();
        let err = repo.create_interview(&interview).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn lists_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        let old = build_interview("u1", 30);
        let new = build_interview("u1", 1);
        let other = build_interview("u2", 0);
        for i in [&old, &new, &other] {
            repo.create_interview(i).await.unwrap();
        }

        let listed = repo.list_interviews("u1", 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, new.id);
        assert_eq!(listed[1].id, old.id);

        let limited = repo.list_interviews("u1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn same_timestamp_ties_break_by_id() {
        let repo = InMemoryRepository::new();
        let mut ids = Vec::new();
        for _ in 0..8 {
            let interview = build_interview("u1", 0);
            ids.push(interview.id);
            repo.create_interview(&interview).await.unwrap();
        }
        ids.sort();

        let listed: Vec<_> = repo
            .list_interviews("u1", 10)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn save_feedback_sets_score() {
        let repo = InMemoryRepository::new();
        let interview = build_interview("u1", 0);
        repo.create_interview(&interview).await.unwrap();

        repo.save_feedback(interview.id, &build_report(72), "03:10")
            .await
            .unwrap();

        let stored = repo.get_interview(interview.id).await.unwrap().unwrap();
        assert_eq!(stored.score, Some(72));
        assert_eq!(stored.duration.as_deref(), Some("03:10"));
        assert_eq!(stored.feedback.unwrap().overall_score, 72);

        let missing = repo
            .save_feedback(InterviewId::generate(), &build_report(1), "00:01")
            .await
            .unwrap_err();
        assert!(matches!(missing, StorageError::NotFound));
    }

    #[tokio::test]
    async fn messages_keep_order_and_require_interview() {
        let repo = InMemoryRepository::new();
        let interview = build_interview("u1", 0);
        repo.create_interview(&interview).await.unwrap();

        let now = fixed_now();
        repo.append_message(&MessageRecord::new(interview.id, Role::System, "hi", now))
            .await
            .unwrap();
        repo.append_message(&MessageRecord::new(interview.id, Role::Assistant, "Q1", now))
            .await
            .unwrap();

        let messages = repo.list_messages(interview.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "Q1");

        let orphan = MessageRecord::new(InterviewId::generate(), Role::User, "x", now);
        assert!(matches!(
            repo.append_message(&orphan).await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}
