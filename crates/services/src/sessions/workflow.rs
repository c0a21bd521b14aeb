use std::sync::Arc;

use interview_core::model::{
    AnswerAnalysis, DifficultyLevel, FeedbackReport, InterviewId, InterviewType, Role,
};
use interview_core::time::format_duration;
use interview_core::{InterviewSession, QuestionBank, SessionAggregator, SessionError};
use storage::repository::{
    InterviewRecord, InterviewRepository, MessageRecord, MessageRepository, Storage,
};

use crate::Clock;
use crate::error::InterviewError;

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewAnswerResult {
    pub analysis: AnswerAnalysis,
    pub next_prompt: String,
    pub advanced: bool,
    pub is_complete: bool,
    /// False when the assistant reply could not be written to the transcript.
    pub reply_persisted: bool,
}

/// Result of finishing an interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewReportResult {
    pub report: FeedbackReport,
    /// Elapsed time as `MM:SS`.
    pub duration: String,
}

/// Orchestrates interview start, persisted answering, and the final report.
#[derive(Clone)]
pub struct InterviewLoopService {
    clock: Clock,
    interviews: Arc<dyn InterviewRepository>,
    messages: Arc<dyn MessageRepository>,
    bank: Arc<dyn QuestionBank>,
    aggregator: SessionAggregator,
}

impl InterviewLoopService {
    /// Wrap `bank` in a `FallbackQuestionBank` to cover unpopulated tracks.
    #[must_use]
    pub fn new(
        clock: Clock,
        interviews: Arc<dyn InterviewRepository>,
        messages: Arc<dyn MessageRepository>,
        bank: Arc<dyn QuestionBank>,
    ) -> Self {
        Self {
            clock,
            interviews,
            messages,
            bank,
            aggregator: SessionAggregator::default(),
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage, bank: Arc<dyn QuestionBank>) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.interviews),
            Arc::clone(&storage.messages),
            bank,
        )
    }

    #[must_use]
    pub fn with_aggregator(mut self, aggregator: SessionAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn aggregator(&self) -> &SessionAggregator {
        &self.aggregator
    }

    /// Start a new interview and persist its opening messages.
    ///
    /// Blank topics are dropped. Nothing is persisted when the bank has no
    /// questions for the requested track.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::EmptyTopics` if no usable topic remains,
    /// `InterviewError::Session` if the bank is empty, or storage errors.
    pub async fn start_interview(
        &self,
        user_id: &str,
        interview_type: InterviewType,
        topics: Vec<String>,
        difficulty: DifficultyLevel,
    ) -> Result<InterviewSession, InterviewError> {
        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(InterviewError::EmptyTopics);
        }

        let questions = self.bank.questions(interview_type, difficulty);

        let now = self.clock.now();
        let session = InterviewSession::new(
            InterviewId::generate(),
            interview_type,
            topics.clone(),
            difficulty,
            questions,
            now,
        )?;

        let record = InterviewRecord::started(
            session.id(),
            user_id,
            interview_type,
            topics,
            difficulty,
            now,
        );
        self.interviews.create_interview(&record).await?;

        let welcome =
            self.aggregator
                .welcome_message(interview_type, session.topics(), difficulty);
        self.messages
            .append_message(&MessageRecord::new(session.id(), Role::System, welcome, now))
            .await?;

        let first = session
            .current_question()
            .ok_or(SessionError::Completed)?
            .text()
            .to_string();
        self.messages
            .append_message(&MessageRecord::new(session.id(), Role::Assistant, first, now))
            .await?;

        tracing::info!(
            interview_id = %session.id(),
            %interview_type,
            %difficulty,
            questions = session.questions().len(),
            "interview started"
        );
        Ok(session)
    }

    /// Score and persist an answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::EmptyAnswer` for blank input,
    /// `InterviewError::Session` if the session is already complete, or
    /// `InterviewError::Storage` if the user message cannot be stored. A
    /// failed reply write is logged and reported through
    /// `InterviewAnswerResult::reply_persisted` instead.
    pub async fn answer_current(
        &self,
        session: &mut InterviewSession,
        answer: &str,
    ) -> Result<InterviewAnswerResult, InterviewError> {
        if answer.trim().is_empty() {
            return Err(InterviewError::EmptyAnswer);
        }
        if session.is_complete() {
            return Err(SessionError::Completed.into());
        }

        let answered_at = self.clock.now();
        self.messages
            .append_message(&MessageRecord::new(
                session.id(),
                Role::User,
                answer,
                answered_at,
            ))
            .await?;

        let outcome = session.submit_answer(&self.aggregator, answer, answered_at)?;

        // The answer is already recorded in the session; a failed reply write
        // must not drop the outcome.
        let reply = MessageRecord::new(
            session.id(),
            Role::Assistant,
            outcome.next_prompt.clone(),
            answered_at,
        )
        .with_score(outcome.analysis.score);
        let reply_persisted = match self.messages.append_message(&reply).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    interview_id = %session.id(),
                    error = %err,
                    "assistant reply not persisted"
                );
                false
            }
        };

        tracing::debug!(
            interview_id = %session.id(),
            score = outcome.analysis.score,
            advanced = outcome.advanced,
            "answer scored"
        );

        Ok(InterviewAnswerResult {
            analysis: outcome.analysis,
            next_prompt: outcome.next_prompt,
            advanced: outcome.advanced,
            is_complete: session.is_complete(),
            reply_persisted,
        })
    }

    /// End the interview, build its report, and persist it.
    ///
    /// Safe to call again after a failed save; the completion time from the
    /// first call is kept.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` if the report cannot be saved.
    pub async fn finish(
        &self,
        session: &mut InterviewSession,
    ) -> Result<InterviewReportResult, InterviewError> {
        let now = self.clock.now();
        session.end(now);
        let completed_at = session.completed_at().unwrap_or(now);
        let duration = format_duration(completed_at - session.started_at());

        let report = session.build_report(&self.aggregator);
        self.interviews
            .save_feedback(session.id(), &report, &duration)
            .await?;

        tracing::info!(
            interview_id = %session.id(),
            score = report.overall_score,
            answered = report.question_scores.len(),
            %duration,
            "interview report saved"
        );
        Ok(InterviewReportResult { report, duration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::time::{fixed_clock, fixed_now};
    use interview_core::{FallbackQuestionBank, StaticQuestionBank};

    fn service(storage: &Storage) -> InterviewLoopService {
        let bank = FallbackQuestionBank::new(StaticQuestionBank::builtin().unwrap());
        InterviewLoopService::from_storage(fixed_clock(), storage, Arc::new(bank))
    }

    #[tokio::test]
    async fn blank_topics_are_rejected() {
        let storage = Storage::in_memory();
        let err = service(&storage)
            .start_interview(
                "u1",
                InterviewType::Frontend,
                vec!["  ".into()],
                DifficultyLevel::Beginner,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::EmptyTopics));
        assert!(storage.interviews.list_interviews("u1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_bank_persists_nothing() {
        let storage = Storage::in_memory();
        let svc = InterviewLoopService::from_storage(
            fixed_clock(),
            &storage,
            Arc::new(StaticQuestionBank::new()),
        );
        let err = svc
            .start_interview(
                "u1",
                InterviewType::Behavioral,
                vec!["Teamwork".into()],
                DifficultyLevel::Beginner,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterviewError::Session(SessionError::EmptyQuestionBank { .. })
        ));
        assert!(storage.interviews.list_interviews("u1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_persists_welcome_and_first_question() {
        let storage = Storage::in_memory();
        let session = service(&storage)
            .start_interview(
                "u1",
                InterviewType::Backend,
                vec![" Rust ".into(), "HTTP".into()],
                DifficultyLevel::Beginner,
            )
            .await
            .unwrap();

        assert_eq!(session.topics(), ["Rust", "HTTP"]);
        let record = storage.interviews.get_interview(session.id()).await.unwrap().unwrap();
        assert_eq!(record.title, "Backend Developer Interview");
        assert_eq!(record.created_at, fixed_now());

        let transcript = storage.messages.list_messages(session.id()).await.unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::System);
        assert!(transcript[0].content.starts_with("Welcome to your"));
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "What is the difference between HTTP and HTTPS?");
    }

    #[tokio::test]
    async fn blank_answer_is_rejected_without_persisting() {
        let storage = Storage::in_memory();
        let svc = service(&storage);
        let mut session = svc
            .start_interview("u1", InterviewType::Frontend, vec!["React".into()], DifficultyLevel::Intermediate)
            .await
            .unwrap();

        let err = svc.answer_current(&mut session, "   \n").await.unwrap_err();
        assert!(matches!(err, InterviewError::EmptyAnswer));
        assert_eq!(storage.messages.list_messages(session.id()).await.unwrap().len(), 2);
        assert_eq!(session.record().len(), 0);
    }

    /// Delegates to memory storage but fails the `fail_at`-th append (1-based).
    struct FlakyMessages {
        inner: storage::repository::InMemoryRepository,
        appends: std::sync::atomic::AtomicUsize,
        fail_at: usize,
    }

    #[async_trait::async_trait]
    impl MessageRepository for FlakyMessages {
        async fn append_message(
            &self,
            message: &MessageRecord,
        ) -> Result<(), storage::repository::StorageError> {
            let n = self.appends.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if n == self.fail_at {
                return Err(storage::repository::StorageError::Connection("disk full".into()));
            }
            self.inner.append_message(message).await
        }

        async fn list_messages(
            &self,
            interview_id: InterviewId,
        ) -> Result<Vec<MessageRecord>, storage::repository::StorageError> {
            self.inner.list_messages(interview_id).await
        }
    }

    #[tokio::test]
    async fn failed_reply_write_keeps_the_outcome() {
        let repo = storage::repository::InMemoryRepository::new();
        // welcome, first question, user answer, then the reply fails
        let messages = Arc::new(FlakyMessages {
            inner: repo.clone(),
            appends: std::sync::atomic::AtomicUsize::new(0),
            fail_at: 4,
        });
        let bank = FallbackQuestionBank::new(StaticQuestionBank::builtin().unwrap());
        let svc = InterviewLoopService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            messages,
            Arc::new(bank),
        );

        let mut session = svc
            .start_interview("u1", InterviewType::Frontend, vec!["React".into()], DifficultyLevel::Intermediate)
            .await
            .unwrap();
        let answer = "The virtual dom is a lightweight copy of the actual dom used for performance.";
        let result = svc.answer_current(&mut session, answer).await.unwrap();

        assert!(!result.reply_persisted);
        assert_eq!(result.analysis.score, 46);
        assert!(result.is_complete);
        assert_eq!(session.record().len(), 1);

        let transcript = repo.list_messages(session.id()).await.unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].role, Role::User);

        // the scored answer still reaches the report
        let finished = svc.finish(&mut session).await.unwrap();
        assert_eq!(finished.report.overall_score, 46);
    }

    #[tokio::test]
    async fn saved_reply_is_reported_as_persisted() {
        let storage = Storage::in_memory();
        let svc = service(&storage);
        let mut session = svc
            .start_interview("u1", InterviewType::Backend, vec!["HTTP".into()], DifficultyLevel::Beginner)
            .await
            .unwrap();
        let result = svc.answer_current(&mut session, "HTTPS adds TLS").await.unwrap();
        assert!(result.reply_persisted);
        let transcript = storage.messages.list_messages(session.id()).await.unwrap();
        assert_eq!(transcript.last().unwrap().score, Some(result.analysis.score));
    }
}
