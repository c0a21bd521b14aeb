use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::aggregator::{SessionAggregator, SubmitOutcome};
use crate::model::{
    DifficultyLevel, FeedbackReport, InterviewId, InterviewType, Question, SessionRecord,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for {interview_type}/{difficulty}")]
    EmptyQuestionBank {
        interview_type: InterviewType,
        difficulty: DifficultyLevel,
    },

    #[error("session already completed")]
    Completed,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a session is in its question sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the answer to the question at `index`.
    AwaitingAnswer { index: usize },
    /// No further answers are accepted.
    Complete,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory interview session.
///
/// Steps through a fixed question list, recording one scored answer per
/// question. The session completes when the last question is answered or
/// when [`InterviewSession::end`] is called, whichever comes first.
pub struct InterviewSession {
    id: InterviewId,
    interview_type: InterviewType,
    topics: Vec<String>,
    difficulty: DifficultyLevel,
    questions: Vec<Question>,
    state: SessionState,
    record: SessionRecord,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl InterviewSession {
    /// Create a session over `questions`.
    ///
    /// `started_at` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuestionBank` if `questions` is empty.
    pub fn new(
        id: InterviewId,
        interview_type: InterviewType,
        topics: Vec<String>,
        difficulty: DifficultyLevel,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionBank {
                interview_type,
                difficulty,
            });
        }

        Ok(Self {
            id,
            interview_type,
            topics,
            difficulty,
            questions,
            state: SessionState::AwaitingAnswer { index: 0 },
            record: SessionRecord::new(),
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> InterviewId {
        self.id
    }

    #[must_use]
    pub fn interview_type(&self) -> InterviewType {
        self.interview_type
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Complete)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::AwaitingAnswer { index } => self.questions.get(index),
            SessionState::Complete => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.record.len();
        SessionProgress {
            total: self.questions.len(),
            answered,
            remaining: self.questions.len().saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// Score an answer to the current question and advance.
    ///
    /// `answered_at` should come from the services layer clock; it becomes the
    /// completion time when this was the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished.
    pub fn submit_answer(
        &mut self,
        aggregator: &SessionAggregator,
        answer: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<SubmitOutcome, SessionError> {
        let SessionState::AwaitingAnswer { index } = self.state else {
            return Err(SessionError::Completed);
        };
        let current = self.questions.get(index).ok_or(SessionError::Completed)?;
        let next = self.questions.get(index + 1);

        let outcome = aggregator.submit_answer(&mut self.record, answer, current, next);

        if outcome.advanced {
            self.state = SessionState::AwaitingAnswer { index: index + 1 };
        } else {
            self.complete(answered_at);
        }

        Ok(outcome)
    }

    /// End the session early. Idempotent; the first completion time wins.
    pub fn end(&mut self, ended_at: DateTime<Utc>) {
        self.complete(ended_at);
    }

    /// Build the report for whatever has been recorded so far.
    #[must_use]
    pub fn build_report(&self, aggregator: &SessionAggregator) -> FeedbackReport {
        aggregator.build_report(&self.record, self.interview_type, &self.topics, self.difficulty)
    }

    fn complete(&mut self, at: DateTime<Utc>) {
        self.state = SessionState::Complete;
        if self.completed_at.is_none() {
            self.completed_at = Some(at);
        }
    }
}

impl fmt::Debug for InterviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterviewSession")
            .field("id", &self.id)
            .field("interview_type", &self.interview_type)
            .field("difficulty", &self.difficulty)
            .field("questions_len", &self.questions.len())
            .field("state", &self.state)
            .field("answered", &self.record.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
