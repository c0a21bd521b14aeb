use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{DifficultyLevel, InterviewType, Question, QuestionError};

/// Source of interview questions for a `(type, difficulty)` pair.
///
/// Implementations return questions in the order they should be asked.
pub trait QuestionBank: Send + Sync {
    fn questions(&self, interview_type: InterviewType, difficulty: DifficultyLevel) -> Vec<Question>;
}

//
// ─── STATIC BANK ───────────────────────────────────────────────────────────────
//

/// In-memory question bank keyed by interview type then difficulty.
///
/// Deserializes from the nested JSON shape
/// `{ "frontend": { "beginner": [ { "question": ..., ... } ] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticQuestionBank {
    sections: BTreeMap<InterviewType, BTreeMap<DifficultyLevel, Vec<Question>>>,
}

impl StaticQuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `questions` to the end of the `(interview_type, difficulty)` section.
    #[must_use]
    pub fn with_questions(
        mut self,
        interview_type: InterviewType,
        difficulty: DifficultyLevel,
        questions: impl IntoIterator<Item = Question>,
    ) -> Self {
        self.sections
            .entry(interview_type)
            .or_default()
            .entry(difficulty)
            .or_default()
            .extend(questions);
        self
    }

    /// Number of questions across all sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The product's built-in frontend and backend questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if a built-in entry fails validation.
    pub fn builtin() -> Result<Self, QuestionError> {
        use DifficultyLevel::{Advanced, Beginner, Intermediate};
        use InterviewType::{Backend, Frontend};

        let bank = Self::new()
            .with_questions(
                Frontend,
                Beginner,
                [Question::new(
                    "What is the difference between HTML, CSS, and JavaScript?",
                    [
                        "html",
                        "structure",
                        "css",
                        "styling",
                        "javascript",
                        "behavior",
                        "markup",
                        "presentation",
                        "logic",
                    ],
                    ["HTML for structure", "CSS for styling", "JavaScript for behavior"],
                    1,
                )?],
            )
            .with_questions(
                Frontend,
                Intermediate,
                [Question::new(
                    "Explain how React's virtual DOM works and its benefits.",
                    [
                        "virtual",
                        "dom",
                        "react",
                        "reconciliation",
                        "diff",
                        "performance",
                        "fiber",
                        "rendering",
                        "update",
                    ],
                    [
                        "Virtual DOM concept",
                        "Reconciliation process",
                        "Performance benefits",
                    ],
                    3,
                )?],
            )
            .with_questions(
                Frontend,
                Advanced,
                [Question::new(
                    "How would you implement a custom React hook for data fetching with caching?",
                    [
                        "custom",
                        "hook",
                        "data",
                        "fetching",
                        "caching",
                        "useeffect",
                        "usestate",
                        "usecallback",
                        "usememo",
                    ],
                    [
                        "Custom hook patterns",
                        "Caching strategies",
                        "Dependency management",
                    ],
                    5,
                )?],
            )
            .with_questions(
                Backend,
                Beginner,
                [Question::new(
                    "What is the difference between HTTP and HTTPS?",
                    [
                        "http",
                        "https",
                        "ssl",
                        "tls",
                        "encryption",
                        "security",
                        "certificate",
                        "protocol",
                    ],
                    ["Protocol differences", "Security features", "SSL/TLS"],
                    1,
                )?],
            )
            .with_questions(
                Backend,
                Intermediate,
                [Question::new(
                    "How would you design a RESTful API for a blog system?",
                    [
                        "rest",
                        "api",
                        "design",
                        "resources",
                        "endpoints",
                        "blog",
                        "posts",
                        "users",
                        "comments",
                        "crud",
                    ],
                    ["Resource modeling", "Endpoint design", "CRUD operations"],
                    3,
                )?],
            )
            .with_questions(
                Backend,
                Advanced,
                [Question::new(
                    "Design a distributed system for handling millions of requests per second.",
                    [
                        "distributed",
                        "system",
                        "scalability",
                        "load",
                        "balancing",
                        "caching",
                        "database",
                        "sharding",
                    ],
                    [
                        "System architecture",
                        "Scalability patterns",
                        "Performance optimization",
                    ],
                    5,
                )?],
            );

        Ok(bank)
    }
}

impl QuestionBank for StaticQuestionBank {
    fn questions(&self, interview_type: InterviewType, difficulty: DifficultyLevel) -> Vec<Question> {
        self.sections
            .get(&interview_type)
            .and_then(|by_level| by_level.get(&difficulty))
            .cloned()
            .unwrap_or_default()
    }
}

//
// ─── FALLBACK ──────────────────────────────────────────────────────────────────
//

/// Wraps a bank and substitutes a fixed section when a lookup comes back empty.
///
/// This is the caller-side policy for unknown or unpopulated tracks; the
/// underlying bank is never asked to invent questions.
#[derive(Debug, Clone)]
pub struct FallbackQuestionBank<B> {
    inner: B,
    fallback: (InterviewType, DifficultyLevel),
}

impl<B: QuestionBank> FallbackQuestionBank<B> {
    /// Falls back to frontend / intermediate.
    #[must_use]
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            fallback: (InterviewType::Frontend, DifficultyLevel::Intermediate),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, interview_type: InterviewType, difficulty: DifficultyLevel) -> Self {
        self.fallback = (interview_type, difficulty);
        self
    }

    #[must_use]
    pub fn fallback(&self) -> (InterviewType, DifficultyLevel) {
        self.fallback
    }
}

impl<B: QuestionBank> QuestionBank for FallbackQuestionBank<B> {
    fn questions(&self, interview_type: InterviewType, difficulty: DifficultyLevel) -> Vec<Question> {
        let questions = self.inner.questions(interview_type, difficulty);
        if !questions.is_empty() {
            return questions;
        }
        let (ty, level) = self.fallback;
        self.inner.questions(ty, level)
    }
}
