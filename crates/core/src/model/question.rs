use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question difficulty must be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single interview question together with its scoring rubric.
///
/// Questions are loaded from a question bank when a session starts and are
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "question")]
    text: String,
    keywords: Vec<String>,
    expected_concepts: Vec<String>,
    difficulty: u8,
}

impl Question {
    /// Creates a validated question.
    ///
    /// Empty keyword or concept lists are accepted; the analyzer scores that
    /// rubric component as zero.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if `text` is blank.
    /// Returns `QuestionError::InvalidDifficulty` if `difficulty` is outside 1-5.
    pub fn new<I, J, S, T>(
        text: impl Into<String>,
        keywords: I,
        expected_concepts: J,
        difficulty: u8,
    ) -> Result<Self, QuestionError>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if !(1..=5).contains(&difficulty) {
            return Err(QuestionError::InvalidDifficulty(difficulty));
        }

        Ok(Self {
            text,
            keywords: keywords.into_iter().map(Into::into).collect(),
            expected_concepts: expected_concepts.into_iter().map(Into::into).collect(),
            difficulty,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn expected_concepts(&self) -> &[String] {
        &self.expected_concepts
    }

    #[must_use]
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }
}

/// Unvalidated wire shape used when a bank is deserialized from JSON.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDraft {
    question: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    expected_concepts: Vec<String>,
    difficulty: u8,
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        Question::new(
            draft.question,
            draft.keywords,
            draft.expected_concepts,
            draft.difficulty,
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_text() {
        let err = Question::new("  ", ["a"], ["b"], 1).unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn rejects_out_of_range_difficulty() {
        assert_eq!(
            Question::new("Q", ["a"], ["b"], 0).unwrap_err(),
            QuestionError::InvalidDifficulty(0)
        );
        assert_eq!(
            Question::new("Q", ["a"], ["b"], 6).unwrap_err(),
            QuestionError::InvalidDifficulty(6)
        );
    }

    #[test]
    fn preserves_rubric_order() {
        let q = Question::new("Q", ["b", "a"], ["Second", "First"], 3).unwrap();
        assert_eq!(q.keywords(), ["b", "a"]);
        assert_eq!(q.expected_concepts(), ["Second", "First"]);
    }

    #[test]
    fn deserializes_bank_shape_with_validation() {
        let json = r#"{
            "question": "What is HTTP?",
            "keywords": ["http"],
            "expectedConcepts": ["Protocol"],
            "difficulty": 1
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.text(), "What is HTTP?");
        assert_eq!(q.expected_concepts(), ["Protocol"]);

        let bad = r#"{"question": "Q", "difficulty": 9}"#;
        assert!(serde_json::from_str::<Question>(bad).is_err());
    }
}
