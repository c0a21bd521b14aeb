use serde::{Deserialize, Serialize};

/// Per-question line of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question: String,
    pub answer: String,
    pub score: u8,
    pub feedback: String,
}

/// Suggested follow-up learning material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub description: String,
}

impl Resource {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// End-of-session feedback document.
///
/// Serialized with camelCase keys so stored reports match the shape the
/// dashboard already reads (`score`, `detailedAnalysis`, `questionScores`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    #[serde(rename = "score")]
    pub overall_score: u8,
    pub detailed_analysis: String,
    pub question_scores: Vec<QuestionScore>,
    pub resources: Vec<Resource>,
}
