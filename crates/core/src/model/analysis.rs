use serde::{Deserialize, Serialize};

//
// ─── SCORE BAND ────────────────────────────────────────────────────────────────
//

/// Score range that selects canned feedback and transition phrasing.
///
/// Bands are ordered: a higher score never maps to a lower band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// Below 30.
    NeedsWork,
    /// 30 to 49.
    Partial,
    /// 50 to 69.
    Good,
    /// 70 to 84.
    Excellent,
    /// 85 and above.
    Outstanding,
}

impl ScoreBand {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            0..30 => ScoreBand::NeedsWork,
            30..50 => ScoreBand::Partial,
            50..70 => ScoreBand::Good,
            70..85 => ScoreBand::Excellent,
            _ => ScoreBand::Outstanding,
        }
    }

    /// Qualitative comment shown to the candidate for an answer in this band.
    #[must_use]
    pub fn feedback(self) -> &'static str {
        match self {
            ScoreBand::NeedsWork => {
                "Your answer lacks key concepts and technical details. Try to include more specific information about the topic."
            }
            ScoreBand::Partial => {
                "Your answer touches on some relevant points but could be more comprehensive. Consider explaining the concepts in more detail."
            }
            ScoreBand::Good => {
                "Good answer! You covered several important points. You could enhance it by discussing additional aspects or providing examples."
            }
            ScoreBand::Excellent => {
                "Excellent answer! You demonstrated good understanding of the topic with relevant details and concepts."
            }
            ScoreBand::Outstanding => {
                "Outstanding answer! You provided comprehensive coverage of the topic with excellent technical depth."
            }
        }
    }
}

//
// ─── ANSWER ANALYSIS ───────────────────────────────────────────────────────────
//

/// Result of scoring one answer against one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAnalysis {
    /// Final score, always within 0..=100.
    pub score: u8,
    pub feedback: String,
    pub matched_keywords: Vec<String>,
    pub matched_concepts: Vec<String>,
}

impl AnswerAnalysis {
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}
