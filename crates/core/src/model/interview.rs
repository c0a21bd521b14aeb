use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InterviewKindError {
    #[error("unknown interview type: {0}")]
    UnknownType(String),

    #[error("unknown difficulty level: {0}")]
    UnknownDifficulty(String),

    #[error("unknown message role: {0}")]
    UnknownRole(String),
}

//
// ─── INTERVIEW TYPE ────────────────────────────────────────────────────────────
//

/// Track an interview is run for. Selects the question bank section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewType {
    Frontend,
    Backend,
    Fullstack,
    SystemDesign,
    Behavioral,
}

impl InterviewType {
    pub const ALL: [InterviewType; 5] = [
        InterviewType::Frontend,
        InterviewType::Backend,
        InterviewType::Fullstack,
        InterviewType::SystemDesign,
        InterviewType::Behavioral,
    ];

    /// Stable slug used in storage, URLs and CLI flags.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            InterviewType::Frontend => "frontend",
            InterviewType::Backend => "backend",
            InterviewType::Fullstack => "fullstack",
            InterviewType::SystemDesign => "system-design",
            InterviewType::Behavioral => "behavioral",
        }
    }

    /// Human-facing role title, e.g. "Frontend Developer".
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            InterviewType::Frontend => "Frontend Developer",
            InterviewType::Backend => "Backend Developer",
            InterviewType::Fullstack => "Full Stack Developer",
            InterviewType::SystemDesign => "System Design",
            InterviewType::Behavioral => "Behavioral Interview",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for InterviewType {
    type Err = InterviewKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ty| ty.slug() == needle)
            .ok_or_else(|| InterviewKindError::UnknownType(s.to_string()))
    }
}

//
// ─── DIFFICULTY LEVEL ──────────────────────────────────────────────────────────
//

/// Session-level difficulty selected by the candidate.
///
/// Distinct from the per-question integer difficulty (1-5) stored on `Question`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DifficultyLevel {
    type Err = InterviewKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.slug() == needle)
            .ok_or_else(|| InterviewKindError::UnknownDifficulty(s.to_string()))
    }
}

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

/// Speaker of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InterviewKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "assistant" => Ok(Role::Assistant),
            "user" => Ok(Role::User),
            other => Err(InterviewKindError::UnknownRole(other.to_string())),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
