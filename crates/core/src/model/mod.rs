mod analysis;
mod ids;
mod interview;
mod question;
mod record;
mod report;

pub use analysis::{AnswerAnalysis, ScoreBand};
pub use ids::{InterviewId, ParseIdError};
pub use interview::{DifficultyLevel, InterviewKindError, InterviewType, Role};
pub use question::{Question, QuestionError};
pub use record::{SessionEntry, SessionRecord};
pub use report::{FeedbackReport, QuestionScore, Resource};
