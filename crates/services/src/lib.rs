#![forbid(unsafe_code)]

pub mod error;
pub mod narrative;
pub mod sessions;

pub use interview_core::Clock;

pub use error::{InterviewError, NarrativeError};
pub use narrative::{
    LlmNarrativeFeedback, NarrativeConfig, NarrativeContext, NarrativeFeedback, NarrativeReport,
};
pub use sessions::{
    HistoryStats, InterviewAnswerResult, InterviewHistoryService, InterviewListItem,
    InterviewLoopService, InterviewReportResult, parse_question_bank,
};
