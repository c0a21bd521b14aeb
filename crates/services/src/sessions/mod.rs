mod bank;
mod view;
mod workflow;

// Public API of the interview subsystem.
pub use crate::error::InterviewError;
pub use bank::parse_question_bank;
pub use view::{HistoryStats, InterviewHistoryService, InterviewListItem};
pub use workflow::{InterviewAnswerResult, InterviewLoopService, InterviewReportResult};
