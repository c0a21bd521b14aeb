//! Interview answer scoring and session feedback.
//!
//! [`analyzer`] scores one answer against one question; [`aggregator`] and
//! [`session`] turn a sequence of scored answers into transitions and a final
//! [`model::FeedbackReport`]. Everything here is synchronous and side-effect
//! free; persistence and narrative feedback live in the outer crates.

#![forbid(unsafe_code)]

pub mod aggregator;
pub mod analyzer;
pub mod error;
pub mod model;
pub mod question_bank;
pub mod session;
pub mod time;

pub use aggregator::{AggregatorConfig, ResourceTemplate, SessionAggregator, SubmitOutcome};
pub use error::Error;
pub use question_bank::{FallbackQuestionBank, QuestionBank, StaticQuestionBank};
pub use session::{InterviewSession, SessionError, SessionProgress, SessionState};
pub use time::Clock;
