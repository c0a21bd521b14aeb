//! Shared error types for the services crate.

use thiserror::Error;

use interview_core::SessionError;
use storage::repository::StorageError;

/// Errors emitted by the narrative feedback adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NarrativeError {
    #[error("narrative feedback is not configured")]
    Disabled,
    #[error("narrative feedback returned an empty response")]
    EmptyResponse,
    #[error("narrative feedback request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("narrative feedback was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors emitted by interview services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterviewError {
    #[error("at least one topic is required")]
    EmptyTopics,
    #[error("answer must not be blank")]
    EmptyAnswer,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid question bank: {0}")]
    Serialization(#[from] serde_json::Error),
}
