use interview_core::StaticQuestionBank;

use crate::error::InterviewError;

/// Parse a question bank from its nested JSON form.
///
/// # Errors
///
/// Returns `InterviewError::Serialization` if the JSON is malformed or a
/// question fails validation.
pub fn parse_question_bank(json: &str) -> Result<StaticQuestionBank, InterviewError> {
    let bank: StaticQuestionBank = serde_json::from_str(json)?;
    tracing::debug!(questions = bank.len(), "question bank loaded");
    Ok(bank)
}
