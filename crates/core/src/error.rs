use thiserror::Error;

use crate::model::{InterviewKindError, QuestionError};
use crate::session::SessionError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Kind(#[from] InterviewKindError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
