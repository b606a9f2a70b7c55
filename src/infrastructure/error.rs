use crate::domain::period::PeriodError;
use crate::domain::tags::TagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Period error: {0}")]
    Period(#[from] PeriodError),
    #[error("Tag error: {0}")]
    Tag(#[from] TagError),
}
