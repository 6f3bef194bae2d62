use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("id cannot be empty")]
    EmptyId,
    #[error("invalid history type: {0}")]
    InvalidHistoryKind(String),
    #[error("result {result:?} is not allowed for type {kind}")]
    InvalidResult { kind: String, result: String },
    #[error("invalid duration: {0} minutes")]
    InvalidDuration(u32),
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("file name is required")]
    EmptyFileName,
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}
