//! Executor error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Unknown search policy: {0}")]
    UnknownPolicy(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
