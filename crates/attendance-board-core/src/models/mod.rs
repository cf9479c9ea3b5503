//! Domain models for the attendance board.

mod absence;
mod attendance;
mod modal;

pub use absence::*;
pub use attendance::*;
pub use modal::*;

use thiserror::Error;

/// Errors raised when parsing wire spellings into domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown attendance type: {0}")]
    UnknownAttendanceType(String),

    #[error("Unknown progression state: {0}")]
    UnknownProgression(String),

    #[error("Unknown priority: {0}")]
    UnknownPriority(String),

    #[error("Unknown modal kind: {0}")]
    UnknownModalKind(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
