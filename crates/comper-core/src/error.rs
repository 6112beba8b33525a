//! Error types for comper-core

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    #[error("Unknown note name: {0}")]
    UnknownNote(String),
    #[error("Unknown chord symbol: {0}")]
    UnknownChord(String),
    #[error("Unknown scale: {0}")]
    UnknownScale(String),
    #[error("Unknown key: {0}")]
    UnknownKey(String),
    #[error("Invalid rhythm pattern: {0}")]
    InvalidPattern(String),
}

pub type Result<T> = std::result::Result<T, TheoryError>;
