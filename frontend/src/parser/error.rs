use std::fmt;

use thiserror::Error;

use crate::error::{FrontendError, SourceLocation};

/// Result of every parsing routine. Registry and class-shape checks done by
/// the parser surface as [`FrontendError::Semantic`].
pub type ParserResult<T> = Result<T, FrontendError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserErrorKind {
    UnexpectedToken { expected: String, found: String },
    InvalidAugmentedTarget,
}

impl fmt::Display for ParserErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParserErrorKind::InvalidAugmentedTarget => {
                write!(f, "augmented assignment takes exactly one target")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {kind}")]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub location: SourceLocation,
}

impl ParserError {
    pub fn unexpected_token(location: SourceLocation, expected: String, found: String) -> Self {
        Self {
            kind: ParserErrorKind::UnexpectedToken { expected, found },
            location,
        }
    }
}
