use std::fmt;

use frontend::{FrontendError, SemanticError};
use thiserror::Error;

/// Failure while emitting Julia text.
#[derive(Debug, Error)]
pub enum JuliaGenError {
    #[error("formatting error: {0}")]
    Fmt(#[from] fmt::Error),
    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),
}

/// Failure anywhere in the source-to-Julia pipeline of one unit.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    #[error(transparent)]
    Generate(#[from] JuliaGenError),
}

pub type GenResult<T> = Result<T, JuliaGenError>;

#[cfg(test)]
mod tests {
    use super::*;
    use frontend::SourceLocation;
    use frontend::error::SemanticErrorKind;

    #[test]
    fn semantic_message_keeps_location() {
        let error: JuliaGenError = SemanticError::at(
            SemanticErrorKind::SuperOutsideMethod,
            SourceLocation::new(3, 9, 40),
        )
        .into();
        assert!(error.to_string().starts_with("semantic error: 3:9: "));
    }

    #[test]
    fn translate_error_is_transparent() {
        let inner = SemanticError::new(SemanticErrorKind::UnsupportedAnnotation("dict".into()), None);
        let error = TranslateError::from(JuliaGenError::from(inner.clone()));
        assert_eq!(error.to_string(), format!("semantic error: {inner}"));
    }
}
