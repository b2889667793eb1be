use std::fmt;

use thiserror::Error;

/// A point in the source buffer. `line` and `column` are 1-based, `offset`
/// is the byte offset from the start of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self { line, column, offset }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexerErrorKind {
    UnexpectedCharacter(char),
    LeadingZero,
    MissingFractionDigits,
    MissingExponentDigits,
    InvalidNumberSuffix(char),
    IntegerOutOfRange(String),
    UnterminatedString,
    IncompleteEscape,
    InvalidIndentation { width: usize },
    TabInIndentation,
    InconsistentDedent,
    UnmatchedFStringBrace,
    EmptyFStringExpression,
    UnterminatedFStringExpression,
}

impl fmt::Display for LexerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character {c:?}"),
            LexerErrorKind::LeadingZero => {
                write!(f, "leading zeros in integer literals are not permitted")
            }
            LexerErrorKind::MissingFractionDigits => {
                write!(f, "expected digits after the decimal point")
            }
            LexerErrorKind::MissingExponentDigits => write!(f, "expected digits in the exponent"),
            LexerErrorKind::InvalidNumberSuffix(c) => {
                write!(f, "invalid character {c:?} directly after a number")
            }
            LexerErrorKind::IntegerOutOfRange(text) => {
                write!(f, "integer literal {text} does not fit in 64 bits")
            }
            LexerErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexerErrorKind::IncompleteEscape => {
                write!(f, "incomplete escape sequence at end of input")
            }
            LexerErrorKind::InvalidIndentation { width } => write!(
                f,
                "indentation of {width} spaces is not a multiple of the 4-space unit"
            ),
            LexerErrorKind::TabInIndentation => write!(f, "tabs are not allowed in indentation"),
            LexerErrorKind::InconsistentDedent => {
                write!(f, "unindent does not match any outer indentation level")
            }
            LexerErrorKind::UnmatchedFStringBrace => {
                write!(f, "single '}}' is not allowed in an f-string")
            }
            LexerErrorKind::EmptyFStringExpression => {
                write!(f, "empty expression is not allowed in an f-string")
            }
            LexerErrorKind::UnterminatedFStringExpression => {
                write!(f, "expected '}}' to close the f-string expression")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {kind}")]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub location: SourceLocation,
}

impl LexerError {
    pub fn new(kind: LexerErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticErrorKind {
    DuplicateClass(String),
    UnknownSuperclass { class: String, superclass: String },
    DuplicateMethod { class: String, method: String, arity: usize },
    SuperWithoutSuperclass(String),
    SuperOutsideMethod,
    UnsupportedAnnotation(String),
    UnsupportedArity { function: String, found: usize, expected: String },
    UnknownMethod { class: String, method: String },
    UnsupportedClassStatement(String),
    NestedClass(String),
    UnsupportedAugmentedOperator(String),
    UnsupportedClassAttribute { class: String, attribute: String },
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticErrorKind::DuplicateClass(name) => {
                write!(f, "class '{name}' is already defined")
            }
            SemanticErrorKind::UnknownSuperclass { class, superclass } => write!(
                f,
                "class '{class}' inherits from '{superclass}', which is not a defined class"
            ),
            SemanticErrorKind::DuplicateMethod { class, method, arity } => write!(
                f,
                "method '{method}' with {arity} parameter(s) is defined twice in class '{class}'"
            ),
            SemanticErrorKind::SuperWithoutSuperclass(class) => write!(
                f,
                "super() used in class '{class}', which has no superclass"
            ),
            SemanticErrorKind::SuperOutsideMethod => {
                write!(f, "super() is only supported inside a method with a receiver")
            }
            SemanticErrorKind::UnsupportedAnnotation(name) => {
                write!(f, "unsupported type annotation '{name}'")
            }
            SemanticErrorKind::UnsupportedArity { function, found, expected } => write!(
                f,
                "'{function}' takes {expected} argument(s) but {found} were given"
            ),
            SemanticErrorKind::UnknownMethod { class, method } => {
                write!(f, "class '{class}' has no method '{method}'")
            }
            SemanticErrorKind::UnsupportedClassStatement(what) => {
                write!(f, "unsupported statement in class body: {what}")
            }
            SemanticErrorKind::NestedClass(name) => write!(
                f,
                "class '{name}' must be defined at the top level"
            ),
            SemanticErrorKind::UnsupportedAugmentedOperator(op) => {
                write!(f, "augmented assignment '{op}' is not supported")
            }
            SemanticErrorKind::UnsupportedClassAttribute { class, attribute } => write!(
                f,
                "class attribute access '{class}.{attribute}' is not supported"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub location: Option<SourceLocation>,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, location: Option<SourceLocation>) -> Self {
        Self { kind, location }
    }

    pub fn at(kind: SemanticErrorKind, location: SourceLocation) -> Self {
        Self::new(kind, Some(location))
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Any failure of the front end. Every variant aborts the compilation unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrontendError {
    #[error("lexical error: {0}")]
    Lexer(#[from] LexerError),
    #[error("syntax error: {0}")]
    Parser(#[from] crate::parser::error::ParserError),
    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),
}

impl FrontendError {
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            FrontendError::Lexer(e) => Some(e.location),
            FrontendError::Parser(e) => Some(e.location),
            FrontendError::Semantic(e) => e.location,
        }
    }
}
