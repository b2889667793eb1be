pub mod ast;
pub mod class_registry;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use class_registry::ClassRegistry;
pub use error::{FrontendError, LexerError, SemanticError, SourceLocation, Span};
pub use lexer::tokenize;
pub use parser::{Parser, parse};

use string_interner::DefaultStringInterner;

/// Tokenizes and parses one compilation unit.
pub fn parse_source(
    source: &str,
    string_interner: &mut DefaultStringInterner,
) -> Result<(ast::Program, ClassRegistry), FrontendError> {
    let tokens = tokenize(source, string_interner)?;
    parse(tokens, string_interner)
}
