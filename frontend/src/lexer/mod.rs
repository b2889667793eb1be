//! Tokenizer for the indentation-delimited surface language.
//!
//! [`Scanner`] produces one token per call and leaves the indentation
//! protocol to its caller; [`tokenize`] is the standard driving loop.

mod cursor;
mod indent;
mod scanner;

pub use cursor::Cursor;
pub use indent::{IndentChange, IndentStack};
pub use scanner::Scanner;

use string_interner::DefaultStringInterner;
use tracing::{debug, trace};

use crate::error::LexerError;
use crate::token::{Kind, Token};

/// Tokenizes a whole compilation unit. The returned stream always ends with
/// an EOF token and every INDENT is matched by a DEDENT before it.
pub fn tokenize(
    source: &str,
    interner: &mut DefaultStringInterner,
) -> Result<Vec<Token>, LexerError> {
    let mut scanner = Scanner::new(source, interner);
    let mut indents = IndentStack::new();
    let mut tokens = Vec::new();
    let mut at_line_start = true;
    let mut pending_dedent = false;

    loop {
        let token = scanner.next_token(&mut indents, at_line_start, pending_dedent)?;
        trace!(
            kind = ?token.kind,
            line = token.span.start.line,
            column = token.span.start.column,
            "token"
        );
        at_line_start = token.kind == Kind::NewLine;
        pending_dedent = token.kind == Kind::Dedent;
        let done = token.kind == Kind::EOF;
        tokens.push(token);
        if done {
            break;
        }
    }

    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}
