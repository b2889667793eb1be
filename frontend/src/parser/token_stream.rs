use crate::error::{SourceLocation, Span};
use crate::token::{Delimiter, Kind, Token};

/// Materialized token sequence with unbounded lookahead.
///
/// The stream always ends with an EOF token; peeking past the end keeps
/// returning it.
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&Kind::EOF) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or_default();
            tokens.push(Token::new(Kind::EOF, Span::new(end, end)));
        }
        TokenStream { tokens, position: 0 }
    }

    pub fn peek(&self) -> &Kind {
        self.peek_at(0)
    }

    pub fn peek_at(&self, relative_pos: usize) -> &Kind {
        &self.token_at(relative_pos).kind
    }

    pub fn current(&self) -> &Token {
        self.token_at(0)
    }

    /// Consumes the current token. EOF is never consumed.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    pub fn location(&self) -> SourceLocation {
        self.current().span.start
    }

    /// End of the most recently consumed token.
    pub fn previous_end(&self) -> SourceLocation {
        match self.position.checked_sub(1) {
            Some(index) => self.tokens[index].span.end,
            None => self.location(),
        }
    }

    /// True when the rest of the logical line holds `=` or an augmented
    /// assignment outside any brackets.
    pub fn line_has_assignment(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.position..] {
            match &token.kind {
                Kind::NewLine | Kind::EOF => return false,
                Kind::Delimiter(
                    Delimiter::ParenOpen | Delimiter::BracketOpen | Delimiter::BraceOpen,
                ) => depth += 1,
                Kind::Delimiter(
                    Delimiter::ParenClose | Delimiter::BracketClose | Delimiter::BraceClose,
                ) => depth = depth.saturating_sub(1),
                Kind::Delimiter(Delimiter::Assign | Delimiter::Augmented(_)) if depth == 0 => {
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    fn token_at(&self, relative_pos: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + relative_pos).min(last)]
    }
}
