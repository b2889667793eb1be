use string_interner::DefaultStringInterner;

use super::cursor::Cursor;
use super::indent::{IndentChange, IndentStack};
use crate::error::{LexerError, LexerErrorKind, SourceLocation, Span};
use crate::token::{
    AugmentedOp, Comparison, Delimiter, FStringFragment, INDENT_UNIT, Keyword, Kind,
    NAMESPACE_MARKER, SumOp, TermOp, Token, function_name,
};

type ScanResult<T> = Result<T, LexerError>;

/// Produces one token per call. Structural tokens (INDENT, DEDENT, NEWLINE)
/// are driven by the `at_line_start` / `pending_dedent` protocol of
/// [`Scanner::next_token`].
pub struct Scanner<'src, 'i> {
    cursor: Cursor<'src>,
    interner: &'i mut DefaultStringInterner,
    bracket_depth: usize,
    line_has_tokens: bool,
    embedded: bool,
}

impl<'src, 'i> Scanner<'src, 'i> {
    pub fn new(source: &'src str, interner: &'i mut DefaultStringInterner) -> Self {
        Self {
            cursor: Cursor::new(source),
            interner,
            bracket_depth: 0,
            line_has_tokens: false,
            embedded: false,
        }
    }

    pub fn location(&self) -> SourceLocation {
        self.cursor.location()
    }

    /// Scans the next token.
    ///
    /// `at_line_start` must be true before the first call and right after a
    /// NEWLINE token; the leading whitespace of the line is then measured as
    /// indentation. `pending_dedent` must be true right after a DEDENT token
    /// so that further DEDENTs owed by the same line are produced before
    /// normal scanning resumes.
    pub fn next_token(
        &mut self,
        indents: &mut IndentStack,
        at_line_start: bool,
        pending_dedent: bool,
    ) -> ScanResult<Token> {
        if pending_dedent {
            let location = self.cursor.location();
            let owed = indents
                .continue_dedent()
                .map_err(|kind| LexerError::new(kind, location))?;
            if owed {
                return Ok(self.structural(Kind::Dedent, location));
            }
        } else if at_line_start && !self.embedded {
            let level = self.measure_indentation()?;
            let location = self.cursor.location();
            match indents.enter_line(level) {
                IndentChange::Indent => return Ok(self.structural(Kind::Indent, location)),
                IndentChange::Dedent => return Ok(self.structural(Kind::Dedent, location)),
                IndentChange::Same => {}
            }
        }
        self.scan(indents)
    }

    fn structural(&self, kind: Kind, location: SourceLocation) -> Token {
        Token::new(kind, Span::new(location, location))
    }

    /// Skips blank and comment-only lines and returns the indentation level of
    /// the next line holding code. End of input counts as level 0.
    fn measure_indentation(&mut self) -> ScanResult<usize> {
        loop {
            let mut width = 0usize;
            while self.cursor.peek() == Some(' ') {
                self.cursor.advance();
                width += 1;
            }
            match self.cursor.peek() {
                None => return Ok(0),
                Some('\t') => {
                    return Err(LexerError::new(
                        LexerErrorKind::TabInIndentation,
                        self.cursor.location(),
                    ));
                }
                Some('#') => self.skip_comment(),
                Some('\n' | '\r') => {
                    self.cursor.advance();
                }
                Some(_) => {
                    if width % INDENT_UNIT != 0 {
                        return Err(LexerError::new(
                            LexerErrorKind::InvalidIndentation { width },
                            self.cursor.location(),
                        ));
                    }
                    return Ok(width / INDENT_UNIT);
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        while self.cursor.peek().is_some() && !self.cursor.at_newline() {
            self.cursor.advance();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(' ' | '\t' | '\x0c') => {
                    self.cursor.advance();
                }
                Some('#') => self.skip_comment(),
                Some('\\') if matches!(self.cursor.peek_second(), Some('\n' | '\r')) => {
                    self.cursor.advance_by(2);
                }
                Some('\n' | '\r') if self.bracket_depth > 0 || self.embedded => {
                    self.cursor.advance();
                }
                _ => return,
            }
        }
    }

    fn scan(&mut self, indents: &mut IndentStack) -> ScanResult<Token> {
        self.skip_trivia();
        let start = self.cursor.location();
        let Some(c) = self.cursor.peek() else {
            return Ok(self.finish(indents, start));
        };

        if c == '\n' || c == '\r' {
            self.cursor.advance();
            self.line_has_tokens = false;
            return Ok(Token::new(Kind::NewLine, Span::new(start, self.cursor.location())));
        }

        let kind = if c.is_alphabetic() || c == '_' {
            self.scan_word(start)?
        } else if c.is_ascii_digit() {
            self.scan_number(start)?
        } else if c == '"' || c == '\'' {
            Kind::Str(self.scan_string(start)?)
        } else {
            self.scan_symbol(start, c)?
        };
        self.line_has_tokens = true;
        Ok(Token::new(kind, Span::new(start, self.cursor.location())))
    }

    /// End of input: close the pending logical line, then flush open
    /// indentation levels one DEDENT per call, then EOF.
    fn finish(&mut self, indents: &mut IndentStack, location: SourceLocation) -> Token {
        if self.embedded {
            return self.structural(Kind::EOF, location);
        }
        if self.line_has_tokens {
            self.line_has_tokens = false;
            return self.structural(Kind::NewLine, location);
        }
        if indents.flush_one() {
            return self.structural(Kind::Dedent, location);
        }
        self.structural(Kind::EOF, location)
    }

    fn scan_word(&mut self, start: SourceLocation) -> ScanResult<Kind> {
        while matches!(self.cursor.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start.offset);

        if matches!(text, "f" | "F") && matches!(self.cursor.peek(), Some('"' | '\'')) {
            return self.scan_fstring(start);
        }
        if let Some(keyword) = Keyword::lookup(text) {
            return Ok(Kind::Keyword(keyword));
        }
        if text == NAMESPACE_MARKER {
            return Ok(Kind::Namespace);
        }
        if let Some(name) = function_name(text) {
            return Ok(Kind::Function(name));
        }
        Ok(Kind::Identifier(self.interner.get_or_intern(text)))
    }

    fn eat_digits(&mut self) {
        while matches!(self.cursor.peek(), Some(c) if c.is_ascii_digit()) {
            self.cursor.advance();
        }
    }

    fn scan_number(&mut self, start: SourceLocation) -> ScanResult<Kind> {
        self.eat_digits();
        let digits = self.cursor.slice_from(start.offset);
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(LexerError::new(LexerErrorKind::LeadingZero, start));
        }

        let mut is_float = false;
        if self.cursor.peek() == Some('.') {
            if !matches!(self.cursor.peek_second(), Some(c) if c.is_ascii_digit()) {
                return Err(LexerError::new(
                    LexerErrorKind::MissingFractionDigits,
                    self.cursor.location(),
                ));
            }
            self.cursor.advance();
            self.eat_digits();
            is_float = true;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let has_digits = match self.cursor.peek_second() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => matches!(self.cursor.peek_third(), Some(c) if c.is_ascii_digit()),
                _ => false,
            };
            if !has_digits {
                return Err(LexerError::new(
                    LexerErrorKind::MissingExponentDigits,
                    self.cursor.location(),
                ));
            }
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            self.eat_digits();
            is_float = true;
        }

        if let Some(c) = self.cursor.peek() {
            if c.is_alphanumeric() || c == '_' {
                return Err(LexerError::new(
                    LexerErrorKind::InvalidNumberSuffix(c),
                    self.cursor.location(),
                ));
            }
        }

        let text = self.cursor.slice_from(start.offset);
        if is_float {
            text.parse::<f64>()
                .map(Kind::Float)
                .map_err(|_| LexerError::new(LexerErrorKind::MissingFractionDigits, start))
        } else {
            text.parse::<i64>().map(Kind::Integer).map_err(|_| {
                LexerError::new(LexerErrorKind::IntegerOutOfRange(text.to_string()), start)
            })
        }
    }

    /// Consumes the opening quote(s); returns the quote character and whether
    /// the literal is triple-quoted.
    fn open_string(&mut self) -> (char, bool) {
        let quote = self.cursor.advance().unwrap_or('"');
        let triple =
            self.cursor.peek() == Some(quote) && self.cursor.peek_second() == Some(quote);
        if triple {
            self.cursor.advance_by(2);
        }
        (quote, triple)
    }

    /// Consumes the closing quote(s) when the cursor sits on them.
    fn close_string(&mut self, quote: char, triple: bool) -> bool {
        if triple {
            let closing: String = std::iter::repeat_n(quote, 3).collect();
            if self.cursor.rest().starts_with(&closing) {
                self.cursor.advance_by(3);
                return true;
            }
            false
        } else {
            self.cursor.eat(quote)
        }
    }

    fn scan_string(&mut self, start: SourceLocation) -> ScanResult<String> {
        let (quote, triple) = self.open_string();
        let mut value = String::new();
        loop {
            if self.close_string(quote, triple) {
                return Ok(value);
            }
            match self.cursor.peek() {
                None => return Err(LexerError::new(LexerErrorKind::UnterminatedString, start)),
                Some('\n' | '\r') if !triple => {
                    return Err(LexerError::new(LexerErrorKind::UnterminatedString, start));
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.scan_escape(&mut value)?;
                }
                Some(_) => {
                    if let Some(c) = self.cursor.advance() {
                        value.push(c);
                    }
                }
            }
        }
    }

    fn scan_escape(&mut self, value: &mut String) -> ScanResult<()> {
        let location = self.cursor.location();
        match self.cursor.advance() {
            None => return Err(LexerError::new(LexerErrorKind::IncompleteEscape, location)),
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('0') => value.push('\0'),
            Some('\\') => value.push('\\'),
            Some('\'') => value.push('\''),
            Some('"') => value.push('"'),
            Some('\n') => {}
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
        }
        Ok(())
    }

    fn scan_fstring(&mut self, start: SourceLocation) -> ScanResult<Kind> {
        let (quote, triple) = self.open_string();
        let mut fragments = Vec::new();
        let mut literal = String::new();
        loop {
            if self.close_string(quote, triple) {
                break;
            }
            match self.cursor.peek() {
                None => return Err(LexerError::new(LexerErrorKind::UnterminatedString, start)),
                Some('\n' | '\r') if !triple => {
                    return Err(LexerError::new(LexerErrorKind::UnterminatedString, start));
                }
                Some('{') if self.cursor.peek_second() == Some('{') => {
                    self.cursor.advance_by(2);
                    literal.push('{');
                }
                Some('}') if self.cursor.peek_second() == Some('}') => {
                    self.cursor.advance_by(2);
                    literal.push('}');
                }
                Some('}') => {
                    return Err(LexerError::new(
                        LexerErrorKind::UnmatchedFStringBrace,
                        self.cursor.location(),
                    ));
                }
                Some('{') => {
                    if !literal.is_empty() {
                        fragments.push(FStringFragment::Literal(std::mem::take(&mut literal)));
                    }
                    let tokens = self.scan_embedded_expression(quote)?;
                    fragments.push(FStringFragment::Expression(tokens));
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.scan_escape(&mut literal)?;
                }
                Some(_) => {
                    if let Some(c) = self.cursor.advance() {
                        literal.push(c);
                    }
                }
            }
        }
        if !literal.is_empty() {
            fragments.push(FStringFragment::Literal(literal));
        }
        Ok(Kind::FString(fragments))
    }

    /// Tokenizes `{ expr }` in place. Returns the expression tokens followed
    /// by an EOF token; leaves the cursor after the closing brace.
    fn scan_embedded_expression(&mut self, quote: char) -> ScanResult<Vec<Token>> {
        let brace = self.cursor.location();
        self.cursor.advance();
        let start = self.cursor.location();

        let mut probe = self.cursor.clone();
        let mut depth = 0usize;
        loop {
            let unterminated =
                LexerError::new(LexerErrorKind::UnterminatedFStringExpression, brace);
            match probe.peek() {
                None | Some('\n' | '\r') => return Err(unterminated),
                Some(c) if c == quote => return Err(unterminated),
                Some('(' | '[' | '{') => depth += 1,
                Some(')' | ']') => depth = depth.saturating_sub(1),
                Some('}') if depth == 0 => break,
                Some('}') => depth -= 1,
                Some(inner @ ('\'' | '"')) => {
                    probe.advance();
                    while probe.peek().is_some_and(|c| c != inner) {
                        if probe.at_newline() {
                            return Err(unterminated);
                        }
                        probe.advance();
                    }
                }
                Some(_) => {}
            }
            probe.advance();
        }
        let end = probe.location();

        if probe.slice_from(start.offset).trim().is_empty() {
            return Err(LexerError::new(LexerErrorKind::EmptyFStringExpression, brace));
        }

        let prefix = self
            .cursor
            .source()
            .get(..end.offset as usize)
            .unwrap_or_default();
        let mut nested = Scanner {
            cursor: Cursor::starting_at(prefix, start),
            interner: &mut *self.interner,
            bracket_depth: 0,
            line_has_tokens: false,
            embedded: true,
        };
        let mut indents = IndentStack::new();
        let mut tokens = Vec::new();
        loop {
            let token = nested.next_token(&mut indents, false, false)?;
            let done = token.kind == Kind::EOF;
            tokens.push(token);
            if done {
                break;
            }
        }

        self.cursor = probe;
        self.cursor.advance();
        Ok(tokens)
    }

    fn scan_symbol(&mut self, start: SourceLocation, c: char) -> ScanResult<Kind> {
        let rest = self.cursor.rest();
        for len in (1..=3).rev() {
            let Some(candidate) = rest.get(..len) else {
                continue;
            };
            if let Some(kind) = symbol_kind(candidate) {
                self.cursor.advance_by(len);
                match kind {
                    Kind::Delimiter(
                        Delimiter::ParenOpen | Delimiter::BracketOpen | Delimiter::BraceOpen,
                    ) => self.bracket_depth += 1,
                    Kind::Delimiter(
                        Delimiter::ParenClose | Delimiter::BracketClose | Delimiter::BraceClose,
                    ) => self.bracket_depth = self.bracket_depth.saturating_sub(1),
                    _ => {}
                }
                return Ok(kind);
            }
        }
        Err(LexerError::new(LexerErrorKind::UnexpectedCharacter(c), start))
    }
}

fn symbol_kind(text: &str) -> Option<Kind> {
    let kind = match text {
        "**=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Pow)),
        "//=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::FloorDiv)),
        ">>=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Shr)),
        "<<=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Shl)),

        "+=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Add)),
        "-=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Sub)),
        "*=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Mul)),
        "/=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Div)),
        "%=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::Mod)),
        "@=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::MatMul)),
        "&=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::BitAnd)),
        "|=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::BitOr)),
        "^=" => Kind::Delimiter(Delimiter::Augmented(AugmentedOp::BitXor)),
        "->" => Kind::Delimiter(Delimiter::Arrow),
        "**" => Kind::Power,
        "//" => Kind::TermOp(TermOp::FloorDiv),
        "==" => Kind::Comparison(Comparison::Equal),
        "!=" => Kind::Comparison(Comparison::NotEqual),
        "<=" => Kind::Comparison(Comparison::LessEqual),
        ">=" => Kind::Comparison(Comparison::GreaterEqual),
        "<<" => Kind::Operator("<<"),
        ">>" => Kind::Operator(">>"),
        ":=" => Kind::Operator(":="),

        "+" => Kind::SumOp(SumOp::Add),
        "-" => Kind::SumOp(SumOp::Sub),
        "*" => Kind::TermOp(TermOp::Mul),
        "/" => Kind::TermOp(TermOp::Div),
        "%" => Kind::TermOp(TermOp::Mod),
        "<" => Kind::Comparison(Comparison::Less),
        ">" => Kind::Comparison(Comparison::Greater),
        "=" => Kind::Delimiter(Delimiter::Assign),
        "(" => Kind::Delimiter(Delimiter::ParenOpen),
        ")" => Kind::Delimiter(Delimiter::ParenClose),
        "[" => Kind::Delimiter(Delimiter::BracketOpen),
        "]" => Kind::Delimiter(Delimiter::BracketClose),
        "{" => Kind::Delimiter(Delimiter::BraceOpen),
        "}" => Kind::Delimiter(Delimiter::BraceClose),
        "," => Kind::Delimiter(Delimiter::Comma),
        ":" => Kind::Delimiter(Delimiter::Colon),
        "." => Kind::Delimiter(Delimiter::Dot),
        ";" => Kind::Delimiter(Delimiter::Semicolon),
        "@" => Kind::Operator("@"),
        "&" => Kind::Operator("&"),
        "|" => Kind::Operator("|"),
        "^" => Kind::Operator("^"),
        "~" => Kind::Operator("~"),
        _ => return None,
    };
    Some(kind)
}
