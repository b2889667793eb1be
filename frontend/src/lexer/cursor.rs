use crate::error::SourceLocation;

/// Position-tracking view over the source buffer.
///
/// Any newline sequence (`\n`, `\r\n` or a lone `\r`) is a single advance
/// that moves to column 1 of the next line.
#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    source: &'src str,
    location: SourceLocation,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::starting_at(source, SourceLocation::default())
    }

    /// `source` is the whole buffer (or a prefix of it) and `location` must
    /// point into it; used to scan f-string expressions in place.
    pub fn starting_at(source: &'src str, location: SourceLocation) -> Self {
        Self { source, location }
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn rest(&self) -> &'src str {
        self.source.get(self.location.offset as usize..).unwrap_or("")
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    pub fn peek_third(&self) -> Option<char> {
        self.rest().chars().nth(2)
    }

    pub fn at_newline(&self) -> bool {
        matches!(self.peek(), Some('\n' | '\r'))
    }

    /// Consumes one code point. Newline sequences are reported as `'\n'`.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        match c {
            '\r' if self.rest().starts_with("\r\n") => {
                self.location.offset += 2;
                self.next_line();
                Some('\n')
            }
            '\n' | '\r' => {
                self.location.offset += 1;
                self.next_line();
                Some('\n')
            }
            _ => {
                self.location.offset += c.len_utf8() as u32;
                self.location.column += 1;
                Some(c)
            }
        }
    }

    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn slice_from(&self, start_offset: u32) -> &'src str {
        self.source
            .get(start_offset as usize..self.location.offset as usize)
            .unwrap_or("")
    }

    fn next_line(&mut self) {
        self.location.line += 1;
        self.location.column = 1;
    }
}
