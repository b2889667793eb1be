use crate::error::LexerErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentChange {
    Indent,
    Dedent,
    Same,
}

/// Stack of open indentation levels (in units of [`INDENT_UNIT`]).
///
/// Owned by whoever drives the scanner and passed to every
/// [`Scanner::next_token`] call, so one compilation never observes another's
/// indentation state.
///
/// [`INDENT_UNIT`]: crate::token::INDENT_UNIT
/// [`Scanner::next_token`]: super::Scanner::next_token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentStack {
    levels: Vec<usize>,
    measured: usize,
}

impl IndentStack {
    pub fn new() -> Self {
        Self { levels: vec![0], measured: 0 }
    }

    pub fn top(&self) -> usize {
        self.levels.last().copied().unwrap_or(0)
    }

    /// Number of levels above the base level.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Records the level measured at the start of a logical line.
    pub fn enter_line(&mut self, level: usize) -> IndentChange {
        self.measured = level;
        let top = self.top();
        if level > top {
            self.levels.push(level);
            IndentChange::Indent
        } else if level < top {
            self.levels.pop();
            IndentChange::Dedent
        } else {
            IndentChange::Same
        }
    }

    /// After a DEDENT: pops and returns `true` while the current line still
    /// sits below the stack top.
    pub fn continue_dedent(&mut self) -> Result<bool, LexerErrorKind> {
        let top = self.top();
        if self.measured < top {
            self.levels.pop();
            Ok(true)
        } else if self.measured > top {
            Err(LexerErrorKind::InconsistentDedent)
        } else {
            Ok(false)
        }
    }

    /// End of input: closes one open level, if any.
    pub fn flush_one(&mut self) -> bool {
        self.measured = 0;
        if self.levels.len() > 1 {
            self.levels.pop();
            true
        } else {
            false
        }
    }
}

impl Default for IndentStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedent_across_two_levels_needs_two_steps() {
        let mut stack = IndentStack::new();
        assert_eq!(stack.enter_line(1), IndentChange::Indent);
        assert_eq!(stack.enter_line(2), IndentChange::Indent);
        assert_eq!(stack.enter_line(0), IndentChange::Dedent);
        assert_eq!(stack.continue_dedent(), Ok(true));
        assert_eq!(stack.continue_dedent(), Ok(false));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn dedent_to_unknown_level_is_rejected() {
        let mut stack = IndentStack::new();
        stack.enter_line(2);
        assert_eq!(stack.enter_line(1), IndentChange::Dedent);
        assert_eq!(stack.continue_dedent(), Err(LexerErrorKind::InconsistentDedent));
    }
}
