use frontend::ast::Program;
use frontend::parser::ParserResult;
use frontend::token::Token;
use frontend::{ClassRegistry, LexerError};
use string_interner::DefaultStringInterner;

/// Compiler session that serves as the central context for one compilation unit
///
/// This structure holds the shared state every phase of a translation needs:
/// the name table filled by the tokenizer and the class registry filled by the
/// parser. The generator borrows both immutably once parsing is done.
///
/// A session belongs to exactly one unit. Independent units each get their own
/// session, so handles from one session are never resolved against another.
pub struct CompilerSession {
    string_interner: DefaultStringInterner,
    class_registry: ClassRegistry,
}

impl CompilerSession {
    /// Create a new, empty compiler session
    pub fn new() -> Self {
        Self {
            string_interner: DefaultStringInterner::new(),
            class_registry: ClassRegistry::new(),
        }
    }

    /// Tokenize a source buffer, interning identifiers into the session's name table
    pub fn tokenize(&mut self, input: &str) -> Result<Vec<Token>, LexerError> {
        frontend::tokenize(input, &mut self.string_interner)
    }

    /// Parse a program string within the compiler session context
    ///
    /// The classes the program defines replace the session's class registry.
    pub fn parse_program(&mut self, input: &str) -> ParserResult<Program> {
        let (program, class_registry) =
            frontend::parse_source(input, &mut self.string_interner)?;
        self.class_registry = class_registry;
        Ok(program)
    }

    /// Get an immutable reference to the string interner
    pub fn string_interner(&self) -> &DefaultStringInterner {
        &self.string_interner
    }

    /// Get a mutable reference to the string interner
    pub fn string_interner_mut(&mut self) -> &mut DefaultStringInterner {
        &mut self.string_interner
    }

    /// Classes registered by the last successful `parse_program`
    pub fn class_registry(&self) -> &ClassRegistry {
        &self.class_registry
    }
}

impl Default for CompilerSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontend::ast::{CompoundStatement, Statement};
    use frontend::token::Kind;
    use string_interner::Symbol;

    #[test]
    fn test_session_creation() {
        let session = CompilerSession::new();
        let non_existent_symbol = string_interner::DefaultSymbol::try_from_usize(999).unwrap();
        assert!(session.string_interner().resolve(non_existent_symbol).is_none());
        assert!(session.class_registry().is_empty());
    }

    #[test]
    fn test_parse_simple_program() {
        let mut session = CompilerSession::new();
        let program = session
            .parse_program("def add(a, b):\n    return a + b\n")
            .unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_string_interner_consistency() {
        let mut session = CompilerSession::new();
        let program = session.parse_program("def test():\n    return 123\n").unwrap();

        let Statement::Compound(CompoundStatement::FunctionDef(function)) = &program.statements[0]
        else {
            panic!("expected a function definition");
        };
        assert_eq!(session.string_interner().resolve(function.name), Some("test"));
    }

    #[test]
    fn test_tokenize_shares_name_table() {
        let mut session = CompilerSession::new();
        let tokens = session.tokenize("alpha = alpha\n").unwrap();
        let Kind::Identifier(first) = tokens[0].kind else {
            panic!("expected identifier");
        };
        assert_eq!(tokens[2].kind, Kind::Identifier(first));

        session.parse_program("alpha = 1\n").unwrap();
        assert_eq!(session.string_interner().get("alpha"), Some(first));
    }

    #[test]
    fn test_class_registry_follows_last_parse() {
        let mut session = CompilerSession::new();
        session
            .parse_program("class A:\n    pass\nclass B(A):\n    pass\n")
            .unwrap();
        assert_eq!(session.class_registry().len(), 2);

        session.parse_program("x = 1\n").unwrap();
        assert!(session.class_registry().is_empty());
    }

    #[test]
    fn test_failed_parse_keeps_previous_registry() {
        let mut session = CompilerSession::new();
        session.parse_program("class A:\n    pass\n").unwrap();
        assert!(session.parse_program("class B(Missing):\n    pass\n").is_err());
        assert_eq!(session.class_registry().len(), 1);
    }
}
