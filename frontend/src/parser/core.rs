use string_interner::{DefaultStringInterner, DefaultSymbol};
use tracing::debug;

use super::error::{ParserError, ParserResult};
use super::token_stream::TokenStream;
use crate::ast::*;
use crate::class_registry::ClassRegistry;
use crate::error::{SourceLocation, Span};
use crate::token::{Delimiter, Keyword, Kind, Token};

/// Parses a complete token stream into the program tree and the registry of
/// classes it defines.
pub fn parse(
    tokens: Vec<Token>,
    string_interner: &mut DefaultStringInterner,
) -> ParserResult<(Program, ClassRegistry)> {
    Parser::new(tokens, string_interner).parse_program()
}

pub struct Parser<'a> {
    tokens: TokenStream,
    pub string_interner: &'a mut DefaultStringInterner,
    pub class_registry: ClassRegistry,
    /// Number of enclosing indented blocks.
    pub(super) block_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, string_interner: &'a mut DefaultStringInterner) -> Self {
        Parser {
            tokens: TokenStream::new(tokens),
            string_interner,
            class_registry: ClassRegistry::new(),
            block_depth: 0,
        }
    }

    pub fn peek(&self) -> &Kind {
        self.tokens.peek()
    }

    pub fn peek_n(&self, pos: usize) -> &Kind {
        self.tokens.peek_at(pos)
    }

    pub fn next(&mut self) -> Token {
        self.tokens.advance()
    }

    pub fn location(&self) -> SourceLocation {
        self.tokens.location()
    }

    pub fn span_from(&self, start: SourceLocation) -> Span {
        Span::new(start, self.tokens.previous_end())
    }

    pub fn line_has_assignment(&self) -> bool {
        self.tokens.line_has_assignment()
    }

    pub fn intern(&mut self, text: &str) -> DefaultSymbol {
        self.string_interner.get_or_intern(text)
    }

    pub fn name_of(&self, symbol: DefaultSymbol) -> &str {
        self.string_interner.resolve(symbol).unwrap_or("<unknown>")
    }

    /// Syntax error at the current token.
    pub fn unexpected(&self, expected: &str) -> crate::error::FrontendError {
        let found = match self.peek() {
            Kind::Identifier(symbol) => format!("identifier '{}'", self.name_of(*symbol)),
            other => other.describe(),
        };
        ParserError::unexpected_token(self.location(), expected.to_string(), found).into()
    }

    pub fn expect(&mut self, accept: &Kind, expected: &str) -> ParserResult<Token> {
        if self.peek() == accept {
            Ok(self.next())
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub fn expect_delimiter(&mut self, delimiter: Delimiter) -> ParserResult<Token> {
        self.expect(&Kind::Delimiter(delimiter), &format!("'{}'", delimiter.as_str()))
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> ParserResult<Token> {
        self.expect(&Kind::Keyword(keyword), &format!("'{}'", keyword.as_str()))
    }

    /// Accepts an identifier, or a builtin function name used as a plain name.
    pub fn expect_name(&mut self, expected: &str) -> ParserResult<DefaultSymbol> {
        match *self.peek() {
            Kind::Identifier(symbol) => {
                self.next();
                Ok(symbol)
            }
            Kind::Function(name) => {
                self.next();
                Ok(self.intern(name))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    pub fn parse_program(mut self) -> ParserResult<(Program, ClassRegistry)> {
        let mut statements = Vec::new();
        while *self.peek() != Kind::EOF {
            statements.push(super::stmt::parse_statement(&mut self)?);
        }
        debug!(
            statements = statements.len(),
            classes = self.class_registry.len(),
            "parsed program"
        );
        Ok((Program { statements }, self.class_registry))
    }

    /// `NEWLINE INDENT statement+ DEDENT`
    pub fn parse_block(&mut self) -> ParserResult<Block> {
        self.expect(&Kind::NewLine, "newline before an indented block")?;
        self.expect(&Kind::Indent, "an indented block")?;
        self.block_depth += 1;
        let mut statements = Vec::new();
        while !matches!(self.peek(), Kind::Dedent | Kind::EOF) {
            statements.push(super::stmt::parse_statement(self)?);
        }
        self.block_depth -= 1;
        self.expect(&Kind::Dedent, "end of the indented block")?;
        Ok(Block { statements })
    }

    /// `name` or `name[arg, ...]`
    pub fn parse_type_annotation(&mut self) -> ParserResult<TypeAnnotation> {
        let start = self.location();
        let name = match self.peek() {
            Kind::Identifier(symbol) => self.name_of(*symbol).to_string(),
            Kind::Function(name) => name.to_string(),
            Kind::Keyword(Keyword::None) => "None".to_string(),
            _ => return Err(self.unexpected("a type annotation")),
        };
        self.next();

        let mut arguments = Vec::new();
        if self.peek().is_delimiter(Delimiter::BracketOpen) {
            self.next();
            arguments.push(self.parse_type_annotation()?);
            while self.peek().is_delimiter(Delimiter::Comma) {
                self.next();
                arguments.push(self.parse_type_annotation()?);
            }
            self.expect_delimiter(Delimiter::BracketClose)?;
        }
        Ok(TypeAnnotation { name, arguments, span: self.span_from(start) })
    }

    /// `( [param {, param} [,]] )` where `param := NAME [: annotation] [= default]`
    pub fn parse_parameters(&mut self) -> ParserResult<Vec<Parameter>> {
        self.expect_delimiter(Delimiter::ParenOpen)?;
        let mut parameters = Vec::new();
        while !self.peek().is_delimiter(Delimiter::ParenClose) {
            let start = self.location();
            let name = self.expect_name("a parameter name")?;
            let annotation = if self.peek().is_delimiter(Delimiter::Colon) {
                self.next();
                Some(self.parse_type_annotation()?)
            } else {
                None
            };
            let default = if self.peek().is_delimiter(Delimiter::Assign) {
                self.next();
                Some(super::expr::parse_expression(self)?)
            } else {
                None
            };
            parameters.push(Parameter { name, annotation, default, span: self.span_from(start) });

            if self.peek().is_delimiter(Delimiter::Comma) {
                self.next();
            } else if !self.peek().is_delimiter(Delimiter::ParenClose) {
                return Err(self.unexpected("',' or ')' in the parameter list"));
            }
        }
        self.expect_delimiter(Delimiter::ParenClose)?;
        Ok(parameters)
    }

    /// Parses the tokens of one f-string `{...}` fragment as an expression.
    pub fn parse_embedded_expression(&mut self, tokens: Vec<Token>) -> ParserResult<Expression> {
        let mut nested = Parser::new(tokens, &mut *self.string_interner);
        let expression = super::expr::parse_expression(&mut nested)?;
        nested.expect(&Kind::EOF, "end of the f-string expression")?;
        Ok(expression)
    }

    pub fn register_class(&mut self, class: ClassDef) -> ParserResult<()> {
        debug!(
            class = self.name_of(class.name),
            superclass = ?class.superclass.map(|s| self.name_of(s)),
            attributes = class.attributes.len(),
            "registered class"
        );
        self.class_registry.register(class, &*self.string_interner)?;
        Ok(())
    }
}
