use std::fmt;

use string_interner::DefaultSymbol;

use crate::error::Span;

/// Width in spaces of one indentation level.
pub const INDENT_UNIT: usize = 4;

/// Qualifier that marks a numerical-library call such as `np.zeros(3)`.
pub const NAMESPACE_MARKER: &str = "np";

pub const BUILTIN_FUNCTIONS: &[&str] = &["print", "len", "range", "str", "int", "float"];

/// Bare `add` stays an ordinary identifier; `np.add` is still recognised
/// through the namespace qualifier.
pub const NUMERIC_FUNCTIONS: &[&str] = &[
    "min", "max", "sum", "subtract", "multiply", "divide", "minimum", "maximum", "round", "mean",
    "median", "std", "log", "exp", "sqrt", "sin", "cos", "abs", "dot", "zeros", "ones", "shape",
    "transpose", "array", "equal", "less", "greater", "less_equal", "greater_equal",
];

/// Returns the canonical `'static` spelling when `text` names a builtin or
/// numerical-library function.
pub fn function_name(text: &str) -> Option<&'static str> {
    BUILTIN_FUNCTIONS
        .iter()
        .chain(NUMERIC_FUNCTIONS.iter())
        .find(|name| **name == text)
        .copied()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: Kind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: Kind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Indent,
    Dedent,
    NewLine,
    EOF,

    Identifier(DefaultSymbol),
    Keyword(Keyword),

    Integer(i64),
    Float(f64),
    Str(String),
    FString(Vec<FStringFragment>),

    SumOp(SumOp),
    TermOp(TermOp),
    Power,
    Comparison(Comparison),
    /// Operators the lexer knows but the grammar does not use.
    Operator(&'static str),
    Delimiter(Delimiter),

    Namespace,
    Function(&'static str),
}

impl Kind {
    /// Short human readable description used in syntax errors.
    pub fn describe(&self) -> String {
        match self {
            Kind::Indent => "indent".to_string(),
            Kind::Dedent => "dedent".to_string(),
            Kind::NewLine => "newline".to_string(),
            Kind::EOF => "end of input".to_string(),
            Kind::Identifier(_) => "identifier".to_string(),
            Kind::Keyword(k) => format!("keyword '{}'", k.as_str()),
            Kind::Integer(n) => format!("integer {n}"),
            Kind::Float(n) => format!("float {n:?}"),
            Kind::Str(_) => "string literal".to_string(),
            Kind::FString(_) => "f-string".to_string(),
            Kind::SumOp(op) => format!("'{}'", op.as_str()),
            Kind::TermOp(op) => format!("'{}'", op.as_str()),
            Kind::Power => "'**'".to_string(),
            Kind::Comparison(op) => format!("'{}'", op.as_str()),
            Kind::Operator(op) => format!("'{op}'"),
            Kind::Delimiter(d) => format!("'{}'", d.as_str()),
            Kind::Namespace => format!("'{NAMESPACE_MARKER}'"),
            Kind::Function(name) => format!("function '{name}'"),
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Kind::Keyword(k) if *k == keyword)
    }

    pub fn is_delimiter(&self, delimiter: Delimiter) -> bool {
        matches!(self, Kind::Delimiter(d) if *d == delimiter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FStringFragment {
    Literal(String),
    Expression(Vec<Token>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordClass {
    /// `pass`, `break`, `continue`
    Simple,
    /// `def`, `class`, `if`, `for`, `while`
    Compound,
    /// `True`, `False`, `None`
    Atom,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    True,
    False,
    None,
    And,
    Or,
    Not,
    If,
    Elif,
    Else,
    For,
    While,
    In,
    Is,
    Def,
    Class,
    Return,
    Pass,
    Break,
    Continue,
    Import,
    From,
    As,
    Assert,
    Del,
    Global,
    Nonlocal,
    Lambda,
    Try,
    Except,
    Finally,
    Raise,
    With,
    Yield,
    Async,
    Await,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("True", Keyword::True),
    ("False", Keyword::False),
    ("None", Keyword::None),
    ("and", Keyword::And),
    ("or", Keyword::Or),
    ("not", Keyword::Not),
    ("if", Keyword::If),
    ("elif", Keyword::Elif),
    ("else", Keyword::Else),
    ("for", Keyword::For),
    ("while", Keyword::While),
    ("in", Keyword::In),
    ("is", Keyword::Is),
    ("def", Keyword::Def),
    ("class", Keyword::Class),
    ("return", Keyword::Return),
    ("pass", Keyword::Pass),
    ("break", Keyword::Break),
    ("continue", Keyword::Continue),
    ("import", Keyword::Import),
    ("from", Keyword::From),
    ("as", Keyword::As),
    ("assert", Keyword::Assert),
    ("del", Keyword::Del),
    ("global", Keyword::Global),
    ("nonlocal", Keyword::Nonlocal),
    ("lambda", Keyword::Lambda),
    ("try", Keyword::Try),
    ("except", Keyword::Except),
    ("finally", Keyword::Finally),
    ("raise", Keyword::Raise),
    ("with", Keyword::With),
    ("yield", Keyword::Yield),
    ("async", Keyword::Async),
    ("await", Keyword::Await),
];

impl Keyword {
    pub fn lookup(text: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == text)
            .map(|(_, keyword)| *keyword)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map(|(spelling, _)| *spelling)
            .unwrap_or("<keyword>")
    }

    pub fn class(self) -> KeywordClass {
        match self {
            Keyword::Pass | Keyword::Break | Keyword::Continue => KeywordClass::Simple,
            Keyword::Def | Keyword::Class | Keyword::If | Keyword::For | Keyword::While => {
                KeywordClass::Compound
            }
            Keyword::True | Keyword::False | Keyword::None => KeywordClass::Atom,
            _ => KeywordClass::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SumOp {
    Add,
    Sub,
}

impl SumOp {
    pub fn as_str(self) -> &'static str {
        match self {
            SumOp::Add => "+",
            SumOp::Sub => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermOp {
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl TermOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TermOp::Mul => "*",
            TermOp::Div => "/",
            TermOp::FloorDiv => "//",
            TermOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::Greater => ">",
            Comparison::LessEqual => "<=",
            Comparison::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AugmentedOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AugmentedOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AugmentedOp::Add => "+=",
            AugmentedOp::Sub => "-=",
            AugmentedOp::Mul => "*=",
            AugmentedOp::Div => "/=",
            AugmentedOp::FloorDiv => "//=",
            AugmentedOp::Mod => "%=",
            AugmentedOp::Pow => "**=",
            AugmentedOp::MatMul => "@=",
            AugmentedOp::BitAnd => "&=",
            AugmentedOp::BitOr => "|=",
            AugmentedOp::BitXor => "^=",
            AugmentedOp::Shl => "<<=",
            AugmentedOp::Shr => ">>=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Comma,
    Colon,
    Dot,
    Semicolon,
    Assign,
    Arrow,
    Augmented(AugmentedOp),
}

impl Delimiter {
    pub fn as_str(self) -> &'static str {
        match self {
            Delimiter::ParenOpen => "(",
            Delimiter::ParenClose => ")",
            Delimiter::BracketOpen => "[",
            Delimiter::BracketClose => "]",
            Delimiter::BraceOpen => "{",
            Delimiter::BraceClose => "}",
            Delimiter::Comma => ",",
            Delimiter::Colon => ":",
            Delimiter::Dot => ".",
            Delimiter::Semicolon => ";",
            Delimiter::Assign => "=",
            Delimiter::Arrow => "->",
            Delimiter::Augmented(op) => op.as_str(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
