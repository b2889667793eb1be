//! Syntax tree produced by the parser.
//!
//! Every grammar category has its own node type and every node owns its
//! children. Names are handles into the session's string interner.

use std::collections::HashMap;

use string_interner::DefaultSymbol;

use crate::error::Span;
use crate::token::{AugmentedOp, Comparison, SumOp, TermOp};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Simple(SimpleStatement),
    Compound(CompoundStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleStatement {
    Assignment(Assignment),
    SuperCall(SuperCall),
    Return(ReturnStatement),
    Pass,
    Break,
    Continue,
    Expressions(ExpressionList),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompoundStatement {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    If(IfStatement),
    For(ForStatement),
    While(WhileStatement),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Augmented(AugmentedOp),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub targets: Vec<Declaration>,
    pub op: AssignOp,
    pub value: ExpressionList,
    pub span: Span,
}

/// Assignment target: a name, an optional annotation and the access chain
/// that follows it (`self.x`, `a[i]`, `x: int`).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: DefaultSymbol,
    pub annotation: Option<TypeAnnotation>,
    pub accesses: Vec<Trailer>,
    pub span: Span,
}

impl Declaration {
    /// The attribute name when this target is exactly `<receiver>.<name>`.
    pub fn attribute_of(&self, receiver: DefaultSymbol) -> Option<DefaultSymbol> {
        match self.accesses.as_slice() {
            [Trailer::Attribute(name, _)] if self.name == receiver => Some(*name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub name: String,
    pub arguments: Vec<TypeAnnotation>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<ExpressionList>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: DefaultSymbol,
    pub annotation: Option<TypeAnnotation>,
    pub default: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: DefaultSymbol,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDef {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// First parameter, which names the instance inside a method.
    pub fn receiver(&self) -> Option<DefaultSymbol> {
        self.parameters.first().map(|p| p.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: DefaultSymbol,
    pub superclass: Option<DefaultSymbol>,
    pub body: Block,
    /// Attributes assigned as `<receiver>.<name>` at the top level of
    /// `__init__`, in first-assignment order.
    pub attributes: Vec<DefaultSymbol>,
    pub attribute_types: HashMap<DefaultSymbol, TypeAnnotation>,
    pub span: Span,
}

impl ClassDef {
    pub fn methods(&self) -> impl Iterator<Item = &FunctionDef> {
        self.body.statements.iter().filter_map(|statement| match statement {
            Statement::Compound(CompoundStatement::FunctionDef(def)) => Some(def),
            _ => None,
        })
    }

    pub fn declares_method(&self, name: DefaultSymbol) -> bool {
        self.methods().any(|method| method.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub body: Block,
    pub orelse: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Elif(Box<IfStatement>),
    Else(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub target: DefaultSymbol,
    pub iterable: ExpressionList,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
    pub span: Span,
}

/// `super()`, `super(Base)` or `super(Base, self)` followed by `.method(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperCall {
    pub superclass: Option<DefaultSymbol>,
    pub method: DefaultSymbol,
    pub arguments: Arguments,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionList {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub disjunction: Disjunction,
    pub span: Span,
}

/// Operands joined by `or`.
#[derive(Debug, Clone, PartialEq)]
pub struct Disjunction {
    pub operands: Vec<Conjunction>,
}

/// Operands joined by `and`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conjunction {
    pub operands: Vec<Inversion>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inversion {
    Not(Box<Inversion>),
    Comparison(ComparisonChain),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonChain {
    pub first: Sum,
    pub rest: Vec<(Comparison, Sum)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sum {
    pub first: Term,
    pub rest: Vec<(SumOp, Term)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub first: Factor,
    pub rest: Vec<(TermOp, Factor)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    Unary(SumOp, Box<Factor>),
    Power(Power),
}

/// `base ** exponent`; the exponent binds right-associatively.
#[derive(Debug, Clone, PartialEq)]
pub struct Power {
    pub base: Primary,
    pub exponent: Option<Box<Factor>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primary {
    pub atom: Atom,
    pub trailers: Vec<Trailer>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trailer {
    Attribute(DefaultSymbol, Span),
    Call(Arguments),
    Subscript(Vec<Slice>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    pub values: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slice {
    Index(Expression),
    Range {
        lower: Option<Expression>,
        upper: Option<Expression>,
        step: Option<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Arguments,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Name(DefaultSymbol),
    True,
    False,
    None,
    Integer(i64),
    Float(f64),
    Str(String),
    FString(Vec<FStringPart>),
    Group(Box<Expression>),
    List(Vec<Expression>),
    /// `np.<function>(args)`
    Namespaced(FunctionCall),
    /// `<builtin>(args)`
    Builtin(FunctionCall),
    Super(SuperCall),
}

impl Expression {
    pub fn as_sum(&self) -> Option<&Sum> {
        let [conjunction] = self.disjunction.operands.as_slice() else {
            return None;
        };
        let [Inversion::Comparison(chain)] = conjunction.operands.as_slice() else {
            return None;
        };
        chain.rest.is_empty().then_some(&chain.first)
    }

    /// The primary when the expression has no operators at all.
    pub fn as_primary(&self) -> Option<&Primary> {
        self.as_sum()?.as_term()?.as_primary()
    }

    /// Value of an integer literal, including a negated one.
    pub fn as_integer(&self) -> Option<i64> {
        let term = self.as_sum()?.as_term()?;
        if !term.rest.is_empty() {
            return None;
        }
        term.first.as_integer()
    }
}

impl Sum {
    pub fn as_term(&self) -> Option<&Term> {
        self.rest.is_empty().then_some(&self.first)
    }
}

impl Term {
    pub fn as_primary(&self) -> Option<&Primary> {
        if !self.rest.is_empty() {
            return None;
        }
        self.first.as_primary()
    }
}

impl Factor {
    pub fn as_primary(&self) -> Option<&Primary> {
        match self {
            Factor::Power(Power { base, exponent: None }) => Some(base),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Factor::Unary(SumOp::Sub, inner) => inner.as_integer()?.checked_neg(),
            Factor::Unary(SumOp::Add, inner) => inner.as_integer(),
            Factor::Power(_) => self.as_primary()?.as_integer(),
        }
    }
}

impl Primary {
    pub fn as_integer(&self) -> Option<i64> {
        match (&self.atom, self.trailers.is_empty()) {
            (Atom::Integer(n), true) => Some(*n),
            _ => None,
        }
    }

    pub fn is_string_literal(&self) -> bool {
        self.trailers.is_empty() && matches!(self.atom, Atom::Str(_) | Atom::FString(_))
    }
}
