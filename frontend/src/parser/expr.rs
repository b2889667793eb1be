use super::core::Parser;
use super::error::ParserResult;
use crate::ast::*;
use crate::token::{Comparison, Delimiter, FStringFragment, Keyword, Kind, SumOp, TermOp};

const SUPER: &str = "super";

/// FIRST set of `expression`.
pub fn starts_expression(kind: &Kind) -> bool {
    matches!(
        kind,
        Kind::Identifier(_)
            | Kind::Keyword(Keyword::True | Keyword::False | Keyword::None | Keyword::Not)
            | Kind::Integer(_)
            | Kind::Float(_)
            | Kind::Str(_)
            | Kind::FString(_)
            | Kind::SumOp(_)
            | Kind::Delimiter(Delimiter::ParenOpen | Delimiter::BracketOpen)
            | Kind::Namespace
            | Kind::Function(_)
    )
}

/// Parses `operand {op operand}` for one left-associative precedence level.
fn parse_chain<T, Op>(
    parser: &mut Parser,
    operand: fn(&mut Parser) -> ParserResult<T>,
    operator: fn(&Kind) -> Option<Op>,
) -> ParserResult<(T, Vec<(Op, T)>)> {
    let first = operand(parser)?;
    let mut rest = Vec::new();
    while let Some(op) = operator(parser.peek()) {
        parser.next();
        rest.push((op, operand(parser)?));
    }
    Ok((first, rest))
}

pub fn parse_expression_list(parser: &mut Parser) -> ParserResult<ExpressionList> {
    let mut expressions = vec![parse_expression(parser)?];
    while parser.peek().is_delimiter(Delimiter::Comma) {
        parser.next();
        expressions.push(parse_expression(parser)?);
    }
    Ok(ExpressionList { expressions })
}

pub fn parse_expression(parser: &mut Parser) -> ParserResult<Expression> {
    let start = parser.location();
    let disjunction = parse_disjunction(parser)?;
    Ok(Expression { disjunction, span: parser.span_from(start) })
}

fn parse_disjunction(parser: &mut Parser) -> ParserResult<Disjunction> {
    let mut operands = vec![parse_conjunction(parser)?];
    while parser.peek().is_keyword(Keyword::Or) {
        parser.next();
        operands.push(parse_conjunction(parser)?);
    }
    Ok(Disjunction { operands })
}

fn parse_conjunction(parser: &mut Parser) -> ParserResult<Conjunction> {
    let mut operands = vec![parse_inversion(parser)?];
    while parser.peek().is_keyword(Keyword::And) {
        parser.next();
        operands.push(parse_inversion(parser)?);
    }
    Ok(Conjunction { operands })
}

fn parse_inversion(parser: &mut Parser) -> ParserResult<Inversion> {
    if parser.peek().is_keyword(Keyword::Not) {
        parser.next();
        return Ok(Inversion::Not(Box::new(parse_inversion(parser)?)));
    }
    parse_comparison(parser).map(Inversion::Comparison)
}

fn parse_comparison(parser: &mut Parser) -> ParserResult<ComparisonChain> {
    let (first, rest) = parse_chain(parser, parse_sum, |kind| match kind {
        Kind::Comparison(op) => Some(*op),
        _ => None::<Comparison>,
    })?;
    Ok(ComparisonChain { first, rest })
}

fn parse_sum(parser: &mut Parser) -> ParserResult<Sum> {
    let (first, rest) = parse_chain(parser, parse_term, |kind| match kind {
        Kind::SumOp(op) => Some(*op),
        _ => None::<SumOp>,
    })?;
    Ok(Sum { first, rest })
}

fn parse_term(parser: &mut Parser) -> ParserResult<Term> {
    let (first, rest) = parse_chain(parser, parse_factor, |kind| match kind {
        Kind::TermOp(op) => Some(*op),
        _ => None::<TermOp>,
    })?;
    Ok(Term { first, rest })
}

fn parse_factor(parser: &mut Parser) -> ParserResult<Factor> {
    if let Kind::SumOp(op) = *parser.peek() {
        parser.next();
        return Ok(Factor::Unary(op, Box::new(parse_factor(parser)?)));
    }
    parse_power(parser).map(Factor::Power)
}

fn parse_power(parser: &mut Parser) -> ParserResult<Power> {
    let base = parse_primary(parser)?;
    let exponent = if *parser.peek() == Kind::Power {
        parser.next();
        Some(Box::new(parse_factor(parser)?))
    } else {
        None
    };
    Ok(Power { base, exponent })
}

fn parse_primary(parser: &mut Parser) -> ParserResult<Primary> {
    let start = parser.location();
    let atom = parse_atom(parser)?;
    let mut trailers = Vec::new();
    while matches!(
        parser.peek(),
        Kind::Delimiter(Delimiter::Dot | Delimiter::BracketOpen | Delimiter::ParenOpen)
    ) {
        trailers.push(parse_trailer(parser)?);
    }
    Ok(Primary { atom, trailers, span: parser.span_from(start) })
}

/// `.name`, `(args)` or `[slices]`
pub fn parse_trailer(parser: &mut Parser) -> ParserResult<Trailer> {
    match parser.peek() {
        Kind::Delimiter(Delimiter::Dot) => {
            parser.next();
            let start = parser.location();
            let name = parser.expect_name("an attribute name")?;
            Ok(Trailer::Attribute(name, parser.span_from(start)))
        }
        Kind::Delimiter(Delimiter::ParenOpen) => parse_arguments(parser).map(Trailer::Call),
        Kind::Delimiter(Delimiter::BracketOpen) => {
            parser.next();
            let mut slices = vec![parse_slice(parser)?];
            while parser.peek().is_delimiter(Delimiter::Comma) {
                parser.next();
                slices.push(parse_slice(parser)?);
            }
            parser.expect_delimiter(Delimiter::BracketClose)?;
            Ok(Trailer::Subscript(slices))
        }
        _ => Err(parser.unexpected("'.', '(' or '['")),
    }
}

/// `( [expr {, expr} [,]] )`
pub fn parse_arguments(parser: &mut Parser) -> ParserResult<Arguments> {
    let start = parser.location();
    parser.expect_delimiter(Delimiter::ParenOpen)?;
    let mut values = Vec::new();
    while !parser.peek().is_delimiter(Delimiter::ParenClose) {
        values.push(parse_expression(parser)?);
        if parser.peek().is_delimiter(Delimiter::Comma) {
            parser.next();
        } else if !parser.peek().is_delimiter(Delimiter::ParenClose) {
            return Err(parser.unexpected("',' or ')' in the argument list"));
        }
    }
    parser.expect_delimiter(Delimiter::ParenClose)?;
    Ok(Arguments { values, span: parser.span_from(start) })
}

fn parse_optional_expression(parser: &mut Parser) -> ParserResult<Option<Expression>> {
    if starts_expression(parser.peek()) {
        parse_expression(parser).map(Some)
    } else {
        Ok(None)
    }
}

/// `expr` or `[lower] : [upper] [: [step]]`
fn parse_slice(parser: &mut Parser) -> ParserResult<Slice> {
    let lower = parse_optional_expression(parser)?;
    if !parser.peek().is_delimiter(Delimiter::Colon) {
        return match lower {
            Some(index) => Ok(Slice::Index(index)),
            None => Err(parser.unexpected("an index or slice")),
        };
    }
    parser.next();
    let upper = parse_optional_expression(parser)?;
    let mut step = None;
    if parser.peek().is_delimiter(Delimiter::Colon) {
        parser.next();
        step = parse_optional_expression(parser)?;
    }
    Ok(Slice::Range { lower, upper, step })
}

fn parse_atom(parser: &mut Parser) -> ParserResult<Atom> {
    match parser.peek() {
        Kind::Identifier(symbol) => {
            let symbol = *symbol;
            if parser.name_of(symbol) == SUPER
                && parser.peek_n(1).is_delimiter(Delimiter::ParenOpen)
            {
                return parse_super_call(parser).map(Atom::Super);
            }
            parser.next();
            Ok(Atom::Name(symbol))
        }
        Kind::Keyword(Keyword::True) => {
            parser.next();
            Ok(Atom::True)
        }
        Kind::Keyword(Keyword::False) => {
            parser.next();
            Ok(Atom::False)
        }
        Kind::Keyword(Keyword::None) => {
            parser.next();
            Ok(Atom::None)
        }
        Kind::Integer(_) | Kind::Float(_) | Kind::Str(_) | Kind::FString(_) => {
            match parser.next().kind {
                Kind::Integer(n) => Ok(Atom::Integer(n)),
                Kind::Float(n) => Ok(Atom::Float(n)),
                Kind::Str(text) => Ok(Atom::Str(text)),
                Kind::FString(fragments) => parse_fstring(parser, fragments).map(Atom::FString),
                _ => Err(parser.unexpected("a literal")),
            }
        }
        Kind::Delimiter(Delimiter::ParenOpen) => {
            parser.next();
            let inner = parse_expression(parser)?;
            parser.expect_delimiter(Delimiter::ParenClose)?;
            Ok(Atom::Group(Box::new(inner)))
        }
        Kind::Delimiter(Delimiter::BracketOpen) => {
            parser.next();
            let mut elements = Vec::new();
            while !parser.peek().is_delimiter(Delimiter::BracketClose) {
                elements.push(parse_expression(parser)?);
                if parser.peek().is_delimiter(Delimiter::Comma) {
                    parser.next();
                } else if !parser.peek().is_delimiter(Delimiter::BracketClose) {
                    return Err(parser.unexpected("',' or ']' in the list"));
                }
            }
            parser.expect_delimiter(Delimiter::BracketClose)?;
            Ok(Atom::List(elements))
        }
        Kind::Namespace => {
            let start = parser.location();
            parser.next();
            parser.expect_delimiter(Delimiter::Dot)?;
            let name = match *parser.peek() {
                Kind::Function(name) => name.to_string(),
                Kind::Identifier(symbol) => parser.name_of(symbol).to_string(),
                _ => return Err(parser.unexpected("a numerical library function")),
            };
            parser.next();
            let arguments = parse_arguments(parser)?;
            Ok(Atom::Namespaced(FunctionCall { name, arguments, span: parser.span_from(start) }))
        }
        Kind::Function(name) => {
            let name = *name;
            let start = parser.location();
            parser.next();
            if !parser.peek().is_delimiter(Delimiter::ParenOpen) {
                return Ok(Atom::Name(parser.intern(name)));
            }
            let arguments = parse_arguments(parser)?;
            Ok(Atom::Builtin(FunctionCall {
                name: name.to_string(),
                arguments,
                span: parser.span_from(start),
            }))
        }
        _ => Err(parser.unexpected("an expression")),
    }
}

/// `super ( [NAME [, expr]] ) . NAME ( args )`
fn parse_super_call(parser: &mut Parser) -> ParserResult<SuperCall> {
    let start = parser.location();
    parser.next();
    parser.expect_delimiter(Delimiter::ParenOpen)?;
    let mut superclass = None;
    if !parser.peek().is_delimiter(Delimiter::ParenClose) {
        superclass = Some(parser.expect_name("a superclass name")?);
        if parser.peek().is_delimiter(Delimiter::Comma) {
            parser.next();
            parse_expression(parser)?;
        }
    }
    parser.expect_delimiter(Delimiter::ParenClose)?;
    parser.expect_delimiter(Delimiter::Dot)?;
    let method = parser.expect_name("a method name after super()")?;
    let arguments = parse_arguments(parser)?;
    Ok(SuperCall { superclass, method, arguments, span: parser.span_from(start) })
}

fn parse_fstring(parser: &mut Parser, fragments: Vec<FStringFragment>) -> ParserResult<Vec<FStringPart>> {
    fragments
        .into_iter()
        .map(|fragment| match fragment {
            FStringFragment::Literal(text) => Ok(FStringPart::Literal(text)),
            FStringFragment::Expression(tokens) => parser
                .parse_embedded_expression(tokens)
                .map(|expression| FStringPart::Expression(Box::new(expression))),
        })
        .collect()
}
