use std::collections::{HashMap, HashSet};

use string_interner::DefaultSymbol;

use super::core::Parser;
use super::error::{ParserError, ParserErrorKind, ParserResult};
use super::expr::{parse_expression, parse_expression_list, parse_trailer, starts_expression};
use crate::ast::*;
use crate::error::{SemanticError, SemanticErrorKind};
use crate::token::{Delimiter, Keyword, KeywordClass, Kind};

const INITIALIZER: &str = "__init__";

pub fn parse_statement(parser: &mut Parser) -> ParserResult<Statement> {
    if let Kind::Keyword(keyword) = parser.peek() {
        if keyword.class() == KeywordClass::Compound {
            return parse_compound_statement(parser).map(Statement::Compound);
        }
    }
    let statement = parse_simple_statement(parser)?;
    parser.expect(&Kind::NewLine, "end of line")?;
    Ok(Statement::Simple(statement))
}

fn parse_compound_statement(parser: &mut Parser) -> ParserResult<CompoundStatement> {
    match parser.peek() {
        Kind::Keyword(Keyword::Def) => parse_function_def(parser).map(CompoundStatement::FunctionDef),
        Kind::Keyword(Keyword::Class) => parse_class_def(parser).map(CompoundStatement::ClassDef),
        Kind::Keyword(Keyword::If) => parse_if(parser).map(CompoundStatement::If),
        Kind::Keyword(Keyword::For) => parse_for(parser).map(CompoundStatement::For),
        Kind::Keyword(Keyword::While) => parse_while(parser).map(CompoundStatement::While),
        _ => Err(parser.unexpected("a compound statement")),
    }
}

pub fn parse_simple_statement(parser: &mut Parser) -> ParserResult<SimpleStatement> {
    match parser.peek() {
        Kind::Keyword(Keyword::Return) => parse_return(parser).map(SimpleStatement::Return),
        Kind::Keyword(Keyword::Pass) => {
            parser.next();
            Ok(SimpleStatement::Pass)
        }
        Kind::Keyword(Keyword::Break) => {
            parser.next();
            Ok(SimpleStatement::Break)
        }
        Kind::Keyword(Keyword::Continue) => {
            parser.next();
            Ok(SimpleStatement::Continue)
        }
        Kind::Identifier(_) | Kind::Function(_) if parser.line_has_assignment() => {
            parse_assignment(parser).map(SimpleStatement::Assignment)
        }
        _ => {
            let list = parse_expression_list(parser)?;
            if let Some(call) = bare_super_call(&list) {
                return Ok(SimpleStatement::SuperCall(call.clone()));
            }
            Ok(SimpleStatement::Expressions(list))
        }
    }
}

/// `super().method(args)` standing alone as a statement.
fn bare_super_call(list: &ExpressionList) -> Option<&SuperCall> {
    let [expression] = list.expressions.as_slice() else {
        return None;
    };
    match expression.as_primary()? {
        Primary { atom: Atom::Super(call), trailers, .. } if trailers.is_empty() => Some(call),
        _ => None,
    }
}

fn parse_return(parser: &mut Parser) -> ParserResult<ReturnStatement> {
    let start = parser.location();
    parser.expect_keyword(Keyword::Return)?;
    let value = if starts_expression(parser.peek()) {
        Some(parse_expression_list(parser)?)
    } else {
        None
    };
    Ok(ReturnStatement { value, span: parser.span_from(start) })
}

/// `declaration {, declaration} (= | op=) expression-list`
fn parse_assignment(parser: &mut Parser) -> ParserResult<Assignment> {
    let start = parser.location();
    let mut targets = vec![parse_declaration(parser)?];
    while parser.peek().is_delimiter(Delimiter::Comma) {
        parser.next();
        targets.push(parse_declaration(parser)?);
    }

    let op = match parser.peek() {
        Kind::Delimiter(Delimiter::Assign) => AssignOp::Assign,
        Kind::Delimiter(Delimiter::Augmented(op)) => AssignOp::Augmented(*op),
        _ => return Err(parser.unexpected("'=' or an augmented assignment")),
    };
    if matches!(op, AssignOp::Augmented(_)) && targets.len() != 1 {
        return Err(ParserError {
            kind: ParserErrorKind::InvalidAugmentedTarget,
            location: parser.location(),
        }
        .into());
    }
    parser.next();

    let value = parse_expression_list(parser)?;
    Ok(Assignment { targets, op, value, span: parser.span_from(start) })
}

/// `NAME {trailer} [: annotation]`
fn parse_declaration(parser: &mut Parser) -> ParserResult<Declaration> {
    let start = parser.location();
    let name = parser.expect_name("an assignment target")?;
    let mut accesses = Vec::new();
    while matches!(
        parser.peek(),
        Kind::Delimiter(Delimiter::Dot | Delimiter::BracketOpen | Delimiter::ParenOpen)
    ) {
        accesses.push(parse_trailer(parser)?);
    }
    let annotation = if parser.peek().is_delimiter(Delimiter::Colon) {
        parser.next();
        Some(parser.parse_type_annotation()?)
    } else {
        None
    };
    Ok(Declaration { name, annotation, accesses, span: parser.span_from(start) })
}

/// `def NAME ( params ) [-> annotation] : block`
fn parse_function_def(parser: &mut Parser) -> ParserResult<FunctionDef> {
    let start = parser.location();
    parser.expect_keyword(Keyword::Def)?;
    let name = parser.expect_name("a function name")?;
    let parameters = parser.parse_parameters()?;
    let return_type = if parser.peek().is_delimiter(Delimiter::Arrow) {
        parser.next();
        Some(parser.parse_type_annotation()?)
    } else {
        None
    };
    parser.expect_delimiter(Delimiter::Colon)?;
    let body = parser.parse_block()?;
    Ok(FunctionDef { name, parameters, return_type, body, span: parser.span_from(start) })
}

/// `class NAME [( [NAME] )] : block`
///
/// After the body is parsed the constructor is scanned for declared
/// attributes and the class is entered into the registry.
fn parse_class_def(parser: &mut Parser) -> ParserResult<ClassDef> {
    let start = parser.location();
    parser.expect_keyword(Keyword::Class)?;
    let name = parser.expect_name("a class name")?;
    if parser.block_depth > 0 {
        return Err(SemanticError::at(
            SemanticErrorKind::NestedClass(parser.name_of(name).to_string()),
            start,
        )
        .into());
    }

    let mut superclass = None;
    if parser.peek().is_delimiter(Delimiter::ParenOpen) {
        parser.next();
        if !parser.peek().is_delimiter(Delimiter::ParenClose) {
            superclass = Some(parser.expect_name("a superclass name")?);
        }
        parser.expect_delimiter(Delimiter::ParenClose)?;
    }
    parser.expect_delimiter(Delimiter::Colon)?;

    let header_end = parser.span_from(start);
    let body = parser.parse_block()?;
    check_class_body(parser, name, &body)?;

    let initializer = parser.intern(INITIALIZER);
    let (attributes, attribute_types) = discover_attributes(&body, initializer);
    let class = ClassDef {
        name,
        superclass,
        body,
        attributes,
        attribute_types,
        span: header_end,
    };
    parser.register_class(class.clone())?;
    Ok(class)
}

/// Class bodies hold methods, `pass` and docstrings only. Two methods with
/// the same name must differ in arity.
fn check_class_body(parser: &Parser, class: DefaultSymbol, body: &Block) -> ParserResult<()> {
    let class_name = parser.name_of(class).to_string();
    let mut seen = HashSet::new();
    for statement in &body.statements {
        match statement {
            Statement::Compound(CompoundStatement::FunctionDef(method)) => {
                if !seen.insert((method.name, method.arity())) {
                    return Err(SemanticError::at(
                        SemanticErrorKind::DuplicateMethod {
                            class: class_name,
                            method: parser.name_of(method.name).to_string(),
                            arity: method.arity(),
                        },
                        method.span.start,
                    )
                    .into());
                }
            }
            Statement::Simple(SimpleStatement::Pass) => {}
            Statement::Simple(SimpleStatement::Expressions(list)) if is_docstring(list) => {}
            other => {
                return Err(SemanticError::new(
                    SemanticErrorKind::UnsupportedClassStatement(describe_statement(other)),
                    None,
                )
                .into());
            }
        }
    }
    Ok(())
}

fn is_docstring(list: &ExpressionList) -> bool {
    matches!(
        list.expressions.as_slice(),
        [expression] if matches!(expression.as_primary(), Some(Primary { atom: Atom::Str(_), trailers, .. }) if trailers.is_empty())
    )
}

fn describe_statement(statement: &Statement) -> String {
    match statement {
        Statement::Simple(SimpleStatement::Assignment(_)) => "class attribute assignment",
        Statement::Simple(SimpleStatement::Return(_)) => "return",
        Statement::Simple(_) => "expression statement",
        Statement::Compound(CompoundStatement::ClassDef(_)) => "nested class",
        Statement::Compound(CompoundStatement::If(_)) => "if",
        Statement::Compound(CompoundStatement::For(_)) => "for",
        Statement::Compound(CompoundStatement::While(_)) => "while",
        Statement::Compound(CompoundStatement::FunctionDef(_)) => "function",
    }
    .to_string()
}

/// Collects `<receiver>.<name> = ...` targets from the top level of every
/// `__init__` body, with the first annotation seen for each name.
pub fn discover_attributes(
    body: &Block,
    initializer: DefaultSymbol,
) -> (Vec<DefaultSymbol>, HashMap<DefaultSymbol, TypeAnnotation>) {
    let mut attributes = Vec::new();
    let mut attribute_types = HashMap::new();
    for statement in &body.statements {
        let Statement::Compound(CompoundStatement::FunctionDef(method)) = statement else {
            continue;
        };
        if method.name != initializer {
            continue;
        }
        let Some(receiver) = method.receiver() else {
            continue;
        };
        for statement in &method.body.statements {
            let Statement::Simple(SimpleStatement::Assignment(assignment)) = statement else {
                continue;
            };
            if assignment.op != AssignOp::Assign {
                continue;
            }
            for target in &assignment.targets {
                let Some(attribute) = target.attribute_of(receiver) else {
                    continue;
                };
                if !attributes.contains(&attribute) {
                    attributes.push(attribute);
                }
                if let Some(annotation) = &target.annotation {
                    attribute_types.entry(attribute).or_insert_with(|| annotation.clone());
                }
            }
        }
    }
    (attributes, attribute_types)
}

/// `if expr : block {elif expr : block} [else : block]`
fn parse_if(parser: &mut Parser) -> ParserResult<IfStatement> {
    parser.expect_keyword(Keyword::If)?;
    parse_if_tail(parser)
}

fn parse_if_tail(parser: &mut Parser) -> ParserResult<IfStatement> {
    let start = parser.location();
    let condition = parse_expression(parser)?;
    parser.expect_delimiter(Delimiter::Colon)?;
    let body = parser.parse_block()?;
    let orelse = match parser.peek() {
        Kind::Keyword(Keyword::Elif) => {
            parser.next();
            Some(ElseBranch::Elif(Box::new(parse_if_tail(parser)?)))
        }
        Kind::Keyword(Keyword::Else) => {
            parser.next();
            parser.expect_delimiter(Delimiter::Colon)?;
            Some(ElseBranch::Else(parser.parse_block()?))
        }
        _ => None,
    };
    Ok(IfStatement { condition, body, orelse, span: parser.span_from(start) })
}

/// `for NAME in expression-list : block`
fn parse_for(parser: &mut Parser) -> ParserResult<ForStatement> {
    let start = parser.location();
    parser.expect_keyword(Keyword::For)?;
    let target = parser.expect_name("a loop variable")?;
    parser.expect_keyword(Keyword::In)?;
    let iterable = parse_expression_list(parser)?;
    parser.expect_delimiter(Delimiter::Colon)?;
    let body = parser.parse_block()?;
    Ok(ForStatement { target, iterable, body, span: parser.span_from(start) })
}

/// `while expr : block`
fn parse_while(parser: &mut Parser) -> ParserResult<WhileStatement> {
    let start = parser.location();
    parser.expect_keyword(Keyword::While)?;
    let condition = parse_expression(parser)?;
    parser.expect_delimiter(Delimiter::Colon)?;
    let body = parser.parse_block()?;
    Ok(WhileStatement { condition, body, span: parser.span_from(start) })
}
