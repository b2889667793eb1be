use rstest::rstest;
use string_interner::DefaultStringInterner;

use crate::ast::*;
use crate::class_registry::ClassRegistry;
use crate::error::{FrontendError, SemanticErrorKind};
use crate::parse_source;
use crate::parser::error::ParserErrorKind;
use crate::token::{AugmentedOp, Comparison, SumOp, TermOp};

struct Parsed {
    program: Program,
    registry: ClassRegistry,
    interner: DefaultStringInterner,
}

impl Parsed {
    fn symbol(&self, name: &str) -> string_interner::DefaultSymbol {
        self.interner.get(name).expect("name should be interned")
    }
}

fn parse_ok(source: &str) -> Parsed {
    let mut interner = DefaultStringInterner::new();
    let (program, registry) = parse_source(source, &mut interner)
        .unwrap_or_else(|e| panic!("parse failed for {source:?}: {e}"));
    Parsed { program, registry, interner }
}

fn parse_err(source: &str) -> FrontendError {
    let mut interner = DefaultStringInterner::new();
    parse_source(source, &mut interner).expect_err("parse should fail")
}

fn semantic_kind(source: &str) -> SemanticErrorKind {
    match parse_err(source) {
        FrontendError::Semantic(e) => e.kind,
        other => panic!("expected a semantic error, got {other}"),
    }
}

fn expression_of(statement: &Statement) -> &Expression {
    match statement {
        Statement::Simple(SimpleStatement::Expressions(list)) => &list.expressions[0],
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

fn assignment_of(statement: &Statement) -> &Assignment {
    match statement {
        Statement::Simple(SimpleStatement::Assignment(assignment)) => assignment,
        other => panic!("expected an assignment, got {other:?}"),
    }
}

fn class_of(statement: &Statement) -> &ClassDef {
    match statement {
        Statement::Compound(CompoundStatement::ClassDef(class)) => class,
        other => panic!("expected a class, got {other:?}"),
    }
}

#[test]
fn function_definition_followed_by_call() {
    let parsed = parse_ok("def add(a, b):\n    return a + b\nprint(add(2, 3))\n");
    assert_eq!(parsed.program.statements.len(), 2);

    let Statement::Compound(CompoundStatement::FunctionDef(def)) = &parsed.program.statements[0]
    else {
        panic!("expected a function definition");
    };
    assert_eq!(def.name, parsed.symbol("add"));
    assert_eq!(def.arity(), 2);
    let Statement::Simple(SimpleStatement::Return(ret)) = &def.body.statements[0] else {
        panic!("expected return");
    };
    let sum = ret.value.as_ref().unwrap().expressions[0].as_sum().unwrap();
    assert_eq!(sum.rest.len(), 1);
    assert_eq!(sum.rest[0].0, SumOp::Add);

    let call = expression_of(&parsed.program.statements[1]).as_primary().unwrap();
    let Atom::Builtin(print) = &call.atom else {
        panic!("expected builtin call, got {:?}", call.atom);
    };
    assert_eq!(print.name, "print");
    let inner = print.arguments.values[0].as_primary().unwrap();
    assert_eq!(inner.atom, Atom::Name(parsed.symbol("add")));
    assert!(matches!(&inner.trailers[..], [Trailer::Call(args)] if args.values.len() == 2));
}

#[rstest]
#[case("x = f(a == b)\n", true)]
#[case("f(x == 1)\n", false)]
#[case("a[i] = 3\n", true)]
#[case("self.x = y\n", true)]
#[case("g(h=1) if\n", false)]
fn assignment_lookahead(#[case] source: &str, #[case] is_assignment: bool) {
    let mut interner = DefaultStringInterner::new();
    let tokens = crate::tokenize(source, &mut interner).unwrap();
    let parser = crate::Parser::new(tokens, &mut interner);
    assert_eq!(parser.line_has_assignment(), is_assignment);
}

#[test]
fn annotated_and_augmented_assignments() {
    let parsed = parse_ok("x: int = 5\nx += 1\n");
    let first = assignment_of(&parsed.program.statements[0]);
    assert_eq!(first.op, AssignOp::Assign);
    assert_eq!(first.targets[0].annotation.as_ref().unwrap().name, "int");

    let second = assignment_of(&parsed.program.statements[1]);
    assert_eq!(second.op, AssignOp::Augmented(AugmentedOp::Add));
}

#[test]
fn augmented_assignment_needs_single_target() {
    match parse_err("a, b += 1\n") {
        FrontendError::Parser(e) => assert_eq!(e.kind, ParserErrorKind::InvalidAugmentedTarget),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn tuple_target_from_namespaced_call() {
    let parsed = parse_ok("m, n = np.shape(X)\n");
    let assignment = assignment_of(&parsed.program.statements[0]);
    assert_eq!(assignment.targets.len(), 2);
    let value = assignment.value.expressions[0].as_primary().unwrap();
    assert!(matches!(&value.atom, Atom::Namespaced(call) if call.name == "shape"));
}

#[test]
fn builtin_names_can_be_variables() {
    let parsed = parse_ok("sum = 0\ntotal = sum\n");
    assert_eq!(assignment_of(&parsed.program.statements[0]).targets[0].name, parsed.symbol("sum"));
    let value = assignment_of(&parsed.program.statements[1]).value.expressions[0]
        .as_primary()
        .unwrap();
    assert_eq!(value.atom, Atom::Name(parsed.symbol("sum")));
}

#[test]
fn arithmetic_precedence() {
    let parsed = parse_ok("a + b * c ** -d\n");
    let sum = expression_of(&parsed.program.statements[0]).as_sum().unwrap();
    assert_eq!(sum.rest.len(), 1);
    let (op, term) = &sum.rest[0];
    assert_eq!(*op, SumOp::Add);
    assert_eq!(term.rest.len(), 1);
    assert_eq!(term.rest[0].0, TermOp::Mul);
    let Factor::Power(power) = &term.rest[0].1 else {
        panic!("expected power");
    };
    assert_eq!(power.base.atom, Atom::Name(parsed.symbol("c")));
    assert!(matches!(power.exponent.as_deref(), Some(Factor::Unary(SumOp::Sub, _))));
}

#[test]
fn comparison_chains_and_logic() {
    let parsed = parse_ok("not a and b or x < y <= z\n");
    let disjunction = &expression_of(&parsed.program.statements[0]).disjunction;
    assert_eq!(disjunction.operands.len(), 2);
    let first = &disjunction.operands[0];
    assert_eq!(first.operands.len(), 2);
    assert!(matches!(first.operands[0], Inversion::Not(_)));

    let Inversion::Comparison(chain) = &disjunction.operands[1].operands[0] else {
        panic!("expected comparison");
    };
    let ops: Vec<Comparison> = chain.rest.iter().map(|(op, _)| *op).collect();
    assert_eq!(ops, vec![Comparison::Less, Comparison::LessEqual]);
}

#[test]
fn if_elif_else_chain() {
    let parsed = parse_ok("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
    let Statement::Compound(CompoundStatement::If(statement)) = &parsed.program.statements[0]
    else {
        panic!("expected if");
    };
    let Some(ElseBranch::Elif(elif)) = &statement.orelse else {
        panic!("expected elif");
    };
    assert!(matches!(elif.orelse, Some(ElseBranch::Else(ref block)) if block.statements.len() == 1));
}

#[test]
fn for_and_while_loops() {
    let parsed = parse_ok("for i in range(3):\n    while i:\n        break\n");
    let Statement::Compound(CompoundStatement::For(for_loop)) = &parsed.program.statements[0]
    else {
        panic!("expected for");
    };
    assert_eq!(for_loop.target, parsed.symbol("i"));
    assert!(matches!(
        for_loop.body.statements[0],
        Statement::Compound(CompoundStatement::While(_))
    ));
}

#[test]
fn slices_and_indices() {
    let parsed = parse_ok("a[1:4, ::2, i]\n");
    let primary = expression_of(&parsed.program.statements[0]).as_primary().unwrap();
    let [Trailer::Subscript(slices)] = primary.trailers.as_slice() else {
        panic!("expected subscript");
    };
    assert!(matches!(
        &slices[0],
        Slice::Range { lower: Some(_), upper: Some(_), step: None }
    ));
    assert!(matches!(&slices[1], Slice::Range { lower: None, upper: None, step: Some(_) }));
    assert!(matches!(&slices[2], Slice::Index(_)));
}

#[test]
fn lists_and_fstrings() {
    let parsed = parse_ok("x = []\ns = f\"x={x + 1}\"\n");
    let list = assignment_of(&parsed.program.statements[0]).value.expressions[0]
        .as_primary()
        .unwrap();
    assert_eq!(list.atom, Atom::List(Vec::new()));

    let fstring = assignment_of(&parsed.program.statements[1]).value.expressions[0]
        .as_primary()
        .unwrap();
    let Atom::FString(parts) = &fstring.atom else {
        panic!("expected f-string");
    };
    assert_eq!(parts[0], FStringPart::Literal("x=".to_string()));
    assert!(matches!(&parts[1], FStringPart::Expression(e) if e.as_sum().unwrap().rest.len() == 1));
}

#[test]
fn default_parameters_and_return_annotation() {
    let parsed = parse_ok("def f(a: int, b: float = 1.5) -> float:\n    return a * b\n");
    let Statement::Compound(CompoundStatement::FunctionDef(def)) = &parsed.program.statements[0]
    else {
        panic!("expected def");
    };
    assert_eq!(def.parameters[0].annotation.as_ref().unwrap().name, "int");
    assert!(def.parameters[1].default.is_some());
    assert_eq!(def.return_type.as_ref().unwrap().name, "float");
}

#[test]
fn constructor_introspection_records_top_level_attributes() {
    let source = "\
class Animal:
    def __init__(self, name: str, age):
        self.name: str = name
        self.age = age
        if age > 3:
            self.old = True
        self.tags = []
        self.age = age + 1

    def grow(self):
        self.size = 2
";
    let parsed = parse_ok(source);
    let class = class_of(&parsed.program.statements[0]);
    let names: Vec<&str> = class
        .attributes
        .iter()
        .map(|a| parsed.interner.resolve(*a).unwrap())
        .collect();
    assert_eq!(names, vec!["name", "age", "tags"]);
    assert_eq!(class.attribute_types.len(), 1);
    assert_eq!(class.attribute_types[&parsed.symbol("name")].name, "str");
    assert!(parsed.registry.contains(parsed.symbol("Animal")));
}

#[test]
fn subclass_registers_with_its_superclass() {
    let parsed = parse_ok("class A:\n    pass\nclass B(A):\n    pass\n");
    let b = parsed.registry.get(parsed.symbol("B")).unwrap();
    assert_eq!(b.superclass, Some(parsed.symbol("A")));
}

#[test]
fn super_call_forms() {
    let source = "\
class A:
    def __init__(self, x):
        self.x = x
    def area(self):
        return 1
class B(A):
    def __init__(self, x):
        super().__init__(x)
        super(A).__init__(x)
    def area(self):
        return super().area() * 2
";
    let parsed = parse_ok(source);
    let b = class_of(&parsed.program.statements[1]);
    let init = b.methods().next().unwrap();
    let Statement::Simple(SimpleStatement::SuperCall(implicit)) = &init.body.statements[0] else {
        panic!("expected super call statement");
    };
    assert_eq!(implicit.superclass, None);
    assert_eq!(implicit.method, parsed.symbol("__init__"));
    let Statement::Simple(SimpleStatement::SuperCall(explicit)) = &init.body.statements[1] else {
        panic!("expected super call statement");
    };
    assert_eq!(explicit.superclass, Some(parsed.symbol("A")));
    assert_eq!(explicit.arguments.values.len(), 1);

    let area = b.methods().nth(1).unwrap();
    let Statement::Simple(SimpleStatement::Return(ret)) = &area.body.statements[0] else {
        panic!("expected return");
    };
    let term = ret.value.as_ref().unwrap().expressions[0]
        .as_sum()
        .unwrap()
        .as_term()
        .unwrap();
    assert!(matches!(
        term.first.as_primary().map(|p| &p.atom),
        Some(Atom::Super(_))
    ));
}

#[test]
fn overloads_by_arity_are_accepted() {
    let source = "\
class P:
    def __init__(self):
        self.x = 0
    def __init__(self, x):
        self.x = x
";
    let parsed = parse_ok(source);
    let class = class_of(&parsed.program.statements[0]);
    assert_eq!(class.methods().count(), 2);
}

#[rstest]
#[case(
    "class B(A):\n    pass\n",
    SemanticErrorKind::UnknownSuperclass { class: "B".into(), superclass: "A".into() }
)]
#[case(
    "class A:\n    pass\nclass A:\n    pass\n",
    SemanticErrorKind::DuplicateClass("A".into())
)]
#[case(
    "class A:\n    def f(self):\n        pass\n    def f(self):\n        pass\n",
    SemanticErrorKind::DuplicateMethod { class: "A".into(), method: "f".into(), arity: 1 }
)]
#[case(
    "def f():\n    class A:\n        pass\n",
    SemanticErrorKind::NestedClass("A".into())
)]
#[case(
    "class A:\n    x = 1\n",
    SemanticErrorKind::UnsupportedClassStatement("class attribute assignment".into())
)]
fn class_definition_errors(#[case] source: &str, #[case] expected: SemanticErrorKind) {
    assert_eq!(semantic_kind(source), expected);
}

#[test]
fn docstrings_are_allowed_in_class_bodies() {
    parse_ok("class A:\n    \"\"\"An animal.\"\"\"\n    def f(self):\n        pass\n");
}

#[rstest]
#[case("if a:\npass\n", "an indented block")]
#[case("def f()\n    pass\n", "':'")]
#[case("x = 1 +\n", "an expression")]
#[case("x = (1\n", "')'")]
#[case("print(1 2)\n", "',' or ')' in the argument list")]
#[case("x = 1 = 2\n", "end of line")]
fn syntax_errors_name_the_expected_construct(#[case] source: &str, #[case] expected: &str) {
    match parse_err(source) {
        FrontendError::Parser(e) => match e.kind {
            ParserErrorKind::UnexpectedToken { expected: actual, .. } => {
                assert_eq!(actual, expected)
            }
            other => panic!("unexpected kind {other:?}"),
        },
        other => panic!("expected a syntax error, got {other}"),
    }
}

#[test]
fn syntax_error_message_has_position() {
    let message = parse_err("x = 1 +\n").to_string();
    assert_eq!(message, "syntax error: 1:8: expected an expression, found newline");
}

#[test]
fn empty_source_is_an_empty_program() {
    let parsed = parse_ok("\n# only a comment\n");
    assert!(parsed.program.statements.is_empty());
}
