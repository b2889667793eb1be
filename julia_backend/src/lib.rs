pub mod builtins;
pub mod driver;
pub mod error;
pub mod layout;
pub mod naming;
pub mod types;

use std::collections::HashSet;
use std::fmt::Write;

use compiler_core::CompilerSession;
use frontend::ClassRegistry;
use frontend::ast;
use frontend::error::{SemanticError, SemanticErrorKind, SourceLocation};
use frontend::token::{AugmentedOp, Comparison, SumOp, TermOp};
use string_interner::{DefaultStringInterner, DefaultSymbol};
use tracing::{debug, trace};

use builtins::{CallLowering, call_lowering, list_method, list_methods};
use layout::{ClassLayout, ClassLayouts};
use naming::{escape_identifier, member_name};

pub use error::{GenResult, JuliaGenError, TranslateError};

const INITIALIZER: &str = "__init__";

/// Dynamic attribute fallback for every instance of an abstract marker type.
const PROPERTY_ACCESSORS: &str = r#"function Base.getproperty(self::{abstract}, name::Symbol)
    if hasfield(typeof(self), name)
        return getfield(self, name)
    end
    attributes = getfield(self, :__dict__)
    if haskey(attributes, name)
        return attributes[name]
    end
    error("$(typeof(self)) has no attribute $(name)")
end

function Base.setproperty!(self::{abstract}, name::Symbol, value)
    if hasfield(typeof(self), name)
        return setfield!(self, name, convert(fieldtype(typeof(self), name), value))
    end
    getfield(self, :__dict__)[name] = value
    return value
end"#;

/// Translates one compilation unit to Julia in a fresh session.
pub fn translate(source: &str) -> Result<String, TranslateError> {
    let mut session = CompilerSession::new();
    let program = session.parse_program(source)?;
    let mut generator = JuliaCodeGenerator::new(
        &program,
        session.class_registry(),
        session.string_interner(),
    );
    Ok(generator.generate()?)
}

/// What the statements being emitted lexically belong to.
#[derive(Debug, Clone, Default)]
struct Scope {
    class: Option<DefaultSymbol>,
    /// First parameter of the enclosing method.
    receiver: Option<DefaultSymbol>,
    in_initializer: bool,
    in_function: bool,
    /// Loop variables of the enclosing top-level loops.
    loop_variables: Vec<DefaultSymbol>,
    loop_depth: usize,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    /// A single index or a slice's lower bound.
    Index,
    /// A slice's upper bound.
    Upper,
    /// A slice's upper bound under a negative step.
    DescendingUpper,
}

pub struct JuliaCodeGenerator<'a> {
    output: String,
    indent_level: usize,
    program: &'a ast::Program,
    registry: &'a ClassRegistry,
    interner: &'a DefaultStringInterner,
    layouts: ClassLayouts,
    scope: Scope,
    /// Names assigned at the top level outside any loop.
    globals: HashSet<DefaultSymbol>,
    uses_statistics: bool,
}

impl<'a> JuliaCodeGenerator<'a> {
    pub fn new(
        program: &'a ast::Program,
        registry: &'a ClassRegistry,
        interner: &'a DefaultStringInterner,
    ) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            program,
            registry,
            interner,
            layouts: ClassLayouts::default(),
            scope: Scope::default(),
            globals: HashSet::new(),
            uses_statistics: false,
        }
    }

    pub fn generate(&mut self) -> GenResult<String> {
        self.output.clear();
        self.indent_level = 0;
        self.scope = Scope::default();
        self.globals.clear();
        self.uses_statistics = false;
        self.layouts = ClassLayouts::resolve(self.registry, self.interner)?;

        let program = self.program;
        for (i, statement) in program.statements.iter().enumerate() {
            self.generate_statement(statement)?;
            if is_definition(statement) && i + 1 < program.statements.len() {
                self.blank()?;
            }
        }

        let mut prelude = String::new();
        if self.uses_statistics {
            prelude.push_str("using Statistics\n\n");
        }
        // List methods shadowed by a class method still reach plain lists.
        let mut shadowed = list_methods()
            .filter(|(name, _)| {
                self.interner.get(*name).is_some_and(|method| self.registry.any_declares_method(method))
            })
            .peekable();
        if shadowed.peek().is_some() {
            for (name, function) in shadowed {
                let _ = writeln!(
                    prelude,
                    "__method__(::Val{{:{name}}}, self::AbstractVector, args...) = {function}(self, args...)"
                );
            }
            prelude.push('\n');
        }
        self.output.insert_str(0, &prelude);
        Ok(self.output.clone())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn generate_statement(&mut self, statement: &ast::Statement) -> GenResult<()> {
        match statement {
            ast::Statement::Simple(simple) => self.generate_simple_statement(simple),
            ast::Statement::Compound(compound) => match compound {
                ast::CompoundStatement::FunctionDef(def) => self.generate_function(def),
                ast::CompoundStatement::ClassDef(class) => self.generate_class(class),
                ast::CompoundStatement::If(statement) => self.generate_if(statement, "if"),
                ast::CompoundStatement::For(statement) => self.generate_for(statement),
                ast::CompoundStatement::While(statement) => self.generate_while(statement),
            },
        }
    }

    fn generate_simple_statement(&mut self, statement: &ast::SimpleStatement) -> GenResult<()> {
        match statement {
            ast::SimpleStatement::Assignment(assignment) => self.generate_assignment(assignment),
            ast::SimpleStatement::SuperCall(call) => {
                let text = self.super_call(call)?;
                self.line(&text)
            }
            ast::SimpleStatement::Return(ret) => {
                let text = match (&ret.value, self.scope.in_initializer, self.scope.receiver) {
                    (Some(value), _, _) => format!("return {}", self.expression_list(value)?),
                    (None, true, Some(receiver)) => format!("return {}", self.identifier(receiver)),
                    (None, _, _) => "return".to_string(),
                };
                self.line(&text)
            }
            ast::SimpleStatement::Pass => self.line("nothing"),
            ast::SimpleStatement::Break => self.line("break"),
            ast::SimpleStatement::Continue => self.line("continue"),
            ast::SimpleStatement::Expressions(list) => {
                let text = self.expression_list(list)?;
                self.line(&text)
            }
        }
    }

    fn generate_assignment(&mut self, assignment: &ast::Assignment) -> GenResult<()> {
        let single = assignment.targets.len() == 1;
        let mut targets = Vec::with_capacity(assignment.targets.len());
        for target in &assignment.targets {
            targets.push(self.declaration(target)?);
        }
        let targets = targets.join(", ");

        let text = match assignment.op {
            ast::AssignOp::Assign => {
                let mut lhs = targets;
                if let [target] = assignment.targets.as_slice() {
                    if let (true, Some(annotation)) = (target.accesses.is_empty(), &target.annotation) {
                        lhs = format!("{lhs}::{}", self.julia_type(annotation)?);
                    }
                }
                format!("{lhs} = {}", self.expression_list(&assignment.value)?)
            }
            ast::AssignOp::Augmented(op) => {
                let operator = augmented_operator(op, &assignment.value)
                    .ok_or_else(|| {
                        semantic(
                            SemanticErrorKind::UnsupportedAugmentedOperator(op.as_str().to_string()),
                            assignment.span.start,
                        )
                    })?;
                let value = match assignment.value.expressions.as_slice() {
                    [value] if value.as_primary().is_some() || value.as_integer().is_some() => {
                        self.expression(value)?
                    }
                    [value] => format!("({})", self.expression(value)?),
                    _ => format!("({})", self.expression_list(&assignment.value)?),
                };
                format!("{targets} = {targets} {operator} {value}")
            }
        };

        let declared = self.global_targets(assignment);
        if declared.is_empty() {
            self.line(&text)
        } else if single {
            self.line(&format!("global {text}"))
        } else {
            self.line(&format!("global {}", declared.join(", ")))?;
            self.line(&text)
        }
    }

    /// Plain-name targets that must be declared `global`: names assigned at
    /// the top level before, reassigned inside a top-level loop.
    fn global_targets(&mut self, assignment: &ast::Assignment) -> Vec<String> {
        if self.scope.in_function {
            return Vec::new();
        }
        let plain: Vec<DefaultSymbol> = assignment
            .targets
            .iter()
            .filter(|target| target.accesses.is_empty())
            .map(|target| target.name)
            .collect();
        if self.scope.loop_depth == 0 {
            self.globals.extend(plain);
            return Vec::new();
        }
        plain
            .into_iter()
            .filter(|name| self.globals.contains(name) && !self.scope.loop_variables.contains(name))
            .map(|name| self.identifier(name))
            .collect()
    }

    fn declaration(&mut self, target: &ast::Declaration) -> GenResult<String> {
        self.access_chain(&ast::Atom::Name(target.name), &target.accesses, target.span.start)
    }

    fn generate_function(&mut self, def: &ast::FunctionDef) -> GenResult<()> {
        let name = self.identifier(def.name);
        trace!(function = %name, "lowering function");
        let parameters = self.parameters(&def.parameters, None)?;
        let return_type = self.return_annotation(def)?;
        self.line(&format!("function {name}({}){return_type}", parameters.join(", ")))?;

        let scope = Scope { class: self.scope.class, in_function: true, ..Scope::default() };
        self.with_scope(scope, |generator| generator.block(&def.body))?;
        self.line("end")
    }

    fn generate_if(&mut self, statement: &ast::IfStatement, keyword: &str) -> GenResult<()> {
        let condition = self.expression(&statement.condition)?;
        self.line(&format!("{keyword} {condition}"))?;
        self.block(&statement.body)?;
        match &statement.orelse {
            Some(ast::ElseBranch::Elif(elif)) => self.generate_if(elif, "elseif"),
            Some(ast::ElseBranch::Else(block)) => {
                self.line("else")?;
                self.block(block)?;
                self.line("end")
            }
            None => self.line("end"),
        }
    }

    fn generate_for(&mut self, statement: &ast::ForStatement) -> GenResult<()> {
        let target = self.identifier(statement.target);
        let iterable = match statement.iterable.expressions.as_slice() {
            [single] => self.expression(single)?,
            _ => format!("({})", self.expression_list(&statement.iterable)?),
        };
        self.line(&format!("for {target} in {iterable}"))?;
        self.loop_body(Some(statement.target), &statement.body)?;
        self.line("end")
    }

    fn generate_while(&mut self, statement: &ast::WhileStatement) -> GenResult<()> {
        let condition = self.expression(&statement.condition)?;
        self.line(&format!("while {condition}"))?;
        self.loop_body(None, &statement.body)?;
        self.line("end")
    }

    fn loop_body(&mut self, variable: Option<DefaultSymbol>, body: &ast::Block) -> GenResult<()> {
        if self.scope.in_function {
            return self.block(body);
        }
        let mut scope = self.scope.clone();
        scope.loop_depth += 1;
        scope.loop_variables.extend(variable);
        self.with_scope(scope, |generator| generator.block(body))
    }

    fn block(&mut self, block: &ast::Block) -> GenResult<()> {
        self.indent_level += 1;
        for statement in &block.statements {
            self.generate_statement(statement)?;
        }
        self.indent_level -= 1;
        Ok(())
    }

    fn with_scope<T>(
        &mut self,
        scope: Scope,
        body: impl FnOnce(&mut Self) -> GenResult<T>,
    ) -> GenResult<T> {
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = body(self);
        self.scope = saved;
        result
    }

    fn parameters(
        &mut self,
        parameters: &[ast::Parameter],
        receiver_type: Option<&str>,
    ) -> GenResult<Vec<String>> {
        let mut rendered = Vec::with_capacity(parameters.len());
        for (i, parameter) in parameters.iter().enumerate() {
            let mut text = self.identifier(parameter.name);
            let julia_type = match (i, receiver_type) {
                (0, Some(receiver_type)) => Some(receiver_type.to_string()),
                _ => match &parameter.annotation {
                    Some(annotation) => Some(self.julia_type(annotation)?),
                    None => None,
                },
            };
            if let Some(julia_type) = julia_type {
                write!(text, "::{julia_type}")?;
            }
            if let Some(default) = &parameter.default {
                write!(text, " = {}", self.expression(default)?)?;
            }
            rendered.push(text);
        }
        Ok(rendered)
    }

    fn return_annotation(&self, def: &ast::FunctionDef) -> GenResult<String> {
        match &def.return_type {
            Some(annotation) => Ok(format!("::{}", self.julia_type(annotation)?)),
            None => Ok(String::new()),
        }
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    fn generate_class(&mut self, class: &ast::ClassDef) -> GenResult<()> {
        let layout = self.layouts.get(class.name).cloned().ok_or_else(|| {
            semantic(
                SemanticErrorKind::UnsupportedClassStatement(format!(
                    "class '{}' is missing from the class registry",
                    self.name(class.name)
                )),
                class.span.start,
            )
        })?;
        debug!(
            class = %layout.name,
            fields = layout.fields.len(),
            methods = class.methods().count(),
            "lowering class"
        );

        match &layout.super_abstract {
            Some(parent) => self.line(&format!("abstract type {} <: {parent} end", layout.abstract_name))?,
            None => self.line(&format!("abstract type {} end", layout.abstract_name))?,
        }
        self.blank()?;

        self.line(&format!("mutable struct {} <: {}", layout.name, layout.abstract_name))?;
        self.indent_level += 1;
        self.line("__dict__::Dict{Symbol, Any}")?;
        for field in &layout.fields {
            self.line(&format!("{}::{}", field.name, field.julia_type))?;
        }
        self.line(&format!("{}() = new(Dict{{Symbol, Any}}())", layout.name))?;
        self.indent_level -= 1;
        self.line("end")?;
        self.blank()?;

        let accessors = PROPERTY_ACCESSORS.replace("{abstract}", &layout.abstract_name);
        for line in accessors.lines() {
            if line.is_empty() {
                self.blank()?;
            } else {
                self.line(line)?;
            }
        }

        if layout.needs_initializer {
            self.blank()?;
            self.generate_default_initializer(&layout)?;
        }
        for method in class.methods() {
            self.blank()?;
            self.generate_method(class, &layout, method)?;
        }
        Ok(())
    }

    fn generate_default_initializer(&mut self, layout: &ClassLayout) -> GenResult<()> {
        let ClassLayout { name, abstract_name, .. } = layout;
        self.line(&format!(
            "function __static__(::Val{{:{name}}}, ::Val{{:{INITIALIZER}}}, self::{abstract_name})"
        ))?;
        self.indent_level += 1;
        self.line("return self")?;
        self.indent_level -= 1;
        self.line("end")?;
        self.blank()?;
        self.line(&format!(
            "__method__(::Val{{:{INITIALIZER}}}, self::{abstract_name}) = __static__(Val(:{name}), Val(:{INITIALIZER}), self)"
        ))
    }

    /// Emits the class-tagged static form of a method and, when it has a
    /// receiver, the dynamically dispatched form forwarding to it.
    fn generate_method(
        &mut self,
        class: &ast::ClassDef,
        layout: &ClassLayout,
        method: &ast::FunctionDef,
    ) -> GenResult<()> {
        let raw_method = self.name(method.name);
        let method_name = member_name(raw_method, Some(self.name(class.name)));
        let is_initializer = raw_method == INITIALIZER;
        let receiver = method.receiver();
        trace!(class = %layout.name, method = %method_name, "lowering method");

        let parameters = self.parameters(&method.parameters, Some(layout.abstract_name.as_str()))?;
        // The initializer always yields the receiver.
        let return_type = if is_initializer { String::new() } else { self.return_annotation(method)? };
        let mut head = vec![
            format!("::Val{{:{}}}", layout.name),
            format!("::Val{{:{method_name}}}"),
        ];
        head.extend(parameters.iter().cloned());
        self.line(&format!("function __static__({}){return_type}", head.join(", ")))?;

        let scope = Scope {
            class: Some(class.name),
            receiver,
            in_initializer: is_initializer,
            in_function: true,
            ..Scope::default()
        };
        self.with_scope(scope, |generator| {
            generator.block(&method.body)?;
            if let (true, Some(receiver)) = (is_initializer, receiver) {
                if !ends_with_return(&method.body) {
                    generator.indent_level += 1;
                    let text = format!("return {}", generator.identifier(receiver));
                    generator.line(&text)?;
                    generator.indent_level -= 1;
                }
            }
            Ok(())
        })?;
        self.line("end")?;

        if receiver.is_some() {
            let forwarded: Vec<String> =
                method.parameters.iter().map(|p| self.identifier(p.name)).collect();
            let mut dispatch = vec![format!("::Val{{:{method_name}}}")];
            dispatch.extend(parameters);
            self.blank()?;
            self.line(&format!(
                "__method__({}) = __static__(Val(:{}), Val(:{method_name}), {})",
                dispatch.join(", "),
                layout.name,
                forwarded.join(", ")
            ))?;
        }
        Ok(())
    }

    /// The nearest class from `class` upwards that defines `method`.
    /// `__init__` falls back to `class` itself, whose initializer is then
    /// the synthesized one.
    fn method_owner(
        &self,
        class: DefaultSymbol,
        method: DefaultSymbol,
        location: SourceLocation,
    ) -> GenResult<DefaultSymbol> {
        match self.registry.method_owner(class, method) {
            Some(owner) => Ok(owner.name),
            None if self.name(method) == INITIALIZER => Ok(class),
            None => Err(semantic(
                SemanticErrorKind::UnknownMethod {
                    class: self.name(class).to_string(),
                    method: self.name(method).to_string(),
                },
                location,
            )),
        }
    }

    /// `__static__(Val(:Owner), Val(:method), [receiver,] args...)`
    fn static_call(
        &mut self,
        class: DefaultSymbol,
        method: DefaultSymbol,
        arguments: &ast::Arguments,
        receiver: Option<String>,
        location: SourceLocation,
    ) -> GenResult<String> {
        let owner = self.method_owner(class, method, location)?;
        let method_name = member_name(self.name(method), Some(self.name(owner)));
        let mut values: Vec<String> = receiver.into_iter().collect();
        for argument in &arguments.values {
            values.push(self.expression(argument)?);
        }
        Ok(format!(
            "__static__(Val(:{}), Val(:{method_name}){})",
            self.identifier(owner),
            leading_comma(&values.join(", "))
        ))
    }

    fn super_call(&mut self, call: &ast::SuperCall) -> GenResult<String> {
        let location = call.span.start;
        let outside = || semantic(SemanticErrorKind::SuperOutsideMethod, location);
        let class = self.scope.class.ok_or_else(outside)?;
        let receiver = self.scope.receiver.ok_or_else(outside)?;

        let start = match call.superclass {
            Some(explicit) if self.registry.contains(explicit) => explicit,
            Some(explicit) => {
                return Err(semantic(
                    SemanticErrorKind::UnknownSuperclass {
                        class: self.name(class).to_string(),
                        superclass: self.name(explicit).to_string(),
                    },
                    location,
                ));
            }
            None => self
                .registry
                .get(class)
                .and_then(|def| def.superclass)
                .ok_or_else(|| {
                    semantic(
                        SemanticErrorKind::SuperWithoutSuperclass(self.name(class).to_string()),
                        location,
                    )
                })?,
        };
        let receiver = self.identifier(receiver);
        self.static_call(start, call.method, &call.arguments, Some(receiver), location)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression_list(&mut self, list: &ast::ExpressionList) -> GenResult<String> {
        let mut parts = Vec::with_capacity(list.expressions.len());
        for expression in &list.expressions {
            parts.push(self.expression(expression)?);
        }
        Ok(parts.join(", "))
    }

    fn expression(&mut self, expression: &ast::Expression) -> GenResult<String> {
        let mut parts = Vec::with_capacity(expression.disjunction.operands.len());
        for conjunction in &expression.disjunction.operands {
            parts.push(self.conjunction(conjunction)?);
        }
        Ok(parts.join(" || "))
    }

    fn conjunction(&mut self, conjunction: &ast::Conjunction) -> GenResult<String> {
        let mut parts = Vec::with_capacity(conjunction.operands.len());
        for inversion in &conjunction.operands {
            parts.push(self.inversion(inversion)?);
        }
        Ok(parts.join(" && "))
    }

    fn inversion(&mut self, inversion: &ast::Inversion) -> GenResult<String> {
        match inversion {
            ast::Inversion::Not(inner) => {
                let text = self.inversion(inner)?;
                if is_bare(inner) {
                    Ok(format!("!{text}"))
                } else {
                    Ok(format!("!({text})"))
                }
            }
            ast::Inversion::Comparison(chain) => {
                let mut text = self.sum(&chain.first)?;
                for (op, operand) in &chain.rest {
                    text.push_str(comparison_operator(*op));
                    text.push_str(&self.sum(operand)?);
                }
                Ok(text)
            }
        }
    }

    /// `+` becomes string concatenation when any operand is a string literal.
    fn sum(&mut self, sum: &ast::Sum) -> GenResult<String> {
        let concatenates =
            is_string_term(&sum.first) || sum.rest.iter().any(|(_, term)| is_string_term(term));
        let operand = |generator: &mut Self, term: &ast::Term| -> GenResult<String> {
            let text = generator.term(term)?;
            if concatenates && !term.rest.is_empty() {
                Ok(format!("({text})"))
            } else {
                Ok(text)
            }
        };

        let mut text = operand(self, &sum.first)?;
        for (op, term) in &sum.rest {
            text.push_str(match op {
                SumOp::Add if concatenates => " * ",
                SumOp::Add => " .+ ",
                SumOp::Sub => " .- ",
            });
            text.push_str(&operand(self, term)?);
        }
        Ok(text)
    }

    fn term(&mut self, term: &ast::Term) -> GenResult<String> {
        let mut text = self.factor(&term.first)?;
        for (op, factor) in &term.rest {
            text.push_str(match op {
                TermOp::Mul => " .* ",
                TermOp::Div => " ./ ",
                TermOp::FloorDiv => " .÷ ",
                TermOp::Mod => " .% ",
            });
            text.push_str(&self.factor(factor)?);
        }
        Ok(text)
    }

    fn factor(&mut self, factor: &ast::Factor) -> GenResult<String> {
        match factor {
            ast::Factor::Unary(op, inner) => {
                let sign = match op {
                    SumOp::Add => "+",
                    SumOp::Sub => "-",
                };
                let text = self.factor(inner)?;
                if text.starts_with(['-', '+']) {
                    Ok(format!("{sign}({text})"))
                } else {
                    Ok(format!("{sign}{text}"))
                }
            }
            ast::Factor::Power(power) => {
                let base = self.primary(&power.base)?;
                match &power.exponent {
                    Some(exponent) => Ok(format!("{base} .^ {}", self.factor(exponent)?)),
                    None => Ok(base),
                }
            }
        }
    }

    fn primary(&mut self, primary: &ast::Primary) -> GenResult<String> {
        self.access_chain(&primary.atom, &primary.trailers, primary.span.start)
    }

    fn access_chain(
        &mut self,
        atom: &ast::Atom,
        trailers: &[ast::Trailer],
        location: SourceLocation,
    ) -> GenResult<String> {
        if let ast::Atom::Name(name) = atom {
            if self.registry.contains(*name) {
                return self.class_access(*name, trailers, location);
            }
        }
        let base = self.atom(atom)?;
        self.trailers(base, trailers)
    }

    /// A chain rooted at a class name: construction or a static call.
    fn class_access(
        &mut self,
        class: DefaultSymbol,
        trailers: &[ast::Trailer],
        location: SourceLocation,
    ) -> GenResult<String> {
        let class_name = self.identifier(class);
        match trailers {
            [ast::Trailer::Call(arguments), rest @ ..] => {
                let arguments = self.arguments(arguments)?;
                let base = format!(
                    "__method__(Val(:{INITIALIZER}), {class_name}(){})",
                    leading_comma(&arguments)
                );
                self.trailers(base, rest)
            }
            [ast::Trailer::Attribute(method, _), ast::Trailer::Call(arguments), rest @ ..] => {
                let base = self.static_call(class, *method, arguments, None, location)?;
                self.trailers(base, rest)
            }
            [ast::Trailer::Attribute(attribute, span), ..] => Err(semantic(
                SemanticErrorKind::UnsupportedClassAttribute {
                    class: self.name(class).to_string(),
                    attribute: self.name(*attribute).to_string(),
                },
                span.start,
            )),
            _ => self.trailers(class_name, trailers),
        }
    }

    fn trailers(&mut self, base: String, trailers: &[ast::Trailer]) -> GenResult<String> {
        let mut text = base;
        let mut i = 0;
        while i < trailers.len() {
            match &trailers[i] {
                ast::Trailer::Attribute(name, _) => {
                    if let Some(ast::Trailer::Call(arguments)) = trailers.get(i + 1) {
                        text = self.method_call(text, *name, arguments)?;
                        i += 2;
                        continue;
                    }
                    let member = member_name(self.name(*name), self.current_class_name());
                    text = format!("{text}.{member}");
                }
                ast::Trailer::Call(arguments) => {
                    text = format!("{text}({})", self.arguments(arguments)?);
                }
                ast::Trailer::Subscript(slices) => {
                    let mut parts = Vec::with_capacity(slices.len());
                    for slice in slices {
                        parts.push(self.slice(slice)?);
                    }
                    text = format!("{text}[{}]", parts.join(", "));
                }
            }
            i += 1;
        }
        Ok(text)
    }

    /// `obj.m(args)`: dynamic dispatch when some class defines `m`, a list
    /// builtin for list methods, otherwise `m(obj, args)`.
    fn method_call(
        &mut self,
        receiver: String,
        method: DefaultSymbol,
        arguments: &ast::Arguments,
    ) -> GenResult<String> {
        let arguments = self.arguments(arguments)?;
        let raw_method = self.name(method);
        if self.registry.any_declares_method(method) {
            let method_name = member_name(raw_method, self.current_class_name());
            return Ok(format!(
                "__method__(Val(:{method_name}), {receiver}{})",
                leading_comma(&arguments)
            ));
        }
        let function = match list_method(raw_method) {
            Some(function) => function.to_string(),
            None => escape_identifier(raw_method),
        };
        Ok(format!("{function}({receiver}{})", leading_comma(&arguments)))
    }

    fn arguments(&mut self, arguments: &ast::Arguments) -> GenResult<String> {
        let mut parts = Vec::with_capacity(arguments.values.len());
        for value in &arguments.values {
            parts.push(self.expression(value)?);
        }
        Ok(parts.join(", "))
    }

    /// 0-based half-open subscripts to 1-based closed ones.
    fn slice(&mut self, slice: &ast::Slice) -> GenResult<String> {
        match slice {
            ast::Slice::Index(index) => self.bound(index, Bound::Index),
            ast::Slice::Range { lower: None, upper: None, step: None } => Ok(":".to_string()),
            ast::Slice::Range { lower, upper, step } => {
                let descending = step
                    .as_ref()
                    .and_then(ast::Expression::as_integer)
                    .is_some_and(|step| step < 0);
                let lower = match lower {
                    Some(lower) => self.bound(lower, Bound::Index)?,
                    None if descending => "end".to_string(),
                    None => "1".to_string(),
                };
                let upper = match upper {
                    Some(upper) if descending => self.bound(upper, Bound::DescendingUpper)?,
                    Some(upper) => self.bound(upper, Bound::Upper)?,
                    None if descending => "1".to_string(),
                    None => "end".to_string(),
                };
                match step {
                    Some(step) => Ok(format!("{lower}:{}:{upper}", self.expression(step)?)),
                    None => Ok(format!("{lower}:{upper}")),
                }
            }
        }
    }

    fn bound(&mut self, expression: &ast::Expression, bound: Bound) -> GenResult<String> {
        if let Some(folded) = expression.as_integer().and_then(|n| fold_bound(n, bound)) {
            return Ok(folded);
        }
        let text = self.operand(expression)?;
        Ok(match bound {
            Bound::Index => format!("{text} + 1"),
            Bound::Upper => format!("{text} - 1"),
            Bound::DescendingUpper => format!("{text} + 2"),
        })
    }

    /// Expression text safe to extend with `+`/`-`.
    fn operand(&mut self, expression: &ast::Expression) -> GenResult<String> {
        let text = self.expression(expression)?;
        if expression.as_sum().is_some() {
            Ok(text)
        } else {
            Ok(format!("({text})"))
        }
    }

    /// `range(stop)`, `range(start, stop)`, `range(start, stop, step)` as a
    /// closed Julia range `start[:step]:last`.
    fn range(&mut self, call: &ast::FunctionCall) -> GenResult<String> {
        match call.arguments.values.as_slice() {
            [stop] => Ok(format!("0:{}", self.range_last(stop, 1)?)),
            [start, stop] => Ok(format!("{}:{}", self.operand(start)?, self.range_last(stop, 1)?)),
            [start, stop, step] => {
                let descending = step.as_integer().is_some_and(|step| step < 0);
                let offset = if descending { -1 } else { 1 };
                Ok(format!(
                    "{}:{}:{}",
                    self.operand(start)?,
                    self.expression(step)?,
                    self.range_last(stop, offset)?
                ))
            }
            values => Err(arity_error(&call.name, values.len(), "1 to 3", call.span.start)),
        }
    }

    /// The last value a range reaches: `stop - offset`.
    fn range_last(&mut self, stop: &ast::Expression, offset: i64) -> GenResult<String> {
        if let Some(last) = stop.as_integer().and_then(|n| n.checked_sub(offset)) {
            return Ok(last.to_string());
        }
        let text = self.operand(stop)?;
        if offset >= 0 {
            Ok(format!("({text} - {offset})"))
        } else {
            Ok(format!("({text} + {})", offset.unsigned_abs()))
        }
    }

    fn function_call(&mut self, call: &ast::FunctionCall) -> GenResult<String> {
        let location = call.span.start;
        let values = &call.arguments.values;
        let single = || match values.as_slice() {
            [value] => Ok(value),
            _ => Err(arity_error(&call.name, values.len(), "1", location)),
        };

        match call_lowering(&call.name) {
            CallLowering::Println => {
                let mut parts = Vec::with_capacity(values.len());
                for value in values {
                    parts.push(self.expression(value)?);
                }
                Ok(format!("println({})", parts.join(", \" \", ")))
            }
            CallLowering::FirstDimension => Ok(format!("size({}, 1)", self.expression(single()?)?)),
            CallLowering::Range => self.range(call),
            CallLowering::Truncate => Ok(format!("trunc(Int64, {})", self.expression(single()?)?)),
            CallLowering::Rename(name) => Ok(format!("{name}({})", self.arguments(&call.arguments)?)),
            CallLowering::Elementwise(name) => {
                Ok(format!("{name}.({})", self.arguments(&call.arguments)?))
            }
            CallLowering::Statistics(name) => {
                self.uses_statistics = true;
                Ok(format!("{name}({})", self.arguments(&call.arguments)?))
            }
            CallLowering::OperatorChain(op) => {
                if values.len() < 2 {
                    return Err(arity_error(&call.name, values.len(), "at least 2", location));
                }
                let mut parts = Vec::with_capacity(values.len());
                for value in values {
                    parts.push(self.expression(value)?);
                }
                Ok(format!("({})", parts.join(&format!(" {op} "))))
            }
            CallLowering::Identity => {
                let value = single()?;
                let text = self.expression(value)?;
                if value.as_primary().is_some() {
                    Ok(text)
                } else {
                    Ok(format!("({text})"))
                }
            }
            CallLowering::PassThrough => Ok(format!(
                "{}({})",
                escape_identifier(&call.name),
                self.arguments(&call.arguments)?
            )),
        }
    }

    fn atom(&mut self, atom: &ast::Atom) -> GenResult<String> {
        Ok(match atom {
            ast::Atom::Name(name) => self.identifier(*name),
            ast::Atom::True => "true".to_string(),
            ast::Atom::False => "false".to_string(),
            ast::Atom::None => "nothing".to_string(),
            ast::Atom::Integer(n) => n.to_string(),
            ast::Atom::Float(f) => float_literal(*f),
            ast::Atom::Str(text) => format!("\"{}\"", escape_string(text)),
            ast::Atom::FString(parts) => {
                let mut text = String::from("\"");
                for part in parts {
                    match part {
                        ast::FStringPart::Literal(literal) => text.push_str(&escape_string(literal)),
                        ast::FStringPart::Expression(expression) => {
                            write!(text, "$({})", self.expression(expression)?)?;
                        }
                    }
                }
                text.push('"');
                text
            }
            ast::Atom::Group(inner) => format!("({})", self.expression(inner)?),
            ast::Atom::List(elements) => {
                let mut parts = Vec::with_capacity(elements.len());
                for element in elements {
                    parts.push(self.expression(element)?);
                }
                format!("[{}]", parts.join(", "))
            }
            ast::Atom::Namespaced(call) | ast::Atom::Builtin(call) => self.function_call(call)?,
            ast::Atom::Super(call) => self.super_call(call)?,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn name(&self, symbol: DefaultSymbol) -> &'a str {
        self.interner.resolve(symbol).unwrap_or("<unknown>")
    }

    fn identifier(&self, symbol: DefaultSymbol) -> String {
        escape_identifier(self.name(symbol))
    }

    fn current_class_name(&self) -> Option<&'a str> {
        self.scope.class.map(|class| self.name(class))
    }

    fn julia_type(&self, annotation: &ast::TypeAnnotation) -> GenResult<String> {
        Ok(types::julia_type(annotation, self.registry, self.interner)?)
    }

    fn line(&mut self, text: &str) -> GenResult<()> {
        for _ in 0..self.indent_level {
            self.output.push_str("    ");
        }
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn blank(&mut self) -> GenResult<()> {
        writeln!(self.output)?;
        Ok(())
    }
}

fn semantic(kind: SemanticErrorKind, location: SourceLocation) -> JuliaGenError {
    SemanticError::at(kind, location).into()
}

fn arity_error(function: &str, found: usize, expected: &str, location: SourceLocation) -> JuliaGenError {
    semantic(
        SemanticErrorKind::UnsupportedArity {
            function: function.to_string(),
            found,
            expected: expected.to_string(),
        },
        location,
    )
}

fn is_definition(statement: &ast::Statement) -> bool {
    matches!(
        statement,
        ast::Statement::Compound(
            ast::CompoundStatement::FunctionDef(_) | ast::CompoundStatement::ClassDef(_)
        )
    )
}

fn ends_with_return(block: &ast::Block) -> bool {
    matches!(
        block.statements.last(),
        Some(ast::Statement::Simple(ast::SimpleStatement::Return(_)))
    )
}

/// A comparison-free, operator-free operand that `!` can prefix directly.
fn is_bare(inversion: &ast::Inversion) -> bool {
    match inversion {
        ast::Inversion::Not(_) => true,
        ast::Inversion::Comparison(chain) => {
            chain.rest.is_empty()
                && chain.first.as_term().and_then(ast::Term::as_primary).is_some()
        }
    }
}

fn is_string_term(term: &ast::Term) -> bool {
    term.as_primary().is_some_and(ast::Primary::is_string_literal)
}

fn comparison_operator(op: Comparison) -> &'static str {
    match op {
        Comparison::Equal => " .== ",
        Comparison::NotEqual => " .!= ",
        Comparison::Less => " .< ",
        Comparison::Greater => " .> ",
        Comparison::LessEqual => " .<= ",
        Comparison::GreaterEqual => " .>= ",
    }
}

fn augmented_operator(op: AugmentedOp, value: &ast::ExpressionList) -> Option<&'static str> {
    let concatenates = matches!(
        value.expressions.as_slice(),
        [single] if single.as_primary().is_some_and(ast::Primary::is_string_literal)
    );
    Some(match op {
        AugmentedOp::Add if concatenates => "*",
        AugmentedOp::Add => ".+",
        AugmentedOp::Sub => ".-",
        AugmentedOp::Mul => ".*",
        AugmentedOp::Div => "./",
        AugmentedOp::FloorDiv => ".÷",
        AugmentedOp::Mod => ".%",
        AugmentedOp::Pow => ".^",
        AugmentedOp::MatMul
        | AugmentedOp::BitAnd
        | AugmentedOp::BitOr
        | AugmentedOp::BitXor
        | AugmentedOp::Shl
        | AugmentedOp::Shr => return None,
    })
}

/// Folds an integer-literal subscript bound.
fn fold_bound(n: i64, bound: Bound) -> Option<String> {
    let from_end = |k: u64| if k == 0 { "end".to_string() } else { format!("end - {k}") };
    match bound {
        Bound::Index if n >= 0 => n.checked_add(1).map(|i| i.to_string()),
        // -1 is the last element
        Bound::Index => Some(from_end((n + 1).unsigned_abs())),
        Bound::Upper if n >= 0 => Some((n - 1).to_string()),
        Bound::Upper => Some(from_end(n.unsigned_abs())),
        Bound::DescendingUpper if n >= 0 => n.checked_add(2).map(|i| i.to_string()),
        // -1 stops past the last element
        Bound::DescendingUpper if n == -1 => Some("end + 1".to_string()),
        Bound::DescendingUpper => Some(from_end(n.unsigned_abs() - 2)),
    }
}

fn float_literal(value: f64) -> String {
    if value.is_infinite() {
        "Inf".to_string()
    } else {
        format!("{value:?}")
    }
}

fn leading_comma(arguments: &str) -> String {
    if arguments.is_empty() {
        String::new()
    } else {
        format!(", {arguments}")
    }
}

/// Julia string literal body.
fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '$' => escaped.push_str("\\$"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\0' => escaped.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(escaped, "\\u{:04x}", c as u32);
            }
            c => escaped.push(c),
        }
    }
    escaped
}
