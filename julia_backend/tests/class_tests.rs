use frontend::error::SemanticErrorKind;
use julia_backend::{JuliaGenError, TranslateError, translate};
use rstest::rstest;

fn julia(source: &str) -> String {
    translate(source).expect("translation should succeed")
}

fn semantic_kind(source: &str) -> SemanticErrorKind {
    match translate(source) {
        Err(TranslateError::Generate(JuliaGenError::Semantic(error))) => error.kind,
        Err(TranslateError::Frontend(frontend::FrontendError::Semantic(error))) => error.kind,
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

fn assert_contains(haystack: &str, needle: &str) {
    assert!(haystack.contains(needle), "missing:\n{needle}\n---- in ----\n{haystack}");
}

const POINT: &str = "\
class Point:
    def __init__(self, x: int, y: int):
        self.x = x
        self.y = y

    def norm(self) -> int:
        return self.x * self.x + self.y * self.y

p = Point(3, 4)
print(p.norm())
";

#[test]
fn test_class_lowering_layout() {
    let expected = "\
abstract type AbstractPoint end

mutable struct Point <: AbstractPoint
    __dict__::Dict{Symbol, Any}
    x::Any
    y::Any
    Point() = new(Dict{Symbol, Any}())
end

function Base.getproperty(self::AbstractPoint, name::Symbol)
    if hasfield(typeof(self), name)
        return getfield(self, name)
    end
    attributes = getfield(self, :__dict__)
    if haskey(attributes, name)
        return attributes[name]
    end
    error(\"$(typeof(self)) has no attribute $(name)\")
end

function Base.setproperty!(self::AbstractPoint, name::Symbol, value)
    if hasfield(typeof(self), name)
        return setfield!(self, name, convert(fieldtype(typeof(self), name), value))
    end
    getfield(self, :__dict__)[name] = value
    return value
end

function __static__(::Val{:Point}, ::Val{:__init__}, self::AbstractPoint, x::Int64, y::Int64)
    self.x = x
    self.y = y
    return self
end

__method__(::Val{:__init__}, self::AbstractPoint, x::Int64, y::Int64) = __static__(Val(:Point), Val(:__init__), self, x, y)

function __static__(::Val{:Point}, ::Val{:norm}, self::AbstractPoint)::Int64
    return self.x .* self.x .+ self.y .* self.y
end

__method__(::Val{:norm}, self::AbstractPoint) = __static__(Val(:Point), Val(:norm), self)

p = __method__(Val(:__init__), Point(), 3, 4)
println(__method__(Val(:norm), p))
";
    assert_eq!(julia(POINT), expected);
}

const ANIMALS: &str = "\
class Animal:
    def __init__(self, name, age: int):
        self.name: str = name
        self.age: int = age

    def voice(self):
        pass

class Cat(Animal):
    def __init__(self, name, age, color):
        super().__init__(name, age)
        self.age = age
        self.color = color

    def voice(self):
        print('meow')

murka = Cat('Murka', 3, 'black')
print(murka.color)
print(murka.name)
";

#[test]
fn test_inheritance_builds_abstract_hierarchy() {
    let out = julia(ANIMALS);
    assert_contains(&out, "abstract type AbstractAnimal end\n");
    assert_contains(&out, "abstract type AbstractCat <: AbstractAnimal end\n");
    assert_contains(&out, "mutable struct Cat <: AbstractCat\n");
    assert_contains(
        &out,
        "mutable struct Cat <: AbstractCat\n    __dict__::Dict{Symbol, Any}\n    name::String\n    age::Int64\n    color::Any\n    Cat() = new(Dict{Symbol, Any}())\nend\n",
    );
    assert_contains(&out, "function Base.getproperty(self::AbstractCat, name::Symbol)\n");
}

#[test]
fn test_super_initializer_and_overrides() {
    let out = julia(ANIMALS);
    assert_contains(
        &out,
        "function __static__(::Val{:Cat}, ::Val{:__init__}, self::AbstractCat, name, age, color)\n    __static__(Val(:Animal), Val(:__init__), self, name, age)\n    self.age = age\n    self.color = color\n    return self\nend\n",
    );
    assert_contains(
        &out,
        "function __static__(::Val{:Animal}, ::Val{:voice}, self::AbstractAnimal)\n    nothing\nend\n",
    );
    assert_contains(
        &out,
        "__method__(::Val{:voice}, self::AbstractCat) = __static__(Val(:Cat), Val(:voice), self)\n",
    );
    assert_contains(&out, "murka = __method__(Val(:__init__), Cat(), \"Murka\", 3, \"black\")\n");
    assert_contains(&out, "println(murka.color)\nprintln(murka.name)\n");
    // Both classes define `__init__`, so nothing is synthesized.
    assert_eq!(out.matches("::Val{:__init__}, self::AbstractAnimal)").count(), 0);
}

#[test]
fn test_private_attributes_are_mangled_per_class() {
    let source = "\
class Foo:
    def __init__(self):
        self.__x = 1

    def get(self):
        return self.__x

class Bar(Foo):
    def __init__(self):
        super().__init__()
        self.__x = 2

    def mine(self):
        return self.__x
";
    let out = julia(source);
    assert_contains(&out, "    __dict__::Dict{Symbol, Any}\n    _Foo__x::Any\n    Foo() =");
    assert_contains(
        &out,
        "    __dict__::Dict{Symbol, Any}\n    _Foo__x::Any\n    _Bar__x::Any\n    Bar() =",
    );
    assert_contains(&out, "    self._Foo__x = 1\n");
    assert_contains(&out, "    self._Bar__x = 2\n");
    assert_contains(&out, "::Val{:get}, self::AbstractFoo)\n    return self._Foo__x\nend\n");
    assert_contains(&out, "::Val{:mine}, self::AbstractBar)\n    return self._Bar__x\nend\n");
    assert_contains(&out, "    __static__(Val(:Foo), Val(:__init__), self)\n");
}

#[test]
fn test_private_methods_and_list_attributes() {
    let source = "\
class Animal:
    def __init__(self, name, age: int):
        self.name: str = name
        self.age = age
        self.__food_history = []

    def __add_food(self, food):
        self.__food_history.append(food)

    def eat(self, food: str):
        self.__add_food(food)

    def get_food_history(self):
        return self.__food_history

animal = Animal('Bobik', 3)
animal.eat('apple')
print(animal.get_food_history())
";
    let out = julia(source);
    assert_contains(&out, "    _Animal__food_history::Any\n");
    assert_contains(&out, "    self._Animal__food_history = []\n");
    assert_contains(
        &out,
        "function __static__(::Val{:Animal}, ::Val{:_Animal__add_food}, self::AbstractAnimal, food)\n    push!(self._Animal__food_history, food)\nend\n",
    );
    assert_contains(
        &out,
        "function __static__(::Val{:Animal}, ::Val{:eat}, self::AbstractAnimal, food::String)\n    __method__(Val(:_Animal__add_food), self, food)\nend\n",
    );
    assert_contains(&out, "animal = __method__(Val(:__init__), Animal(), \"Bobik\", 3)\n");
    assert_contains(&out, "__method__(Val(:eat), animal, \"apple\")\n");
    assert_contains(&out, "println(__method__(Val(:get_food_history), animal))\n");
}

#[test]
fn test_explicit_super_targets_the_named_class() {
    let source = "\
class A:
    def hello(self):
        return 1

class B(A):
    def hello(self):
        return 2

class C(B):
    def hello(self):
        return super(A).hello() + super().hello()
";
    let out = julia(source);
    assert_contains(
        &out,
        "    return __static__(Val(:A), Val(:hello), self) .+ __static__(Val(:B), Val(:hello), self)\n",
    );
}

#[test]
fn test_super_resolves_inherited_method_owner() {
    let source = "\
class A:
    def hello(self):
        return 1

class B(A):
    pass

class C(B):
    def hello(self):
        return super().hello() * 2
";
    let out = julia(source);
    assert_contains(&out, "    return __static__(Val(:A), Val(:hello), self) .* 2\n");
}

#[test]
fn test_arity_overloads() {
    let source = "\
class Animal:
    def __init__(self, name):
        self.name: str = name
        self.age = None

    def __init__(self, name, age: int):
        self.name: str = name
        self.age = age

class Kitty(Animal):
    def __init__(self, name, age):
        super(Animal).__init__(name, age)
        self.color = None

animal = Animal('Bobik', 3)
kitty = Kitty('Murzik', 1)
";
    let out = julia(source);
    assert_contains(
        &out,
        "function __static__(::Val{:Animal}, ::Val{:__init__}, self::AbstractAnimal, name)\n",
    );
    assert_contains(
        &out,
        "function __static__(::Val{:Animal}, ::Val{:__init__}, self::AbstractAnimal, name, age::Int64)\n",
    );
    assert_contains(&out, "    __static__(Val(:Animal), Val(:__init__), self, name, age)\n");
    assert_contains(&out, "    self.age = nothing\n");
}

#[test]
fn test_static_calls_and_construction() {
    let source = "\
class B:
    def __init__(self, x, y):
        self.x = x
        self.y = y

class C(B):
    def __init__(self, a, b, c):
        B.__init__(self, a, b)
        self.y = c

c = C(1, 2, 3)
print(c.x)
";
    let out = julia(source);
    assert_contains(&out, "    __static__(Val(:B), Val(:__init__), self, a, b)\n");
    assert_contains(&out, "c = __method__(Val(:__init__), C(), 1, 2, 3)\n");
    assert_contains(&out, "println(c.x)\n");
}

#[test]
fn test_methods_without_receiver_have_no_dynamic_form() {
    let source = "\
class Factory:
    def make():
        return 42

x = Factory.make()
";
    let out = julia(source);
    assert_contains(&out, "function __static__(::Val{:Factory}, ::Val{:make})\n    return 42\nend\n");
    assert!(!out.contains("__method__(::Val{:make}"));
    assert_contains(&out, "x = __static__(Val(:Factory), Val(:make))\n");
}

#[test]
fn test_initializer_is_synthesized_when_none_is_inherited() {
    let source = "class Empty:\n    pass\n\ne = Empty()\n";
    let out = julia(source);
    assert_contains(
        &out,
        "function __static__(::Val{:Empty}, ::Val{:__init__}, self::AbstractEmpty)\n    return self\nend\n\n__method__(::Val{:__init__}, self::AbstractEmpty) = __static__(Val(:Empty), Val(:__init__), self)\n",
    );
    assert_contains(&out, "e = __method__(Val(:__init__), Empty())\n");
    assert!(out.ends_with("\n\ne = __method__(Val(:__init__), Empty())\n"));
}

#[test]
fn test_initializer_returns_receiver() {
    let source = "\
class Counter:
    def __init__(self, start):
        self.count = start
        if start < 0:
            return
";
    let out = julia(source);
    assert_contains(&out, "        return self\n    end\n    return self\nend\n");
}

#[test]
fn test_initializer_ignores_its_return_annotation() {
    let source = "\
class P:
    def __init__(self, x: int) -> None:
        self.x = x

    def get(self) -> int:
        return self.x
";
    let out = julia(source);
    assert_contains(
        &out,
        "function __static__(::Val{:P}, ::Val{:__init__}, self::AbstractP, x::Int64)\n    self.x = x\n    return self\nend\n",
    );
    assert!(!out.contains("::Nothing"));
    assert_contains(&out, "function __static__(::Val{:P}, ::Val{:get}, self::AbstractP)::Int64\n");
}

#[test]
fn test_list_methods_shadowed_by_a_class_still_reach_lists() {
    let source = "\
class Stack:
    def __init__(self):
        self.items = []

    def push(self, item):
        self.items.append(item)

    def pop(self):
        return self.items.pop()

s = Stack()
s.push(1)
xs = [1, 2]
xs.pop()
";
    let out = julia(source);
    assert!(out.starts_with(
        "__method__(::Val{:pop}, self::AbstractVector, args...) = pop!(self, args...)\n\nabstract type AbstractStack end\n"
    ));
    assert!(!out.contains("::Val{:append}, self::AbstractVector"));
    assert_contains(&out, "    push!(self.items, item)\n");
    assert_contains(&out, "    return __method__(Val(:pop), self.items)\n");
    assert_contains(
        &out,
        "__method__(::Val{:pop}, self::AbstractStack) = __static__(Val(:Stack), Val(:pop), self)\n",
    );
    assert!(out.ends_with("xs = [1, 2]\n__method__(Val(:pop), xs)\n"));
}

#[test]
fn test_plain_list_methods_need_no_fallback() {
    let out = julia("xs = [1]\nxs.append(2)\nys = xs.copy()\n");
    assert_eq!(out, "xs = [1]\npush!(xs, 2)\nys = copy(xs)\n");
}

#[test]
fn test_undeclared_attributes_use_the_dynamic_dictionary() {
    let source = "\
class Person:
    def __init__(self, name: str):
        self.name: str = name

p = Person('Ann')
p.nickname = 'A'
print(p.nickname)
";
    let out = julia(source);
    assert_contains(&out, "    name::String\n");
    assert!(!out.contains("nickname::"));
    assert_contains(&out, "p.nickname = \"A\"\nprintln(p.nickname)\n");
}

#[test]
fn test_class_annotations_use_abstract_markers() {
    let source = "\
class Node:
    def __init__(self, value: int, next: Node):
        self.value: int = value
        self.next: Node = next

def head(node: Node) -> int:
    return node.value
";
    let out = julia(source);
    assert_contains(&out, "    value::Int64\n    next::AbstractNode\n");
    assert_contains(&out, "self::AbstractNode, value::Int64, next::AbstractNode)\n");
    assert_contains(&out, "function head(node::AbstractNode)::Int64\n");
}

#[rstest]
#[case(
    "class P:\n    pass\n\nx = P.missing()\n",
    SemanticErrorKind::UnknownMethod { class: "P".into(), method: "missing".into() }
)]
#[case(
    "class P:\n    pass\n\nx = P.origin\n",
    SemanticErrorKind::UnsupportedClassAttribute { class: "P".into(), attribute: "origin".into() }
)]
#[case(
    "class P:\n    def f(self):\n        super().f()\n",
    SemanticErrorKind::SuperWithoutSuperclass("P".into())
)]
#[case(
    "class P:\n    def make():\n        return super().make()\n",
    SemanticErrorKind::SuperOutsideMethod
)]
#[case("super().run()\n", SemanticErrorKind::SuperOutsideMethod)]
#[case(
    "class A:\n    pass\n\nclass B(A):\n    def f(self):\n        return super().f()\n",
    SemanticErrorKind::UnknownMethod { class: "A".into(), method: "f".into() }
)]
#[case(
    "class A:\n    pass\n\nclass B(A):\n    def f(self):\n        super(Z).f()\n",
    SemanticErrorKind::UnknownSuperclass { class: "B".into(), superclass: "Z".into() }
)]
#[case(
    "class A:\n    def __init__(self):\n        self.items: dict = 0\n",
    SemanticErrorKind::UnsupportedAnnotation("dict".into())
)]
fn test_class_lowering_errors(#[case] source: &str, #[case] expected: SemanticErrorKind) {
    assert_eq!(semantic_kind(source), expected);
}
