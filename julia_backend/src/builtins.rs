//! How calls to builtin and numerical-library functions are spelled in Julia.

/// Lowering applied to a call of a builtin or `np.` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLowering {
    /// `println(a, " ", b)`
    Println,
    /// `size(x, 1)`
    FirstDimension,
    /// `range(..)` becomes a closed Julia range.
    Range,
    /// `trunc(Int64, x)`
    Truncate,
    /// Same arguments, different function name.
    Rename(&'static str),
    /// `f.(args)`
    Elementwise(&'static str),
    /// A function from the `Statistics` standard library.
    Statistics(&'static str),
    /// Arguments folded into `(a op b op c)`.
    OperatorChain(&'static str),
    /// `array(x)` is `x` itself.
    Identity,
    /// Emitted unchanged.
    PassThrough,
}

const LOWERINGS: &[(&str, CallLowering)] = &[
    ("print", CallLowering::Println),
    ("len", CallLowering::FirstDimension),
    ("range", CallLowering::Range),
    ("int", CallLowering::Truncate),
    ("str", CallLowering::Rename("string")),
    ("float", CallLowering::Rename("Float64")),
    ("shape", CallLowering::Rename("size")),
    ("minimum", CallLowering::Elementwise("min")),
    ("maximum", CallLowering::Elementwise("max")),
    ("round", CallLowering::Elementwise("round")),
    ("log", CallLowering::Elementwise("log")),
    ("exp", CallLowering::Elementwise("exp")),
    ("sqrt", CallLowering::Elementwise("sqrt")),
    ("sin", CallLowering::Elementwise("sin")),
    ("cos", CallLowering::Elementwise("cos")),
    ("abs", CallLowering::Elementwise("abs")),
    ("mean", CallLowering::Statistics("mean")),
    ("median", CallLowering::Statistics("median")),
    ("std", CallLowering::Statistics("std")),
    ("equal", CallLowering::OperatorChain(".==")),
    ("less", CallLowering::OperatorChain(".<")),
    ("greater", CallLowering::OperatorChain(".>")),
    ("less_equal", CallLowering::OperatorChain(".<=")),
    ("greater_equal", CallLowering::OperatorChain(".>=")),
    ("multiply", CallLowering::OperatorChain(".*")),
    ("subtract", CallLowering::OperatorChain(".-")),
    ("divide", CallLowering::OperatorChain("./")),
    ("add", CallLowering::OperatorChain(".+")),
    ("dot", CallLowering::OperatorChain("*")),
    ("array", CallLowering::Identity),
];

pub fn call_lowering(name: &str) -> CallLowering {
    LOWERINGS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map_or(CallLowering::PassThrough, |(_, lowering)| *lowering)
}

/// List methods and the Julia function they become: `xs.append(v)` is
/// `push!(xs, v)`.
const LIST_METHODS: &[(&str, &str)] = &[
    ("append", "push!"),
    ("extend", "append!"),
    ("pop", "pop!"),
    ("copy", "copy"),
];

pub fn list_method(name: &str) -> Option<&'static str> {
    LIST_METHODS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, julia)| *julia)
}

pub fn list_methods() -> impl Iterator<Item = (&'static str, &'static str)> {
    LIST_METHODS.iter().copied()
}
