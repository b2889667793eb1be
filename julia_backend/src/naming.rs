//! Identifier spelling in the emitted Julia.

/// Julia keywords that are ordinary identifiers in the source language.
const RESERVED_WORDS: &[&str] = &[
    "baremodule", "begin", "catch", "const", "do", "elseif", "end", "export", "function",
    "let", "local", "macro", "module", "mutable", "abstract", "primitive", "quote", "struct",
    "using",
];

/// Appends `_` to names Julia would read as a keyword.
pub fn escape_identifier(name: &str) -> String {
    if RESERVED_WORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// `__name` but not `__name__`.
pub fn is_private(name: &str) -> bool {
    name.len() > 2 && name.starts_with("__") && !name.ends_with("__")
}

/// Splices the owning class into a private member name: `__x` in `Foo`
/// becomes `_Foo__x`. Other names are returned unchanged.
pub fn mangle(name: &str, owner: Option<&str>) -> String {
    match owner {
        Some(owner) if is_private(name) => {
            let owner = owner.trim_start_matches('_');
            if owner.is_empty() {
                name.to_string()
            } else {
                format!("_{owner}{name}")
            }
        }
        _ => name.to_string(),
    }
}

/// Mangled then escaped member name.
pub fn member_name(name: &str, owner: Option<&str>) -> String {
    escape_identifier(&mangle(name, owner))
}
