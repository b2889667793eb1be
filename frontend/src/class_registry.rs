use std::collections::HashMap;

use string_interner::{DefaultStringInterner, DefaultSymbol};

use crate::ast::ClassDef;
use crate::error::{SemanticError, SemanticErrorKind};

/// Flat namespace of every class defined in a compilation unit.
///
/// Filled by the parser as class definitions complete and consulted by the
/// generator for inherited layout and superclass dispatch targets.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<DefaultSymbol, ClassDef>,
    order: Vec<DefaultSymbol>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a completed class. The superclass, if any, must already be
    /// registered and the name must be new.
    pub fn register(
        &mut self,
        class: ClassDef,
        interner: &DefaultStringInterner,
    ) -> Result<(), SemanticError> {
        let name = resolve(interner, class.name);
        if self.classes.contains_key(&class.name) {
            return Err(SemanticError::at(
                SemanticErrorKind::DuplicateClass(name),
                class.span.start,
            ));
        }
        if let Some(superclass) = class.superclass {
            if !self.classes.contains_key(&superclass) {
                return Err(SemanticError::at(
                    SemanticErrorKind::UnknownSuperclass {
                        class: name,
                        superclass: resolve(interner, superclass),
                    },
                    class.span.start,
                ));
            }
        }
        self.order.push(class.name);
        self.classes.insert(class.name, class);
        Ok(())
    }

    pub fn get(&self, name: DefaultSymbol) -> Option<&ClassDef> {
        self.classes.get(&name)
    }

    pub fn contains(&self, name: DefaultSymbol) -> bool {
        self.classes.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassDef> {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    /// `name` itself followed by its superclasses, nearest first.
    pub fn ancestors(&self, name: DefaultSymbol) -> Ancestors<'_> {
        Ancestors { registry: self, next: Some(name) }
    }

    /// The nearest class, starting at `class`, whose body defines `method`.
    pub fn method_owner(&self, class: DefaultSymbol, method: DefaultSymbol) -> Option<&ClassDef> {
        self.ancestors(class).find(|def| def.declares_method(method))
    }

    pub fn any_declares_method(&self, method: DefaultSymbol) -> bool {
        self.classes.values().any(|def| def.declares_method(method))
    }
}

pub struct Ancestors<'a> {
    registry: &'a ClassRegistry,
    next: Option<DefaultSymbol>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ClassDef;

    fn next(&mut self) -> Option<Self::Item> {
        let class = self.registry.get(self.next?)?;
        self.next = class.superclass;
        Some(class)
    }
}

fn resolve(interner: &DefaultStringInterner, symbol: DefaultSymbol) -> String {
    interner.resolve(symbol).unwrap_or("<unknown>").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Block;
    use crate::error::Span;

    fn class(name: DefaultSymbol, superclass: Option<DefaultSymbol>) -> ClassDef {
        ClassDef {
            name,
            superclass,
            body: Block::default(),
            attributes: Vec::new(),
            attribute_types: HashMap::new(),
            span: Span::default(),
        }
    }

    #[test]
    fn ancestors_walk_to_the_root() {
        let mut interner = DefaultStringInterner::new();
        let a = interner.get_or_intern("A");
        let b = interner.get_or_intern("B");
        let c = interner.get_or_intern("C");
        let mut registry = ClassRegistry::new();
        registry.register(class(a, None), &interner).unwrap();
        registry.register(class(b, Some(a)), &interner).unwrap();
        registry.register(class(c, Some(b)), &interner).unwrap();

        let chain: Vec<DefaultSymbol> = registry.ancestors(c).map(|d| d.name).collect();
        assert_eq!(chain, vec![c, b, a]);
        let order: Vec<DefaultSymbol> = registry.iter().map(|d| d.name).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let mut interner = DefaultStringInterner::new();
        let a = interner.get_or_intern("A");
        let mut registry = ClassRegistry::new();
        registry.register(class(a, None), &interner).unwrap();
        let err = registry.register(class(a, None), &interner).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::DuplicateClass("A".to_string()));
    }

    #[test]
    fn unknown_superclass_is_rejected() {
        let mut interner = DefaultStringInterner::new();
        let a = interner.get_or_intern("A");
        let missing = interner.get_or_intern("Missing");
        let mut registry = ClassRegistry::new();
        let err = registry.register(class(a, Some(missing)), &interner).unwrap_err();
        assert_eq!(
            err.kind,
            SemanticErrorKind::UnknownSuperclass {
                class: "A".to_string(),
                superclass: "Missing".to_string(),
            }
        );
        assert!(registry.is_empty());
    }
}
