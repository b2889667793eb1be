//! Class layout resolution.
//!
//! Runs once over the class registry before any text is emitted and fixes,
//! for every class, the Julia names it is lowered to and the full field list
//! of its record type. Fields are flattened down the inheritance chain:
//! inherited fields come first, in the order the ancestors declared them,
//! followed by the class's own constructor attributes. Private attributes are
//! mangled with the class that declares them, so a subclass never shares a
//! private slot with its superclass.
//!
//! The generator only reads the result; the AST is never rewritten.

use std::collections::HashMap;

use frontend::ClassRegistry;
use frontend::error::SemanticError;
use string_interner::{DefaultStringInterner, DefaultSymbol};

use crate::naming::{escape_identifier, member_name};
use crate::types::{abstract_type_name, julia_type};

const INITIALIZER: &str = "__init__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub julia_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLayout {
    /// Name of the concrete record type.
    pub name: String,
    pub abstract_name: String,
    pub super_abstract: Option<String>,
    pub fields: Vec<Field>,
    /// Neither the class nor an ancestor defines `__init__`.
    pub needs_initializer: bool,
}

#[derive(Debug, Default)]
pub struct ClassLayouts {
    layouts: HashMap<DefaultSymbol, ClassLayout>,
}

impl ClassLayouts {
    pub fn resolve(
        registry: &ClassRegistry,
        interner: &DefaultStringInterner,
    ) -> Result<Self, SemanticError> {
        let initializer = interner.get(INITIALIZER);
        let mut layouts: HashMap<DefaultSymbol, ClassLayout> = HashMap::new();

        // Registration order puts every superclass before its subclasses.
        for class in registry.iter() {
            let raw_name = interner.resolve(class.name).unwrap_or("<unknown>");
            let name = escape_identifier(raw_name);

            let (mut fields, super_abstract) = match class.superclass.and_then(|s| layouts.get(&s)) {
                Some(parent) => (parent.fields.clone(), Some(parent.abstract_name.clone())),
                None => (Vec::new(), None),
            };
            for attribute in &class.attributes {
                let attribute_name = interner.resolve(*attribute).unwrap_or("<unknown>");
                let field_name = member_name(attribute_name, Some(raw_name));
                if fields.iter().any(|field| field.name == field_name) {
                    continue;
                }
                let julia_type = match class.attribute_types.get(attribute) {
                    Some(annotation) => julia_type(annotation, registry, interner)?,
                    None => "Any".to_string(),
                };
                fields.push(Field { name: field_name, julia_type });
            }

            let needs_initializer = initializer
                .is_none_or(|init| registry.method_owner(class.name, init).is_none());

            layouts.insert(
                class.name,
                ClassLayout {
                    abstract_name: abstract_type_name(&name),
                    name,
                    super_abstract,
                    fields,
                    needs_initializer,
                },
            );
        }
        Ok(ClassLayouts { layouts })
    }

    pub fn get(&self, class: DefaultSymbol) -> Option<&ClassLayout> {
        self.layouts.get(&class)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
