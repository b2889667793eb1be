use frontend::ClassRegistry;
use frontend::ast::TypeAnnotation;
use frontend::error::{SemanticError, SemanticErrorKind};
use string_interner::DefaultStringInterner;

use crate::naming::escape_identifier;

/// Name of the abstract marker type emitted for a class.
pub fn abstract_type_name(class: &str) -> String {
    format!("Abstract{class}")
}

/// Maps a source annotation to a Julia type.
///
/// Class annotations map to the class's abstract marker so subclass
/// instances are accepted too.
pub fn julia_type(
    annotation: &TypeAnnotation,
    registry: &ClassRegistry,
    interner: &DefaultStringInterner,
) -> Result<String, SemanticError> {
    let unsupported = || {
        SemanticError::at(
            SemanticErrorKind::UnsupportedAnnotation(render(annotation)),
            annotation.span.start,
        )
    };

    let scalar = match annotation.name.as_str() {
        "int" => Some("Int64"),
        "float" => Some("Float64"),
        "str" => Some("String"),
        "bool" => Some("Bool"),
        "None" => Some("Nothing"),
        _ => None,
    };
    if let Some(scalar) = scalar {
        return if annotation.arguments.is_empty() {
            Ok(scalar.to_string())
        } else {
            Err(unsupported())
        };
    }

    if annotation.name == "list" {
        return match annotation.arguments.as_slice() {
            [] => Ok("Vector{Any}".to_string()),
            [element] => Ok(format!("Vector{{{}}}", julia_type(element, registry, interner)?)),
            _ => Err(unsupported()),
        };
    }

    let is_class = interner
        .get(annotation.name.as_str())
        .is_some_and(|symbol| registry.contains(symbol));
    if is_class && annotation.arguments.is_empty() {
        return Ok(abstract_type_name(&escape_identifier(&annotation.name)));
    }
    Err(unsupported())
}

/// Source spelling of an annotation, for messages.
fn render(annotation: &TypeAnnotation) -> String {
    if annotation.arguments.is_empty() {
        return annotation.name.clone();
    }
    let arguments: Vec<String> = annotation.arguments.iter().map(render).collect();
    format!("{}[{}]", annotation.name, arguments.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontend::Span;
    use rstest::rstest;

    fn annotation(name: &str, arguments: Vec<TypeAnnotation>) -> TypeAnnotation {
        TypeAnnotation { name: name.to_string(), arguments, span: Span::default() }
    }

    fn map(annotation: &TypeAnnotation) -> Result<String, SemanticError> {
        let mut interner = DefaultStringInterner::new();
        let (_, registry) =
            frontend::parse_source("class Point:\n    pass\n", &mut interner).unwrap();
        julia_type(annotation, &registry, &interner)
    }

    #[rstest]
    #[case("int", "Int64")]
    #[case("float", "Float64")]
    #[case("str", "String")]
    #[case("bool", "Bool")]
    #[case("None", "Nothing")]
    #[case("list", "Vector{Any}")]
    #[case("Point", "AbstractPoint")]
    fn simple_annotations(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(map(&annotation(name, vec![])).unwrap(), expected);
    }

    #[test]
    fn parameterised_list() {
        let nested = annotation("list", vec![annotation("list", vec![annotation("int", vec![])])]);
        assert_eq!(map(&nested).unwrap(), "Vector{Vector{Int64}}");
    }

    #[rstest]
    #[case(annotation("dict", vec![]), "dict")]
    #[case(annotation("int", vec![annotation("int", vec![])]), "int[int]")]
    #[case(annotation("list", vec![annotation("int", vec![]), annotation("str", vec![])]), "list[int, str]")]
    #[case(annotation("list", vec![annotation("tuple", vec![])]), "tuple")]
    fn unsupported_annotations(#[case] annotation: TypeAnnotation, #[case] rendered: &str) {
        let error = map(&annotation).unwrap_err();
        assert_eq!(error.kind, SemanticErrorKind::UnsupportedAnnotation(rendered.to_string()));
    }
}
