#[cfg(test)]
mod property_tests {
    use frontend::token::{Keyword, Kind, NAMESPACE_MARKER, function_name};
    use frontend::{parse_source, tokenize};
    use proptest::prelude::*;
    use string_interner::DefaultStringInterner;

    /// One physical line: `open` starts a new block below it, otherwise the
    /// next line dedents by `close` levels (clamped to the current depth).
    #[derive(Debug, Clone)]
    struct LineShape {
        open: bool,
        close: usize,
        blank_after: bool,
    }

    fn line_shape() -> impl Strategy<Value = LineShape> {
        (any::<bool>(), 0usize..4, prop::bool::weighted(0.2))
            .prop_map(|(open, close, blank_after)| LineShape { open, close, blank_after })
    }

    /// Builds an indentation-correct program and returns it with the number
    /// of blocks it opens.
    fn build_program(shapes: &[LineShape]) -> (String, usize) {
        let mut source = String::new();
        let mut depth = 0usize;
        let mut opened = 0usize;
        for (i, shape) in shapes.iter().enumerate() {
            let last = i + 1 == shapes.len();
            let indent = "    ".repeat(depth);
            if shape.open && !last {
                source.push_str(&format!("{indent}if x:\n"));
                depth += 1;
                opened += 1;
            } else {
                source.push_str(&format!("{indent}x = {i}\n"));
                depth -= shape.close.min(depth);
            }
            if shape.blank_after {
                source.push_str("\n# note\n");
            }
        }
        (source, opened)
    }

    fn valid_identifier() -> impl Strategy<Value = String> {
        "[a-z_][a-zA-Z0-9_]{0,8}".prop_filter("not a reserved word", |s| {
            Keyword::lookup(s).is_none() && function_name(s).is_none() && s != NAMESPACE_MARKER
        })
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config {
            cases: 64,
            .. proptest::test_runner::Config::default()
        })]
        #[test]
        fn prop_indent_dedent_balance(shapes in prop::collection::vec(line_shape(), 1..24)) {
            let (source, opened) = build_program(&shapes);
            let mut interner = DefaultStringInterner::new();
            let tokens = tokenize(&source, &mut interner).expect("program should tokenize");

            let mut depth = 0i64;
            let mut indents = 0usize;
            for token in &tokens {
                match token.kind {
                    Kind::Indent => {
                        depth += 1;
                        indents += 1;
                    }
                    Kind::Dedent => depth -= 1,
                    _ => {}
                }
                prop_assert!(depth >= 0, "negative depth in {source:?}");
            }
            prop_assert_eq!(depth, 0);
            prop_assert_eq!(indents, opened);
            prop_assert_eq!(&tokens.last().unwrap().kind, &Kind::EOF);

            let mut interner = DefaultStringInterner::new();
            prop_assert!(parse_source(&source, &mut interner).is_ok());
        }
    }

    proptest! {
        #[test]
        fn prop_interning_is_idempotent(names in prop::collection::vec(valid_identifier(), 1..10)) {
            let source = format!("{}\n", names.join(" + "));
            let mut interner = DefaultStringInterner::new();
            let tokens = tokenize(&source, &mut interner).expect("identifiers should tokenize");

            let symbols: Vec<_> = tokens
                .iter()
                .filter_map(|token| match token.kind {
                    Kind::Identifier(symbol) => Some(symbol),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(symbols.len(), names.len());
            for (name, symbol) in names.iter().zip(&symbols) {
                prop_assert_eq!(interner.resolve(*symbol), Some(name.as_str()));
                prop_assert_eq!(interner.get(name.as_str()), Some(*symbol));
            }

            let mut distinct = names.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(interner.len(), distinct.len());
        }
    }

    proptest! {
        #[test]
        fn prop_integer_literals_roundtrip(n in 0i64..=i64::MAX) {
            let mut interner = DefaultStringInterner::new();
            let tokens = tokenize(&format!("{n}\n"), &mut interner).unwrap();
            prop_assert_eq!(&tokens[0].kind, &Kind::Integer(n));
        }
    }
}
