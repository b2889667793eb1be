use frontend::token::{Keyword, NAMESPACE_MARKER, function_name};
use julia_backend::naming::escape_identifier;
use julia_backend::translate;
use proptest::prelude::*;

fn lowered(statement: &str) -> String {
    translate(&format!("{statement}\n")).unwrap().trim_end().to_string()
}

proptest! {
    #[test]
    fn single_argument_range_ends_one_below_its_stop(n in 0i64..100_000) {
        prop_assert_eq!(lowered(&format!("range({n})")), format!("0:{}", n - 1));
    }

    #[test]
    fn two_argument_range_is_closed(start in 0i64..1000, len in 0i64..1000) {
        let stop = start + len;
        prop_assert_eq!(
            lowered(&format!("range({start}, {stop})")),
            format!("{start}:{}", stop - 1)
        );
    }

    #[test]
    fn stepped_range_uses_start_step_last(start in 0i64..1000, stop in 0i64..1000, step in 1i64..10) {
        prop_assert_eq!(
            lowered(&format!("range({start}, {stop}, {step})")),
            format!("{start}:{step}:{}", stop - 1)
        );
        prop_assert_eq!(
            lowered(&format!("range({stop}, {start}, -{step})")),
            format!("{stop}:-{step}:{}", start + 1)
        );
    }

    #[test]
    fn literal_index_shifts_to_one_based(k in 0i64..1_000_000) {
        prop_assert_eq!(lowered(&format!("a[{k}]")), format!("a[{}]", k + 1));
    }

    #[test]
    fn literal_slice_bounds_shift(lower in 0i64..1000, upper in 0i64..1000) {
        prop_assert_eq!(
            lowered(&format!("a[{lower}:{upper}]")),
            format!("a[{}:{}]", lower + 1, upper - 1)
        );
    }

    #[test]
    fn names_pass_through_expressions(name in "[a-z][a-z0-9_]{0,8}") {
        prop_assume!(Keyword::lookup(&name).is_none());
        prop_assume!(function_name(&name).is_none() && name != NAMESPACE_MARKER && name != "super");
        prop_assume!(escape_identifier(&name) == name);
        prop_assert_eq!(lowered(&format!("y = {name} + 1")), format!("y = {name} .+ 1"));
    }
}
