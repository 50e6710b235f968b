//! Model-based checks of the retention policies against their definitions

use proptest::prelude::*;
use sawyer::*;

fn parser_with(retention: Retention) -> Parser {
    Parser::new().with_group(
        SwitchGroup::new("g").with_switch(
            Switch::new("x")
                .retention(retention)
                .argument(SwitchArgument::new("n", integer_parser())),
        ),
    )
}

fn occurrences(values: &[u8]) -> Vec<String> {
    values.iter().map(|v| format!("--x={}", v)).collect()
}

fn stored(result: &ParserResult) -> Vec<i64> {
    result
        .parsed("x")
        .iter()
        .map(|v| v.as_integer().unwrap())
        .collect()
}

proptest! {
    #[test]
    fn save_all_keeps_every_occurrence(values in prop::collection::vec(0u8..100, 1..6)) {
        let result = parser_with(Retention::All).parse(occurrences(&values)).unwrap();
        let expected: Vec<i64> = values.iter().map(|v| *v as i64).collect();
        prop_assert_eq!(stored(&result), expected);
    }

    #[test]
    fn save_last_keeps_only_the_latest(values in prop::collection::vec(0u8..100, 1..6)) {
        let result = parser_with(Retention::Last).parse(occurrences(&values)).unwrap();
        prop_assert_eq!(stored(&result), vec![*values.last().unwrap() as i64]);
    }

    #[test]
    fn save_first_keeps_only_the_earliest(values in prop::collection::vec(0u8..100, 1..6)) {
        let result = parser_with(Retention::First).parse(occurrences(&values)).unwrap();
        prop_assert_eq!(stored(&result), vec![values[0] as i64]);
    }

    #[test]
    fn save_one_allows_exactly_one(values in prop::collection::vec(0u8..100, 1..6)) {
        let outcome = parser_with(Retention::One).parse(occurrences(&values));
        if values.len() == 1 {
            prop_assert_eq!(stored(&outcome.unwrap()), vec![values[0] as i64]);
        } else {
            prop_assert!(outcome.is_err());
        }
    }

    #[test]
    fn key_sequences_count_up_from_zero(values in prop::collection::vec(0u8..100, 1..6)) {
        let result = parser_with(Retention::All).parse(occurrences(&values)).unwrap();
        for (i, v) in result.parsed("x").iter().enumerate() {
            prop_assert_eq!(v.key_sequence(), i);
            prop_assert_eq!(v.switch_sequence(), i);
        }
    }

    // with both skip flags on, every input string ends up either parsed,
    // skipped or unreached
    #[test]
    fn every_argument_is_accounted_for(
        tokens in prop::collection::vec(
            prop_oneof![
                (0u8..100).prop_map(|v| format!("--x={}", v)),
                Just("word".to_string()),
                Just("--bogus".to_string()),
            ],
            0..8,
        ),
    ) {
        let parser = Parser::new()
            .skip_unknown_switches(true)
            .skip_nonswitches(true)
            .with_group(
                SwitchGroup::new("g").with_switch(
                    Switch::new("x")
                        .retention(Retention::All)
                        .argument(SwitchArgument::new("n", integer_parser())),
                ),
            );
        let result = parser.parse(tokens.clone()).unwrap();
        let mut accounted = result.parsed_args();
        accounted.extend(result.unparsed_args(true));
        accounted.sort();
        let mut all = tokens;
        all.sort();
        prop_assert_eq!(accounted, all);
    }
}
