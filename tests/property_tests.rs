//! Property-based tests (proptest) for the quantified engine invariants.

use proptest::prelude::*;

use rowflow::operators::Count;
use rowflow::{row, Config, Graph, Inputs, Row, SortConfig, Value};

fn rows_from(values: &[i64]) -> Vec<Row> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| row! { "k" => *v, "seq" => i })
        .collect()
}

fn key_of(row: &Row) -> i64 {
    row.get("k").and_then(Value::as_int).unwrap_or(i64::MIN)
}

fn tiny_chunks() -> Config {
    Config {
        sort: SortConfig {
            chunk_size: 4,
            spill_dir: None,
        },
    }
}

proptest! {
    /// Sorting yields a non-decreasing permutation of the input.
    #[test]
    fn prop_sort_is_a_sorted_permutation(values in prop::collection::vec(-50i64..50, 0..200)) {
        let inputs = Inputs::new().with_rows("rows", rows_from(&values));
        let sorted = Graph::from_iter("rows")
            .sort(&["k"])
            .run_with(&inputs, &tiny_chunks())
            .unwrap();

        prop_assert_eq!(sorted.len(), values.len());
        for pair in sorted.windows(2) {
            prop_assert!(key_of(&pair[0]) <= key_of(&pair[1]));
        }
        let mut expected = values.clone();
        expected.sort_unstable();
        let mut actual: Vec<i64> = sorted.iter().map(key_of).collect();
        actual.sort_unstable();
        prop_assert_eq!(actual, expected);
    }

    /// Spilling to disk never changes the result.
    #[test]
    fn prop_chunk_size_does_not_change_output(values in prop::collection::vec(-50i64..50, 0..120)) {
        let inputs = Inputs::new().with_rows("rows", rows_from(&values));
        let graph = Graph::from_iter("rows").sort(&["k", "seq"]);
        let spilled = graph.run_with(&inputs, &tiny_chunks()).unwrap();
        let in_memory = graph.run(&inputs).unwrap();
        prop_assert_eq!(spilled, in_memory);
    }

    /// Sorting already sorted input is the identity.
    #[test]
    fn prop_sort_is_idempotent(values in prop::collection::vec(-50i64..50, 0..120)) {
        let inputs = Inputs::new().with_rows("rows", rows_from(&values));
        let once = Graph::from_iter("rows").sort(&["k", "seq"]);
        let twice = once.sort(&["k", "seq"]);
        prop_assert_eq!(
            once.run_with(&inputs, &tiny_chunks()).unwrap(),
            twice.run_with(&inputs, &tiny_chunks()).unwrap()
        );
    }

    /// Reduce over sorted input sees every distinct key exactly once.
    #[test]
    fn prop_reduce_sees_each_key_once(values in prop::collection::vec(0i64..20, 0..150)) {
        let inputs = Inputs::new().with_rows("rows", rows_from(&values));
        let counts = Graph::from_iter("rows")
            .sort(&["k"])
            .reduce(Count::new("n"), &["k"])
            .run_with(&inputs, &tiny_chunks())
            .unwrap();

        let mut distinct = values.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(counts.len(), distinct.len());

        let total: i64 = counts
            .iter()
            .map(|r| r.get("n").and_then(Value::as_int).unwrap_or(0))
            .sum();
        prop_assert_eq!(total, values.len() as i64);
    }

    /// Eager and lazy execution agree.
    #[test]
    fn prop_run_equals_gen_run(values in prop::collection::vec(-20i64..20, 0..100)) {
        let inputs = Inputs::new().with_rows("rows", rows_from(&values));
        let graph = Graph::from_iter("rows")
            .sort(&["k"])
            .reduce(Count::new("n"), &["k"]);
        let eager = graph.run(&inputs).unwrap();
        let lazy: Vec<Row> = graph
            .gen_run(&inputs)
            .unwrap()
            .collect::<rowflow::Result<Vec<Row>>>()
            .unwrap();
        prop_assert_eq!(eager, lazy);
    }
}
