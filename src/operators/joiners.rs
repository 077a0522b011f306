//! Built-in sort-merge joiners.
//!
//! All four joiners share the matched-cell behavior: the Cartesian product
//! of the two groups, enumerated left-major, with colliding non-key columns
//! split into suffixed pairs. They differ only in what they emit for
//! unmatched groups, which always pass through verbatim.

use super::Joiner;
use crate::error::Result;
use crate::row::Row;

const DEFAULT_SUFFIX_A: &str = "_1";
const DEFAULT_SUFFIX_B: &str = "_2";

fn merge_pair(keys: &[String], left: &Row, right: &Row, suffix_a: &str, suffix_b: &str) -> Row {
    let mut out = Row::new();
    for (column, value) in left.iter() {
        if keys.iter().any(|k| k == column) {
            // Key columns appear once, taken from the left.
            out.set(column, value.clone());
        } else if right.contains(column) {
            out.set(format!("{column}{suffix_a}"), value.clone());
        } else {
            out.set(column, value.clone());
        }
    }
    for (column, value) in right.iter() {
        if keys.iter().any(|k| k == column) {
            continue;
        }
        if left.contains(column) {
            out.set(format!("{column}{suffix_b}"), value.clone());
        } else {
            out.set(column, value.clone());
        }
    }
    out
}

fn cartesian(
    keys: &[String],
    left: &[Row],
    right: &[Row],
    suffix_a: &str,
    suffix_b: &str,
) -> Vec<Row> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            out.push(merge_pair(keys, l, r, suffix_a, suffix_b));
        }
    }
    out
}

/// Emits matched Cartesian products only; unmatched groups are skipped.
pub struct InnerJoiner {
    suffix_a: String,
    suffix_b: String,
}

impl InnerJoiner {
    pub fn new(suffix_a: impl Into<String>, suffix_b: impl Into<String>) -> Self {
        InnerJoiner {
            suffix_a: suffix_a.into(),
            suffix_b: suffix_b.into(),
        }
    }
}

impl Default for InnerJoiner {
    fn default() -> Self {
        InnerJoiner::new(DEFAULT_SUFFIX_A, DEFAULT_SUFFIX_B)
    }
}

impl Joiner for InnerJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>> {
        if left.is_empty() || right.is_empty() {
            return Ok(Vec::new());
        }
        Ok(cartesian(keys, left, right, &self.suffix_a, &self.suffix_b))
    }
}

/// Emits matched products plus every unmatched row from either side, as-is.
pub struct OuterJoiner {
    suffix_a: String,
    suffix_b: String,
}

impl OuterJoiner {
    pub fn new(suffix_a: impl Into<String>, suffix_b: impl Into<String>) -> Self {
        OuterJoiner {
            suffix_a: suffix_a.into(),
            suffix_b: suffix_b.into(),
        }
    }
}

impl Default for OuterJoiner {
    fn default() -> Self {
        OuterJoiner::new(DEFAULT_SUFFIX_A, DEFAULT_SUFFIX_B)
    }
}

impl Joiner for OuterJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>> {
        if right.is_empty() {
            return Ok(left.to_vec());
        }
        if left.is_empty() {
            return Ok(right.to_vec());
        }
        Ok(cartesian(keys, left, right, &self.suffix_a, &self.suffix_b))
    }
}

/// Emits matched products plus unmatched left rows; unmatched right groups
/// are dropped.
pub struct LeftJoiner {
    suffix_a: String,
    suffix_b: String,
}

impl LeftJoiner {
    pub fn new(suffix_a: impl Into<String>, suffix_b: impl Into<String>) -> Self {
        LeftJoiner {
            suffix_a: suffix_a.into(),
            suffix_b: suffix_b.into(),
        }
    }
}

impl Default for LeftJoiner {
    fn default() -> Self {
        LeftJoiner::new(DEFAULT_SUFFIX_A, DEFAULT_SUFFIX_B)
    }
}

impl Joiner for LeftJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>> {
        if right.is_empty() {
            return Ok(left.to_vec());
        }
        if left.is_empty() {
            return Ok(Vec::new());
        }
        Ok(cartesian(keys, left, right, &self.suffix_a, &self.suffix_b))
    }
}

/// Mirror image of [`LeftJoiner`].
pub struct RightJoiner {
    suffix_a: String,
    suffix_b: String,
}

impl RightJoiner {
    pub fn new(suffix_a: impl Into<String>, suffix_b: impl Into<String>) -> Self {
        RightJoiner {
            suffix_a: suffix_a.into(),
            suffix_b: suffix_b.into(),
        }
    }
}

impl Default for RightJoiner {
    fn default() -> Self {
        RightJoiner::new(DEFAULT_SUFFIX_A, DEFAULT_SUFFIX_B)
    }
}

impl Joiner for RightJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>> {
        if left.is_empty() {
            return Ok(right.to_vec());
        }
        if right.is_empty() {
            return Ok(Vec::new());
        }
        Ok(cartesian(keys, left, right, &self.suffix_a, &self.suffix_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_colliding_columns_get_suffixes() {
        let out = InnerJoiner::default()
            .join(
                &keys(&["k"]),
                &[row! { "k" => 1, "v" => "a", "x" => 10 }],
                &[row! { "k" => 1, "v" => "b", "y" => 20 }],
            )
            .unwrap();
        assert_eq!(
            out,
            vec![row! { "k" => 1, "v_1" => "a", "v_2" => "b", "x" => 10, "y" => 20 }]
        );
    }

    #[test]
    fn test_cartesian_product_is_left_major() {
        let out = InnerJoiner::default()
            .join(
                &keys(&["k"]),
                &[row! { "k" => 1, "a" => 1 }, row! { "k" => 1, "a" => 2 }],
                &[row! { "k" => 1, "b" => 1 }, row! { "k" => 1, "b" => 2 }],
            )
            .unwrap();
        let pairs: Vec<(i64, i64)> = out
            .iter()
            .map(|r| {
                (
                    r.get("a").and_then(crate::Value::as_int).unwrap_or(0),
                    r.get("b").and_then(crate::Value::as_int).unwrap_or(0),
                )
            })
            .collect();
        assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_unmatched_rows_pass_through_verbatim() {
        let left = [row! { "k" => 1, "a" => 1 }];
        let out = OuterJoiner::default()
            .join(&keys(&["k"]), &left, &[])
            .unwrap();
        assert_eq!(out, left.to_vec());
        assert!(InnerJoiner::default()
            .join(&keys(&["k"]), &left, &[])
            .unwrap()
            .is_empty());
        assert!(RightJoiner::default()
            .join(&keys(&["k"]), &left, &[])
            .unwrap()
            .is_empty());
    }
}
