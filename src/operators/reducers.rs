//! Built-in reducers.
//!
//! Each reducer folds one contiguous group of key-equal rows. Key columns
//! are copied from the last row of the group; the group shares key values by
//! construction, so any row would do.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use super::Reducer;
use crate::error::Result;
use crate::row::Row;
use crate::value::{KeyOrd, Value};

/// Emits only the first row of the group.
pub struct FirstReducer;

impl Reducer for FirstReducer {
    fn reduce(&self, _keys: &[String], group: &[Row]) -> Result<Vec<Row>> {
        Ok(group.first().cloned().into_iter().collect())
    }
}

fn key_row(keys: &[String], group: &[Row]) -> Result<Option<Row>> {
    let Some(last) = group.last() else {
        return Ok(None);
    };
    let mut row = Row::new();
    for key in keys {
        row.set(key.clone(), last.require(key)?.clone());
    }
    Ok(Some(row))
}

/// One row per group: key columns plus the group size.
pub struct Count {
    column: String,
}

impl Count {
    pub fn new(column: impl Into<String>) -> Self {
        Count {
            column: column.into(),
        }
    }
}

impl Reducer for Count {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>> {
        let Some(mut row) = key_row(keys, group)? else {
            return Ok(Vec::new());
        };
        row.set(self.column.clone(), group.len());
        Ok(vec![row])
    }
}

/// One row per group: key columns plus the column sum.
pub struct Sum {
    column: String,
}

impl Sum {
    pub fn new(column: impl Into<String>) -> Self {
        Sum {
            column: column.into(),
        }
    }
}

impl Reducer for Sum {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>> {
        let Some(mut row) = key_row(keys, group)? else {
            return Ok(Vec::new());
        };
        let mut total = Value::Int(0);
        for member in group {
            total = total.checked_add(member.require(&self.column)?, &self.column)?;
        }
        row.set(self.column.clone(), total);
        Ok(vec![row])
    }
}

/// One row per group: key columns plus a sum per listed column.
pub struct MultiSum {
    columns: Vec<String>,
}

impl MultiSum {
    pub fn new(columns: &[&str]) -> Self {
        MultiSum {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

impl Reducer for MultiSum {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>> {
        let Some(mut row) = key_row(keys, group)? else {
            return Ok(Vec::new());
        };
        for column in &self.columns {
            let mut total = Value::Int(0);
            for member in group {
                total = total.checked_add(member.require(column)?, column)?;
            }
            row.set(column.clone(), total);
        }
        Ok(vec![row])
    }
}

/// Per distinct value of a column: key columns, the value, and its frequency
/// within the group.
pub struct TermFrequency {
    column: String,
    result: String,
}

impl TermFrequency {
    pub fn new(column: impl Into<String>, result: impl Into<String>) -> Self {
        TermFrequency {
            column: column.into(),
            result: result.into(),
        }
    }
}

impl Reducer for TermFrequency {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>> {
        let Some(key_columns) = key_row(keys, group)? else {
            return Ok(Vec::new());
        };
        let total = group.len() as f64;
        let mut counts: BTreeMap<KeyOrd, usize> = BTreeMap::new();
        for member in group {
            let value = member.require(&self.column)?.clone();
            *counts.entry(KeyOrd(vec![value])).or_insert(0) += 1;
        }
        let mut out = Vec::with_capacity(counts.len());
        for (key, count) in counts {
            let Some(value) = key.0.into_iter().next() else {
                continue;
            };
            let mut row = key_columns.clone();
            row.set(self.column.clone(), value);
            row.set(self.result.clone(), count as f64 / total);
            out.push(row);
        }
        Ok(out)
    }
}

/// Up to `n` rows with the largest values in a column, emitted in descending
/// order of that column.
///
/// Ties break on a sequence number assigned at push time, which keeps the
/// heap from ever comparing whole rows and makes the output reproducible.
pub struct TopN {
    column: String,
    n: usize,
}

impl TopN {
    pub fn new(column: impl Into<String>, n: usize) -> Self {
        TopN {
            column: column.into(),
            n,
        }
    }
}

struct TopEntry {
    key: KeyOrd,
    seq: usize,
    row: Row,
}

impl PartialEq for TopEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for TopEntry {}

impl PartialOrd for TopEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TopEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key).then(self.seq.cmp(&other.seq))
    }
}

impl Reducer for TopN {
    fn reduce(&self, _keys: &[String], group: &[Row]) -> Result<Vec<Row>> {
        let mut heap: BinaryHeap<Reverse<TopEntry>> = BinaryHeap::with_capacity(self.n + 1);
        for (seq, row) in group.iter().enumerate() {
            let key = KeyOrd(vec![row.require(&self.column)?.clone()]);
            heap.push(Reverse(TopEntry {
                key,
                seq,
                row: row.clone(),
            }));
            if heap.len() > self.n {
                heap.pop();
            }
        }
        let mut top: Vec<TopEntry> = heap.into_iter().map(|entry| entry.0).collect();
        top.sort_by(|a, b| b.key.cmp(&a.key).then(a.seq.cmp(&b.seq)));
        Ok(top.into_iter().map(|entry| entry.row).collect())
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
    fn test_count_takes_keys_from_last_row() {
        let group = vec![row! { "k" => 1, "x" => 10 }, row! { "k" => 1, "x" => 20 }];
        let out = Count::new("n").reduce(&keys(&["k"]), &group).unwrap();
        assert_eq!(out, vec![row! { "k" => 1, "n" => 2 }]);
    }

    #[test]
    fn test_sum_promotes_on_mixed_numerics() {
        let group = vec![row! { "x" => 1 }, row! { "x" => 0.5 }];
        let out = Sum::new("x").reduce(&keys(&[]), &group).unwrap();
        assert_eq!(out, vec![row! { "x" => 1.5 }]);
    }

    #[test]
    fn test_term_frequency_sums_to_one() {
        let group = vec![
            row! { "d" => 1, "w" => "a" },
            row! { "d" => 1, "w" => "b" },
            row! { "d" => 1, "w" => "a" },
            row! { "d" => 1, "w" => "a" },
        ];
        let out = TermFrequency::new("w", "tf")
            .reduce(&keys(&["d"]), &group)
            .unwrap();
        let total: f64 = out
            .iter()
            .map(|r| r.get("tf").and_then(Value::as_float).unwrap_or(0.0))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_top_n_is_descending_and_bounded() {
        let group: Vec<Row> = [3, 1, 4, 1, 5, 9, 2, 6]
            .iter()
            .map(|v| row! { "score" => *v })
            .collect();
        let out = TopN::new("score", 3).reduce(&keys(&[]), &group).unwrap();
        let scores: Vec<i64> = out
            .iter()
            .map(|r| r.get("score").and_then(Value::as_int).unwrap_or(0))
            .collect();
        assert_eq!(scores, vec![9, 6, 5]);
    }

    #[test]
    fn test_top_n_ties_are_deterministic() {
        let group = vec![
            row! { "score" => 1, "tag" => "first" },
            row! { "score" => 1, "tag" => "second" },
            row! { "score" => 1, "tag" => "third" },
        ];
        let reducer = TopN::new("score", 2);
        let a = reducer.reduce(&keys(&[]), &group).unwrap();
        let b = reducer.reduce(&keys(&[]), &group).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }
}
