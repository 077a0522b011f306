//! Rows: column name to value mappings.
//!
//! A row is one logical record. Column order carries no meaning; operators
//! construct new rows rather than mutate their inputs in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// One logical record: a mapping from column names to [`Value`]s.
///
/// Serializes transparently as a JSON object, which is also the spill-file
/// and line-parser representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Fetch a column, failing with [`Error::MissingColumn`] when absent.
    pub fn require(&self, column: &str) -> Result<&Value> {
        self.columns
            .get(column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.columns.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Extract the values of the listed key columns, in key-list order.
    pub fn key_values(&self, keys: &[String]) -> Result<Vec<Value>> {
        keys.iter()
            .map(|k| self.require(k).cloned())
            .collect()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Row {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Build a [`Row`] from `column => value` pairs.
///
/// ```rust
/// use rowflow::row;
///
/// let r = row! { "text" => "hello", "count" => 3 };
/// assert_eq!(r.get("count"), Some(&rowflow::Value::Int(3)));
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $( row.set($column, $value); )+
        row
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_missing_column() {
        let row = row! { "a" => 1 };
        assert!(row.require("a").is_ok());
        let err = row.require("b").unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "b"));
    }

    #[test]
    fn test_key_values_follow_key_list_order() {
        let row = row! { "a" => 1, "b" => 2 };
        let keys = vec!["b".to_string(), "a".to_string()];
        assert_eq!(
            row.key_values(&keys).unwrap(),
            vec![Value::Int(2), Value::Int(1)]
        );
    }

    #[test]
    fn test_rows_round_trip_through_json() {
        let row = row! { "text" => "hi", "n" => 2, "pos" => (1.5, 2.5) };
        let encoded = serde_json::to_string(&row).unwrap();
        let decoded: Row = serde_json::from_str(&encoded).unwrap();
        assert_eq!(row, decoded);
    }
}
