//! # Value Type System
//!
//! Core value types carried by row columns: Int, Float, Str, Coord, Null.
//! Values are a tagged sum with comparison defined within a class only;
//! `Int` and `Float` form a single numeric class compared by promotion,
//! because the arithmetic built-ins freely mix them. Any other cross-class
//! comparison is a schema error.
//!
//! ## Usage
//!
//! ```rust
//! use rowflow::Value;
//!
//! let count = Value::from(3);
//! let score = Value::from(3.0);
//! assert_eq!(count, score); // numeric comparison promotes
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// A dynamically typed column value.
///
/// The untagged serde representation round-trips through JSON: integers stay
/// `Int`, decimals stay `Float`, two-element arrays become `Coord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / null value; never orderable
    Null,
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// `(longitude, latitude)` pair in decimal degrees
    Coord((f64, f64)),
}

/// Comparison class of a value. One class per sort-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Null,
    Numeric,
    Str,
    Coord,
}

impl ValueClass {
    pub fn name(self) -> &'static str {
        match self {
            ValueClass::Null => "null",
            ValueClass::Numeric => "number",
            ValueClass::Str => "string",
            ValueClass::Coord => "coordinate",
        }
    }

    fn rank(self) -> u8 {
        match self {
            ValueClass::Null => 0,
            ValueClass::Numeric => 1,
            ValueClass::Str => 2,
            ValueClass::Coord => 3,
        }
    }
}

impl Value {
    /// Human-readable tag name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Coord(_) => "coordinate",
        }
    }

    /// Comparison class of this value.
    pub fn class(&self) -> ValueClass {
        match self {
            Value::Null => ValueClass::Null,
            Value::Int(_) | Value::Float(_) => ValueClass::Numeric,
            Value::Str(_) => ValueClass::Str,
            Value::Coord(_) => ValueClass::Coord,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_coord(&self) -> Option<(f64, f64)> {
        match self {
            Value::Coord(c) => Some(*c),
            _ => None,
        }
    }

    /// Numeric view of the value, or a typed error naming `column`.
    pub fn expect_float(&self, column: &str) -> Result<f64> {
        self.as_float().ok_or_else(|| Error::TypeMismatch {
            column: column.to_string(),
            expected: "a number",
            found: self.type_name(),
        })
    }

    /// String view of the value, or a typed error naming `column`.
    pub fn expect_str(&self, column: &str) -> Result<&str> {
        self.as_str().ok_or_else(|| Error::TypeMismatch {
            column: column.to_string(),
            expected: "a string",
            found: self.type_name(),
        })
    }

    /// Coordinate view of the value, or a typed error naming `column`.
    pub fn expect_coord(&self, column: &str) -> Result<(f64, f64)> {
        self.as_coord().ok_or_else(|| Error::TypeMismatch {
            column: column.to_string(),
            expected: "a coordinate pair",
            found: self.type_name(),
        })
    }

    /// Compare two values of the same class.
    ///
    /// Cross-class comparison (other than the Int/Float promotion) is a
    /// schema error; `Null` never participates.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        let (a, b) = (self.class(), other.class());
        if a == b && a != ValueClass::Null {
            Ok(total_cmp(self, other))
        } else {
            Err(Error::IncomparableValues {
                left: self.type_name(),
                right: other.type_name(),
            })
        }
    }

    /// Checked addition, promoting to `Float` on mixed operands.
    pub(crate) fn checked_add(&self, other: &Value, column: &str) -> Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or_else(|| Error::IntegerOverflow(column.to_string())),
            _ => numeric_pair(self, other, column).map(|(a, b)| Value::Float(a + b)),
        }
    }

    /// Checked multiplication, promoting to `Float` on mixed operands.
    pub(crate) fn checked_mul(&self, other: &Value, column: &str) -> Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_mul(*b)
                .map(Value::Int)
                .ok_or_else(|| Error::IntegerOverflow(column.to_string())),
            _ => numeric_pair(self, other, column).map(|(a, b)| Value::Float(a * b)),
        }
    }
}

fn numeric_pair(a: &Value, b: &Value, column: &str) -> Result<(f64, f64)> {
    Ok((a.expect_float(column)?, b.expect_float(column)?))
}

/// Deterministic total order over values, used by the sorting machinery.
///
/// Callers validate class consistency first; the cross-class branch (rank
/// comparison) only decides ties between runs that validation already
/// admitted, so it never silently orders genuinely mixed columns.
pub(crate) fn total_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).total_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.total_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Coord(x), Value::Coord(y)) => x.0.total_cmp(&y.0).then(x.1.total_cmp(&y.1)),
        _ => a.class().rank().cmp(&b.class().rank()),
    }
}

/// Compare two key tuples component-wise, ascending.
pub(crate) fn compare_keys(a: &[Value], b: &[Value]) -> Result<Ordering> {
    for (x, y) in a.iter().zip(b) {
        match x.compare(y)? {
            Ordering::Equal => {}
            ord => return Ok(ord),
        }
    }
    Ok(a.len().cmp(&b.len()))
}

/// A key tuple under the deterministic total order.
///
/// Internal handle for heaps and ordered maps; constructed only after the
/// owning operator has validated value classes.
#[derive(Debug, Clone)]
pub(crate) struct KeyOrd(pub(crate) Vec<Value>);

impl PartialEq for KeyOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyOrd {}

impl PartialOrd for KeyOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match total_cmp(a, b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Coord(a), Value::Coord(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Coord((lon, lat)) => write!(f, "({lon}, {lat})"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<(f64, f64)> for Value {
    fn from(v: (f64, f64)) -> Self {
        Value::Coord(v)
    }
}
