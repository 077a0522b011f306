//! Built-in mappers.
//!
//! Text normalization (punctuation stripping, case folding, tokenization),
//! column projection and filtering, and the numeric transforms used by the
//! prebuilt graphs: TF-IDF, PMI, haversine distance, time bucketing, speed.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

use super::Mapper;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;

/// Emits the row unchanged.
pub struct Identity;

impl Mapper for Identity {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        Ok(vec![row])
    }
}

/// Keeps only alphabetic characters and spaces in a string column.
pub struct FilterPunctuation {
    column: String,
}

impl FilterPunctuation {
    pub fn new(column: impl Into<String>) -> Self {
        FilterPunctuation {
            column: column.into(),
        }
    }
}

impl Mapper for FilterPunctuation {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let cleaned: String = row
            .require(&self.column)?
            .expect_str(&self.column)?
            .chars()
            .filter(|c| c.is_alphabetic() || *c == ' ')
            .collect();
        row.set(self.column.clone(), cleaned);
        Ok(vec![row])
    }
}

/// Lowercases a string column (Unicode-aware).
pub struct LowerCase {
    column: String,
}

impl LowerCase {
    pub fn new(column: impl Into<String>) -> Self {
        LowerCase {
            column: column.into(),
        }
    }
}

impl Mapper for LowerCase {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let lowered = row
            .require(&self.column)?
            .expect_str(&self.column)?
            .to_lowercase();
        row.set(self.column.clone(), lowered);
        Ok(vec![row])
    }
}

/// Splits a string column into tokens, emitting one row per token.
///
/// Every emitted row carries one token in the split column and all other
/// columns unchanged. Empty tokens are dropped.
pub struct Split {
    column: String,
    separator: Option<char>,
}

impl Split {
    /// Split on runs of whitespace.
    pub fn new(column: impl Into<String>) -> Self {
        Split {
            column: column.into(),
            separator: None,
        }
    }

    /// Split on a specific separator character.
    pub fn with_separator(column: impl Into<String>, separator: char) -> Self {
        Split {
            column: column.into(),
            separator: Some(separator),
        }
    }
}

impl Mapper for Split {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        let text = row
            .require(&self.column)?
            .expect_str(&self.column)?
            .to_owned();
        let tokens: Vec<&str> = match self.separator {
            Some(sep) => text.split(sep).filter(|t| !t.is_empty()).collect(),
            None => text.split_whitespace().collect(),
        };
        Ok(tokens
            .into_iter()
            .map(|token| {
                let mut out = row.clone();
                out.set(self.column.clone(), token);
                out
            })
            .collect())
    }
}

/// Emits one row containing only the listed columns.
pub struct Project {
    columns: Vec<String>,
}

impl Project {
    pub fn new(columns: &[&str]) -> Self {
        Project {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

impl Mapper for Project {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        let mut out = Row::new();
        for column in &self.columns {
            out.set(column.clone(), row.require(column)?.clone());
        }
        Ok(vec![out])
    }
}

/// Emits the row iff the predicate holds.
pub struct Filter {
    predicate: Box<dyn Fn(&Row) -> bool>,
}

impl Filter {
    pub fn new(predicate: impl Fn(&Row) -> bool + 'static) -> Self {
        Filter {
            predicate: Box::new(predicate),
        }
    }
}

impl Mapper for Filter {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        if (self.predicate)(&row) {
            Ok(vec![row])
        } else {
            Ok(Vec::new())
        }
    }
}

/// `result = ∏ row[c]` over the listed numeric columns.
pub struct Product {
    columns: Vec<String>,
    result: String,
}

impl Product {
    pub fn new(columns: &[&str], result: impl Into<String>) -> Self {
        Product {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            result: result.into(),
        }
    }
}

impl Mapper for Product {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let mut acc = Value::Int(1);
        for column in &self.columns {
            acc = acc.checked_mul(row.require(column)?, column)?;
        }
        row.set(self.result.clone(), acc);
        Ok(vec![row])
    }
}

/// `result = tf * ln(doc_total / word_docs)`.
pub struct TfIdfMapper {
    tf: String,
    doc_total: String,
    word_docs: String,
    result: String,
}

impl TfIdfMapper {
    pub fn new(
        tf: impl Into<String>,
        doc_total: impl Into<String>,
        word_docs: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        TfIdfMapper {
            tf: tf.into(),
            doc_total: doc_total.into(),
            word_docs: word_docs.into(),
            result: result.into(),
        }
    }
}

impl Mapper for TfIdfMapper {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let tf = row.require(&self.tf)?.expect_float(&self.tf)?;
        let total = row.require(&self.doc_total)?.expect_float(&self.doc_total)?;
        let docs = row.require(&self.word_docs)?.expect_float(&self.word_docs)?;
        row.set(self.result.clone(), tf * checked_ln(total, docs, &self.word_docs)?);
        Ok(vec![row])
    }
}

/// `result = ln(doc_freq / total_freq)` (pointwise mutual information).
pub struct PmiMapper {
    doc_freq: String,
    total_freq: String,
    result: String,
}

impl PmiMapper {
    pub fn new(
        doc_freq: impl Into<String>,
        total_freq: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        PmiMapper {
            doc_freq: doc_freq.into(),
            total_freq: total_freq.into(),
            result: result.into(),
        }
    }
}

impl Mapper for PmiMapper {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let doc = row.require(&self.doc_freq)?.expect_float(&self.doc_freq)?;
        let total = row
            .require(&self.total_freq)?
            .expect_float(&self.total_freq)?;
        row.set(self.result.clone(), checked_ln(doc, total, &self.total_freq)?);
        Ok(vec![row])
    }
}

/// `ln(numerator / denominator)` with zero and domain checks.
fn checked_ln(numerator: f64, denominator: f64, column: &str) -> Result<f64> {
    if denominator == 0.0 {
        return Err(Error::DivisionByZero(column.to_string()));
    }
    let ratio = numerator / denominator;
    if ratio <= 0.0 {
        return Err(Error::NonPositiveLog(ratio));
    }
    Ok(ratio.ln())
}

/// Earth radius used by [`HaversineMapper`], in kilometres.
const EARTH_RADIUS_KM: f64 = 6373.0;

/// Great-circle distance in km between two `(longitude, latitude)` columns.
pub struct HaversineMapper {
    start: String,
    end: String,
    result: String,
}

impl HaversineMapper {
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        HaversineMapper {
            start: start.into(),
            end: end.into(),
            result: result.into(),
        }
    }
}

impl Mapper for HaversineMapper {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let (lon1, lat1) = row.require(&self.start)?.expect_coord(&self.start)?;
        let (lon2, lat2) = row.require(&self.end)?.expect_coord(&self.end)?;
        row.set(self.result.clone(), haversine_km(lon1, lat1, lon2, lat2));
        Ok(vec![row])
    }
}

fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Timestamp format accepted by [`TimeProcessMapper`], after fraction
/// normalization.
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.f";

/// Derives trip duration, enter hour and enter weekday from two timestamp
/// columns in `YYYYMMDDTHHMMSS[.ffffff]` format.
pub struct TimeProcessMapper {
    enter: String,
    leave: String,
    duration: String,
    hour: String,
    weekday: String,
}

impl TimeProcessMapper {
    pub fn new(
        enter: impl Into<String>,
        leave: impl Into<String>,
        duration: impl Into<String>,
        hour: impl Into<String>,
        weekday: impl Into<String>,
    ) -> Self {
        TimeProcessMapper {
            enter: enter.into(),
            leave: leave.into(),
            duration: duration.into(),
            hour: hour.into(),
            weekday: weekday.into(),
        }
    }
}

impl Mapper for TimeProcessMapper {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let enter = parse_timestamp(row.require(&self.enter)?.expect_str(&self.enter)?)?;
        let leave = parse_timestamp(row.require(&self.leave)?.expect_str(&self.leave)?)?;
        row.set(self.duration.clone(), duration_hours(enter, leave));
        row.set(self.hour.clone(), i64::from(enter.hour()));
        row.set(self.weekday.clone(), weekday_name(enter.weekday()));
        Ok(vec![row])
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    // Fractional seconds are optional on the wire; normalize before parsing.
    let normalized = if raw.contains('.') {
        raw.to_owned()
    } else {
        format!("{raw}.000000")
    };
    NaiveDateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT).map_err(|source| {
        Error::Timestamp {
            value: raw.to_owned(),
            source,
        }
    })
}

fn duration_hours(enter: NaiveDateTime, leave: NaiveDateTime) -> f64 {
    let delta = leave.signed_duration_since(enter);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => delta.num_seconds() as f64 / 3600.0,
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// `result = distance / duration`, failing on zero duration.
pub struct SpeedMapper {
    distance: String,
    duration: String,
    result: String,
}

impl SpeedMapper {
    pub fn new(
        distance: impl Into<String>,
        duration: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        SpeedMapper {
            distance: distance.into(),
            duration: duration.into(),
            result: result.into(),
        }
    }
}

impl Mapper for SpeedMapper {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let distance = row.require(&self.distance)?.expect_float(&self.distance)?;
        let duration = row.require(&self.duration)?.expect_float(&self.duration)?;
        if duration == 0.0 {
            return Err(Error::DivisionByZero(self.duration.clone()));
        }
        row.set(self.result.clone(), distance / duration);
        Ok(vec![row])
    }
}
