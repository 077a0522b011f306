//! # Operators
//!
//! The three operator seams of a graph — [`Mapper`], [`Reducer`], [`Joiner`] —
//! and the stage drivers that apply them to row streams.
//!
//! Drivers are iterator adapters over `Result<Row>` items: each pulls from
//! its upstream on demand, applies the operator, and fuses after the first
//! error. Reduce buffers one group at a time; Join co-groups both inputs and
//! presents one cell (left group, right group) per key value.

pub mod joiners;
pub mod mappers;
pub mod reducers;

pub use joiners::{InnerJoiner, LeftJoiner, OuterJoiner, RightJoiner};
pub use mappers::{
    Filter, FilterPunctuation, HaversineMapper, Identity, LowerCase, PmiMapper, Product, Project,
    SpeedMapper, Split, TfIdfMapper, TimeProcessMapper,
};
pub use reducers::{Count, FirstReducer, MultiSum, Sum, TermFrequency, TopN};

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::{compare_keys, Value};

/// A finite, lazy, single-pass stream of rows.
///
/// Streams may only be consumed once; re-running a graph materializes fresh
/// streams from its inputs.
pub type RowStream = Box<dyn Iterator<Item = Result<Row>>>;

/// One-to-many transform applied per row.
pub trait Mapper {
    /// Transform one row into zero or more rows, preserving emission order.
    fn map(&self, row: Row) -> Result<Vec<Row>>;
}

/// Grouped fold over runs of rows sharing the key columns.
pub trait Reducer {
    /// Fold one group. `group` is a maximal contiguous run of rows whose
    /// `keys` columns hold equal values; it is never empty.
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>>;
}

/// Combines one sort-merge join cell.
pub trait Joiner {
    /// Combine the left and right groups for a single key value. Either
    /// side is empty when the key is unmatched on that side.
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>>;
}

// ============================================================================
// Map driver
// ============================================================================

pub(crate) struct MapStream {
    mapper: Arc<dyn Mapper>,
    upstream: RowStream,
    pending: VecDeque<Row>,
    done: bool,
}

impl MapStream {
    pub(crate) fn new(mapper: Arc<dyn Mapper>, upstream: RowStream) -> Self {
        MapStream {
            mapper,
            upstream,
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl Iterator for MapStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.upstream.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(row)) => match self.mapper.map(row) {
                    Ok(rows) => self.pending.extend(rows),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
            }
        }
    }
}

// ============================================================================
// Reduce driver
// ============================================================================

pub(crate) struct ReduceStream {
    reducer: Arc<dyn Reducer>,
    keys: Vec<String>,
    upstream: RowStream,
    pending: VecDeque<Row>,
    group: Vec<Row>,
    group_key: Option<Vec<Value>>,
    done: bool,
}

impl ReduceStream {
    pub(crate) fn new(reducer: Arc<dyn Reducer>, keys: Vec<String>, upstream: RowStream) -> Self {
        ReduceStream {
            reducer,
            keys,
            upstream,
            pending: VecDeque::new(),
            group: Vec::new(),
            group_key: None,
            done: false,
        }
    }

    fn flush(&mut self) -> Result<()> {
        if !self.group.is_empty() {
            let emitted = self.reducer.reduce(&self.keys, &self.group)?;
            self.pending.extend(emitted);
            self.group.clear();
        }
        Ok(())
    }
}

impl Iterator for ReduceStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.upstream.next() {
                None => {
                    self.done = true;
                    if let Err(e) = self.flush() {
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(row)) => {
                    let key = match row.key_values(&self.keys) {
                        Ok(key) => key,
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    };
                    let changed = match &self.group_key {
                        Some(current) => *current != key,
                        None => false,
                    };
                    if changed {
                        // Sorted input never steps a key downwards; a
                        // descending step means the precondition was violated.
                        if cfg!(debug_assertions) {
                            if let Some(current) = &self.group_key {
                                match compare_keys(&key, current) {
                                    Ok(Ordering::Less) => {
                                        self.done = true;
                                        return Some(Err(Error::UnsortedInput {
                                            stage: "reduce",
                                            keys: self.keys.clone(),
                                        }));
                                    }
                                    Ok(_) => {}
                                    Err(e) => {
                                        self.done = true;
                                        return Some(Err(e));
                                    }
                                }
                            }
                        }
                        if let Err(e) = self.flush() {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                    self.group_key = Some(key);
                    self.group.push(row);
                }
            }
        }
    }
}

// ============================================================================
// Join driver
// ============================================================================

/// Groups a key-sorted stream into (key, rows) cells, one group at a time.
pub(crate) struct GroupedRows {
    upstream: RowStream,
    keys: Vec<String>,
    lookahead: Option<(Vec<Value>, Row)>,
    last_key: Option<Vec<Value>>,
    done: bool,
}

impl GroupedRows {
    fn new(keys: Vec<String>, upstream: RowStream) -> Self {
        GroupedRows {
            upstream,
            keys,
            lookahead: None,
            last_key: None,
            done: false,
        }
    }

    /// Pull the next maximal run of key-equal rows.
    fn next_group(&mut self) -> Result<Option<(Vec<Value>, Vec<Row>)>> {
        let (key, first) = match self.lookahead.take() {
            Some(seed) => seed,
            None => {
                if self.done {
                    return Ok(None);
                }
                match self.upstream.next() {
                    None => {
                        self.done = true;
                        return Ok(None);
                    }
                    Some(Err(e)) => {
                        self.done = true;
                        return Err(e);
                    }
                    Some(Ok(row)) => {
                        let key = row.key_values(&self.keys)?;
                        (key, row)
                    }
                }
            }
        };
        if cfg!(debug_assertions) {
            if let Some(prev) = &self.last_key {
                if compare_keys(&key, prev)? == Ordering::Less {
                    self.done = true;
                    return Err(Error::UnsortedInput {
                        stage: "join",
                        keys: self.keys.clone(),
                    });
                }
            }
        }
        let mut group = vec![first];
        loop {
            match self.upstream.next() {
                None => {
                    self.done = true;
                    break;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Err(e);
                }
                Some(Ok(row)) => {
                    let row_key = row.key_values(&self.keys)?;
                    if row_key == key {
                        group.push(row);
                    } else {
                        self.lookahead = Some((row_key, row));
                        break;
                    }
                }
            }
        }
        self.last_key = Some(key.clone());
        Ok(Some((key, group)))
    }
}

enum Advance {
    Left,
    Right,
    Both,
}

/// Sort-merge join over two key-sorted streams.
///
/// Buffers one group per side at a time; the right stream is never
/// materialized beyond the group of the current cell.
pub(crate) struct JoinStream {
    joiner: Arc<dyn Joiner>,
    keys: Vec<String>,
    left: GroupedRows,
    right: GroupedRows,
    left_cell: Option<(Vec<Value>, Vec<Row>)>,
    right_cell: Option<(Vec<Value>, Vec<Row>)>,
    pending: VecDeque<Row>,
    started: bool,
    done: bool,
}

impl JoinStream {
    pub(crate) fn new(
        joiner: Arc<dyn Joiner>,
        keys: Vec<String>,
        left: RowStream,
        right: RowStream,
    ) -> Self {
        JoinStream {
            joiner,
            left: GroupedRows::new(keys.clone(), left),
            right: GroupedRows::new(keys.clone(), right),
            keys,
            left_cell: None,
            right_cell: None,
            pending: VecDeque::new(),
            started: false,
            done: false,
        }
    }

    fn emit(&mut self, left: &[Row], right: &[Row]) -> Result<()> {
        let rows = self.joiner.join(&self.keys, left, right)?;
        self.pending.extend(rows);
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        if !self.started {
            self.started = true;
            self.left_cell = self.left.next_group()?;
            self.right_cell = self.right.next_group()?;
        }
        let advance = match (&self.left_cell, &self.right_cell) {
            (None, None) => {
                self.done = true;
                return Ok(());
            }
            (Some(_), None) => Advance::Left,
            (None, Some(_)) => Advance::Right,
            (Some((lk, _)), Some((rk, _))) => match compare_keys(lk, rk)? {
                Ordering::Less => Advance::Left,
                Ordering::Greater => Advance::Right,
                Ordering::Equal => Advance::Both,
            },
        };
        match advance {
            Advance::Left => {
                if let Some((_, group)) = self.left_cell.take() {
                    self.emit(&group, &[])?;
                }
                self.left_cell = self.left.next_group()?;
            }
            Advance::Right => {
                if let Some((_, group)) = self.right_cell.take() {
                    self.emit(&[], &group)?;
                }
                self.right_cell = self.right.next_group()?;
            }
            Advance::Both => {
                let left_cell = self.left_cell.take();
                let right_cell = self.right_cell.take();
                if let (Some((_, lg)), Some((_, rg))) = (left_cell, right_cell) {
                    self.emit(&lg, &rg)?;
                }
                self.left_cell = self.left.next_group()?;
                self.right_cell = self.right.next_group()?;
            }
        }
        Ok(())
    }
}

impl Iterator for JoinStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.step() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
