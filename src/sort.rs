//! External merge sort over row streams.
//!
//! Sorting runs in two phases. Run generation consumes the input in bounded
//! chunks, sorts each chunk in memory by the key tuple, and spills it as a
//! JSON-lines run into an anonymous temp file. The merge phase drains the
//! runs through a min-heap keyed by `(key tuple, run id)`; the run id breaks
//! ties without ever comparing whole rows. Inputs that fit in a single chunk
//! are yielded straight from memory without touching disk.
//!
//! Anonymous temp files are unlinked at creation, so spill space is
//! reclaimed on completion, on error, and when the consumer drops the
//! stream early.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Seek, Write};
use std::vec;

use tracing::debug;

use crate::config::SortConfig;
use crate::error::{Error, Result};
use crate::operators::RowStream;
use crate::row::Row;
use crate::value::{KeyOrd, ValueClass};

/// Lazy sorting stage: run generation is deferred until the first pull.
pub(crate) struct SortStream {
    keys: Vec<String>,
    config: SortConfig,
    state: State,
}

enum State {
    Pending(Option<RowStream>),
    InMemory(vec::IntoIter<Row>),
    Merging(KWayMerge),
    Done,
}

impl SortStream {
    pub(crate) fn new(keys: Vec<String>, config: SortConfig, upstream: RowStream) -> Self {
        SortStream {
            keys,
            config,
            state: State::Pending(Some(upstream)),
        }
    }

    /// Consume the whole upstream into sorted runs; pick the merge strategy.
    fn generate_runs(&self, upstream: RowStream) -> Result<State> {
        let chunk_size = self.config.chunk_size.max(1);
        let mut classes: Vec<Option<ValueClass>> = vec![None; self.keys.len()];
        let mut chunk: Vec<(KeyOrd, Row)> = Vec::new();
        let mut runs: Vec<File> = Vec::new();

        for item in upstream {
            let row = item?;
            let key = self.decorate(&row, &mut classes)?;
            chunk.push((key, row));
            if chunk.len() >= chunk_size {
                runs.push(self.spill(&mut chunk)?);
            }
        }

        if runs.is_empty() {
            // Single-run fast path: never touches disk.
            chunk.sort_by(|a, b| a.0.cmp(&b.0));
            let rows: Vec<Row> = chunk.into_iter().map(|(_, row)| row).collect();
            return Ok(State::InMemory(rows.into_iter()));
        }

        if !chunk.is_empty() {
            runs.push(self.spill(&mut chunk)?);
        }
        debug!(runs = runs.len(), keys = ?self.keys, "merging spilled runs");
        Ok(State::Merging(KWayMerge::new(runs, self.keys.clone())?))
    }

    /// Extract the sort key, enforcing one value class per key column.
    fn decorate(&self, row: &Row, classes: &mut [Option<ValueClass>]) -> Result<KeyOrd> {
        let mut values = Vec::with_capacity(self.keys.len());
        for (column, slot) in self.keys.iter().zip(classes.iter_mut()) {
            let value = row.require(column)?.clone();
            let class = value.class();
            if class == ValueClass::Null {
                return Err(Error::TypeMismatch {
                    column: column.clone(),
                    expected: "an orderable value",
                    found: "null",
                });
            }
            match slot {
                None => *slot = Some(class),
                Some(existing) if *existing == class => {}
                Some(existing) => {
                    return Err(Error::MixedKeyTypes {
                        column: column.clone(),
                        left: existing.name(),
                        right: class.name(),
                    });
                }
            }
            values.push(value);
        }
        Ok(KeyOrd(values))
    }

    /// Sort one chunk and write it out as a JSON-lines run.
    fn spill(&self, chunk: &mut Vec<(KeyOrd, Row)>) -> Result<File> {
        chunk.sort_by(|a, b| a.0.cmp(&b.0));
        let rows = chunk.len();
        let file = match &self.config.spill_dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        let mut writer = BufWriter::new(file);
        for (_, row) in chunk.drain(..) {
            serde_json::to_writer(&mut writer, &row)?;
            writer.write_all(b"\n")?;
        }
        let mut file = writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        file.rewind()?;
        debug!(rows, "spilled sorted run");
        Ok(file)
    }
}

impl Iterator for SortStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Pending(upstream) => {
                    let Some(upstream) = upstream.take() else {
                        self.state = State::Done;
                        continue;
                    };
                    match self.generate_runs(upstream) {
                        Ok(state) => self.state = state,
                        Err(e) => {
                            self.state = State::Done;
                            return Some(Err(e));
                        }
                    }
                }
                State::InMemory(rows) => {
                    return match rows.next() {
                        Some(row) => Some(Ok(row)),
                        None => {
                            self.state = State::Done;
                            None
                        }
                    };
                }
                State::Merging(merge) => {
                    return match merge.next_row() {
                        Ok(Some(row)) => Some(Ok(row)),
                        Ok(None) => {
                            self.state = State::Done;
                            None
                        }
                        Err(e) => {
                            self.state = State::Done;
                            Some(Err(e))
                        }
                    };
                }
                State::Done => return None,
            }
        }
    }
}

// ============================================================================
// k-way merge
// ============================================================================

struct RunReader {
    lines: Lines<BufReader<File>>,
}

impl RunReader {
    fn next_row(&mut self) -> Result<Option<Row>> {
        match self.lines.next() {
            None => Ok(None),
            Some(line) => {
                let line = line?;
                Ok(Some(serde_json::from_str(&line)?))
            }
        }
    }
}

struct MergeItem {
    key: KeyOrd,
    run: usize,
    row: Row,
}

impl PartialEq for MergeItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeItem {}

impl PartialOrd for MergeItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then(self.run.cmp(&other.run))
    }
}

struct KWayMerge {
    keys: Vec<String>,
    runs: Vec<RunReader>,
    heap: BinaryHeap<Reverse<MergeItem>>,
}

impl KWayMerge {
    fn new(files: Vec<File>, keys: Vec<String>) -> Result<Self> {
        let mut merge = KWayMerge {
            keys,
            runs: files
                .into_iter()
                .map(|file| RunReader {
                    lines: BufReader::new(file).lines(),
                })
                .collect(),
            heap: BinaryHeap::new(),
        };
        for run in 0..merge.runs.len() {
            merge.refill(run)?;
        }
        Ok(merge)
    }

    fn refill(&mut self, run: usize) -> Result<()> {
        if let Some(row) = self.runs[run].next_row()? {
            let key = KeyOrd(row.key_values(&self.keys)?);
            self.heap.push(Reverse(MergeItem { key, run, row }));
        }
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(Reverse(item)) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(item.run)?;
        Ok(Some(item.row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::value::Value;

    fn stream(rows: Vec<Row>) -> RowStream {
        Box::new(rows.into_iter().map(Ok))
    }

    fn sorted(rows: Vec<Row>, keys: &[&str], chunk_size: usize) -> Result<Vec<Row>> {
        let config = SortConfig {
            chunk_size,
            spill_dir: None,
        };
        SortStream::new(
            keys.iter().map(|k| (*k).to_string()).collect(),
            config,
            stream(rows),
        )
        .collect()
    }

    #[test]
    fn test_spilled_merge_matches_in_memory_sort() {
        let rows: Vec<Row> = (0..100).map(|i| row! { "n" => (997 * i) % 100 }).collect();
        let small = sorted(rows.clone(), &["n"], 7).unwrap();
        let large = sorted(rows, &["n"], 1000).unwrap();
        assert_eq!(small, large);
        assert_eq!(small.len(), 100);
        for pair in small.windows(2) {
            assert!(pair[0].get("n").unwrap().compare(pair[1].get("n").unwrap()).unwrap() != Ordering::Greater);
        }
    }

    #[test]
    fn test_sort_is_stable_across_spills() {
        let rows: Vec<Row> = (0..20)
            .map(|i| row! { "k" => i % 2, "seq" => i })
            .collect();
        let out = sorted(rows, &["k"], 3).unwrap();
        let seqs: Vec<i64> = out
            .iter()
            .filter(|r| r.get("k") == Some(&Value::Int(0)))
            .map(|r| r.get("seq").and_then(Value::as_int).unwrap_or(-1))
            .collect();
        let mut expected = seqs.clone();
        expected.sort_unstable();
        assert_eq!(seqs, expected);
    }

    #[test]
    fn test_mixed_key_classes_fail() {
        let rows = vec![row! { "k" => 1 }, row! { "k" => "one" }];
        let err = sorted(rows, &["k"], 10).unwrap_err();
        assert!(matches!(err, Error::MixedKeyTypes { .. }));
    }

    #[test]
    fn test_null_sort_key_fails() {
        let rows = vec![row! { "k" => Value::Null }];
        let err = sorted(rows, &["k"], 10).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_sort_key_fails() {
        let rows = vec![row! { "k" => 1 }, row! { "other" => 2 }];
        let err = sorted(rows, &["k"], 10).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "k"));
    }
}
