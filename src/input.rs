//! Named input sources and file parsing.
//!
//! A graph's primary input is either a name resolved against an [`Inputs`]
//! registry at run time, or a line-oriented file read through a
//! caller-supplied parser. Producers must hand back a fresh stream on every
//! call: the engine invokes each one once per graph traversal, including
//! once per join sub-graph.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::operators::RowStream;
use crate::row::Row;

/// Zero-argument factory producing a fresh row stream per call.
pub type Producer = Box<dyn Fn() -> RowStream>;

/// Parser from one input line to a row.
pub type LineParser = Arc<dyn Fn(&str) -> Result<Row>>;

/// Registry of named row producers, passed to [`Graph::run`](crate::Graph::run).
#[derive(Default)]
pub struct Inputs {
    producers: HashMap<String, Producer>,
}

impl Inputs {
    pub fn new() -> Self {
        Inputs::default()
    }

    /// Register a producer under `name`. The producer must return a fresh
    /// stream each time it is called.
    pub fn with_producer(
        mut self,
        name: impl Into<String>,
        producer: impl Fn() -> RowStream + 'static,
    ) -> Self {
        self.producers.insert(name.into(), Box::new(producer));
        self
    }

    /// Register a fixed set of rows; every traversal observes a fresh copy.
    pub fn with_rows(self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.with_producer(name, move || {
            Box::new(rows.clone().into_iter().map(Ok))
        })
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<RowStream> {
        match self.producers.get(name) {
            Some(producer) => Ok(producer()),
            None => Err(Error::UnknownInput(name.to_string())),
        }
    }
}

/// Parse one JSON object line into a row.
///
/// The bundled parser for line-oriented files of JSON records:
///
/// ```rust
/// use rowflow::{parse_json_line, Value};
///
/// let row = parse_json_line(r#"{"doc_id": 1, "text": "hello"}"#).unwrap();
/// assert_eq!(row.get("doc_id"), Some(&Value::Int(1)));
/// ```
pub fn parse_json_line(line: &str) -> Result<Row> {
    Ok(serde_json::from_str(line)?)
}

/// Open a line-oriented file and lazily parse each line into a row.
pub(crate) fn read_file(path: &Path, parser: &LineParser) -> Result<RowStream> {
    let file = File::open(path).map_err(|source| Error::InputFile {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let parser = Arc::clone(parser);
    Ok(Box::new(reader.lines().map(move |line| {
        let line = line?;
        parser(&line)
    })))
}
