//! Graph plans and the execution driver.
//!
//! A [`Graph`] is an immutable plan: a source plus a sequence of stages.
//! Stages live in a persistent singly-linked list, so every combinator
//! returns a new graph that shares its prefix with the receiver — no deep
//! copies, and the original stays valid and reusable.
//!
//! Execution folds over the stage sequence, wrapping the source stream in
//! one iterator adapter per stage. Join stages recursively execute their
//! sub-graph against the same input registry.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::input::{read_file, Inputs, LineParser};
use crate::operators::{
    JoinStream, Joiner, MapStream, Mapper, Reducer, ReduceStream, RowStream,
};
use crate::row::Row;
use crate::sort::SortStream;

/// An immutable, reusable computational graph over row streams.
///
/// ```rust
/// use rowflow::operators::{Count, LowerCase, Split};
/// use rowflow::{row, Graph, Inputs};
///
/// let graph = Graph::from_iter("docs")
///     .map(LowerCase::new("text"))
///     .map(Split::new("text"))
///     .sort(&["text"])
///     .reduce(Count::new("count"), &["text"]);
///
/// let inputs = Inputs::new().with_rows("docs", vec![row! { "text" => "b a B" }]);
/// let rows = graph.run(&inputs).unwrap();
/// assert_eq!(rows, vec![row! { "text" => "a", "count" => 1 },
///                       row! { "text" => "b", "count" => 2 }]);
/// ```
#[derive(Clone)]
pub struct Graph {
    source: Source,
    stages: StageList,
}

type StageList = Option<Arc<StageNode>>;

struct StageNode {
    stage: Stage,
    prev: StageList,
}

#[derive(Clone)]
enum Source {
    Named(String),
    File(PathBuf, LineParser),
}

enum Stage {
    Map(Arc<dyn Mapper>),
    Reduce(Arc<dyn Reducer>, Vec<String>),
    Sort(Vec<String>),
    Join(Arc<dyn Joiner>, Graph, Vec<String>),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Map(_) => "map",
            Stage::Reduce(..) => "reduce",
            Stage::Sort(_) => "sort",
            Stage::Join(..) => "join",
        }
    }
}

impl Graph {
    /// Graph reading rows from the input registered under `name`.
    pub fn from_iter(name: impl Into<String>) -> Self {
        Graph {
            source: Source::Named(name.into()),
            stages: None,
        }
    }

    /// Graph reading rows from a line-oriented file through `parser`.
    pub fn from_file(
        path: impl Into<PathBuf>,
        parser: impl Fn(&str) -> Result<Row> + 'static,
    ) -> Self {
        Graph {
            source: Source::File(path.into(), Arc::new(parser)),
            stages: None,
        }
    }

    fn push(&self, stage: Stage) -> Self {
        Graph {
            source: self.source.clone(),
            stages: Some(Arc::new(StageNode {
                stage,
                prev: self.stages.clone(),
            })),
        }
    }

    /// Extend with a map stage.
    pub fn map(&self, mapper: impl Mapper + 'static) -> Self {
        self.push(Stage::Map(Arc::new(mapper)))
    }

    /// Extend with a grouped reduce over `keys`; the input must arrive
    /// sorted by `keys`.
    pub fn reduce(&self, reducer: impl Reducer + 'static, keys: &[&str]) -> Self {
        self.push(Stage::Reduce(Arc::new(reducer), own(keys)))
    }

    /// Extend with a sort stage, ascending by `keys`.
    pub fn sort(&self, keys: &[&str]) -> Self {
        self.push(Stage::Sort(own(keys)))
    }

    /// Extend with a sort-merge join against `other` on `keys`; both sides
    /// must arrive sorted by `keys`.
    pub fn join(&self, joiner: impl Joiner + 'static, other: &Graph, keys: &[&str]) -> Self {
        self.push(Stage::Join(Arc::new(joiner), other.clone(), own(keys)))
    }

    /// Stages in execution order.
    fn stage_sequence(&self) -> Vec<&Stage> {
        let mut stages = Vec::new();
        let mut node = self.stages.as_deref();
        while let Some(n) = node {
            stages.push(&n.stage);
            node = n.prev.as_deref();
        }
        stages.reverse();
        stages
    }

    /// Execute and collect every output row.
    pub fn run(&self, inputs: &Inputs) -> Result<Vec<Row>> {
        self.run_with(inputs, &Config::default())
    }

    /// [`run`](Self::run) under an explicit configuration.
    pub fn run_with(&self, inputs: &Inputs, config: &Config) -> Result<Vec<Row>> {
        self.gen_run_with(inputs, config)?.collect()
    }

    /// Execute lazily, returning the output stream.
    pub fn gen_run(&self, inputs: &Inputs) -> Result<RowStream> {
        self.gen_run_with(inputs, &Config::default())
    }

    /// [`gen_run`](Self::gen_run) under an explicit configuration.
    pub fn gen_run_with(&self, inputs: &Inputs, config: &Config) -> Result<RowStream> {
        let mut stream = match &self.source {
            Source::Named(name) => inputs.resolve(name)?,
            Source::File(path, parser) => read_file(path, parser)?,
        };
        let stages = self.stage_sequence();
        debug!(stages = stages.len(), "composing pipeline");
        for stage in stages {
            stream = match stage {
                Stage::Map(mapper) => Box::new(MapStream::new(Arc::clone(mapper), stream)),
                Stage::Reduce(reducer, keys) => Box::new(ReduceStream::new(
                    Arc::clone(reducer),
                    keys.clone(),
                    stream,
                )),
                Stage::Sort(keys) => Box::new(SortStream::new(
                    keys.clone(),
                    config.sort.clone(),
                    stream,
                )),
                Stage::Join(joiner, other, keys) => {
                    let right = other.gen_run_with(inputs, config)?;
                    Box::new(JoinStream::new(
                        Arc::clone(joiner),
                        keys.clone(),
                        stream,
                        right,
                    ))
                }
            };
        }
        Ok(stream)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Named(name) => format!("iter({name})"),
            Source::File(path, _) => format!("file({})", path.display()),
        };
        let stages: Vec<&str> = self.stage_sequence().iter().map(|s| s.name()).collect();
        f.debug_struct("Graph")
            .field("source", &source)
            .field("stages", &stages)
            .finish()
    }
}

fn own(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}
