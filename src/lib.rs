//! # Rowflow
//!
//! A library for building and executing computational graphs over streams
//! of structured records ("rows"): a declarative DSL for batch table
//! processing in the MapReduce style. Callers compose `map`, `reduce`,
//! `sort` and `join` stages into an immutable graph, then run it against
//! one or more named row sources.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Named producers / files
//!     ↓
//! [Source resolution]           → fresh row stream per traversal
//!     ↓
//! [Map]                         → one-to-many transform per row
//!     ↓
//! [Sort]                        → external merge sort, bounded memory
//!     ↓
//! [Reduce]                      → grouped fold over sorted runs
//!     ↓
//! [Join]                        → sort-merge co-grouping with a sub-graph
//!     ↓
//! Output rows (lazy, pull-driven)
//! ```
//!
//! Execution is single-threaded and pull-based: every stage is an iterator
//! adapter that produces rows on demand, and dropping the output stream
//! cancels all upstream work, releasing spill files and open inputs.
//!
//! ## Usage
//!
//! ```rust
//! use rowflow::graphs::word_count_graph;
//! use rowflow::{row, Inputs};
//!
//! let graph = word_count_graph("docs", "text", "count");
//! let inputs = Inputs::new().with_rows(
//!     "docs",
//!     vec![
//!         row! { "doc_id" => 1, "text" => "Hello, world!" },
//!         row! { "doc_id" => 2, "text" => "hello hello" },
//!     ],
//! );
//!
//! let rows = graph.run(&inputs)?;
//! assert_eq!(
//!     rows,
//!     vec![
//!         row! { "text" => "world", "count" => 1 },
//!         row! { "text" => "hello", "count" => 3 },
//!     ],
//! );
//! # Ok::<(), rowflow::Error>(())
//! ```
//!
//! Graphs are values: every combinator returns a new graph sharing its
//! stage prefix with the receiver, so plans can be extended in several
//! directions and re-run any number of times.
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `graph` | Immutable plans and the execution driver |
//! | `operators` | Mapper/Reducer/Joiner seams, stage drivers, built-ins |
//! | `value` | Tagged value sum with class-aware comparison |
//! | `row` | Column → value records |
//! | `input` | Named producers, file sources, bundled JSON parser |
//! | `config` | Execution configuration (figment: file + env) |
//! | `graphs` | Prebuilt graphs: word count, TF-IDF, PMI, average speed |
//! | `error` | One error enum for the whole engine |

pub mod config;
pub mod error;
pub mod graph;
pub mod graphs;
pub mod input;
pub mod operators;
pub mod row;
mod sort;
pub mod value;

pub use config::{Config, SortConfig};
pub use error::{Error, Result};
pub use graph::Graph;
pub use input::{parse_json_line, Inputs, LineParser, Producer};
pub use operators::{Joiner, Mapper, Reducer, RowStream};
pub use row::Row;
pub use value::Value;
