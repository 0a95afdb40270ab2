//! Declarative dataflow engine for tabular row streams.
//!
//! A computation graph is composed out of primitive operators — sources,
//! map, reduce, sort, join — and then executed against named row sources.
//! Each graph node materializes as a lazy pull stream; rows flow from the
//! leaves to the root one at a time, buffering only where an operator
//! demands it (sort, grouping, join). Graphs are immutable and stateless:
//! the same graph can run any number of times, on the same or different
//! inputs, and produce the same output for the same input.
//!
//! ```
//! use rowflow::ops::{Count, LowerCase, Split};
//! use rowflow::{Graph, Inputs, Row};
//! use serde_json::json;
//!
//! let graph = Graph::from_iter("lines")
//!     .map(LowerCase::new("text"))
//!     .map(Split::new("text"))
//!     .sort(&["text"])
//!     .reduce(Count::new("count"), &["text"]);
//!
//! let docs: Vec<Row> = [json!({"text": "to be OR not to be"})]
//!     .iter()
//!     .map(|doc| doc.as_object().unwrap().clone())
//!     .collect();
//! let out = graph.run(&Inputs::new().with_rows("lines", docs)).unwrap();
//!
//! assert_eq!(out.len(), 4);
//! assert_eq!(out[0]["text"], json!("be"));
//! assert_eq!(out[0]["count"], json!(2));
//! ```

pub mod error;
pub mod graph;
pub mod group;
pub mod inputs;
pub mod ops;
pub mod pipelines;
pub mod row;

pub use error::{Error, Result};
pub use graph::Graph;
pub use inputs::{Inputs, RowIter};
pub use row::{Row, Value};
