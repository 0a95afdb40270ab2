//! Streaming operators: sources, map, reduce, sort, and join.
//!
//! Pull-based operator helpers over boxed row iterators. An operator is a
//! stateless value; [`Operation::stream`] wires it to its dependencies'
//! streams and returns a fresh lazy stream, so the same operator can be
//! executed any number of times. All per-execution state (buffers,
//! cursors) lives inside the returned iterator.

mod join;
mod map;
mod reduce;
mod sort;
mod source;

pub use join::*;
pub use map::*;
pub use reduce::*;
pub use sort::*;
pub use source::*;

use crate::error::Result;
use crate::inputs::Inputs;
use crate::row::Row;

/// A finite, forward-only, single-pass lazy stream of rows.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// A graph operator: consumes zero or more upstream streams, produces one.
pub trait Operation {
    /// Short operator name for diagnostics.
    fn name(&self) -> &'static str;

    /// Instantiates a fresh lazy stream wired to `deps`.
    ///
    /// `inputs` is only consulted by source operators.
    fn stream<'a>(&'a self, deps: Vec<RowStream<'a>>, inputs: &Inputs) -> Result<RowStream<'a>>;
}

/// Per-row transformer; may fan out to zero, one, or many rows.
pub trait Mapper {
    /// Produces the rows to emit in place of `row`.
    fn map(&self, row: Row) -> Result<Vec<Row>>;
}

/// Per-group aggregator.
///
/// `key_fields` names the grouping columns (empty for a whole-stream
/// group); `rows` is one group in input order, never empty unless the
/// whole stream was.
pub trait Reducer {
    /// Produces the rows to emit for one group.
    fn reduce(&self, key_fields: &[String], rows: Vec<Row>) -> Result<Vec<Row>>;
}

/// Combines one matched pair of key groups from the two sides of a join.
/// Either side may be empty when its stream has no rows for the key.
pub trait Joiner {
    /// Produces the combined rows for one pair of groups.
    fn join(&self, key_fields: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>>;
}

/// Stream whose rows come from a single deferred computation, run on the
/// first pull. Whole-stream reduce and join use this so that their
/// upstreams stay untouched until the consumer actually asks for data.
pub(crate) struct LazyOnce<'a> {
    thunk: Option<Box<dyn FnOnce() -> Result<Vec<Row>> + 'a>>,
    rows: std::vec::IntoIter<Row>,
    failed: bool,
}

impl<'a> LazyOnce<'a> {
    pub(crate) fn new(thunk: impl FnOnce() -> Result<Vec<Row>> + 'a) -> Self {
        Self {
            thunk: Some(Box::new(thunk)),
            rows: Vec::new().into_iter(),
            failed: false,
        }
    }
}

impl Iterator for LazyOnce<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(thunk) = self.thunk.take() {
            match thunk() {
                Ok(rows) => self.rows = rows.into_iter(),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
        self.rows.next().map(Ok)
    }
}
