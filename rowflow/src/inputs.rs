//! Run-time binding of named row sources.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::row::Row;

/// A fresh stream of owned rows handed out by a source thunk.
pub type RowIter = Box<dyn Iterator<Item = Row>>;

/// Maps source names to thunks producing fresh row iterators.
///
/// Every `from_iter` node appearance resolves its thunk once per run, so a
/// thunk must tolerate being called any number of times and hand out
/// equivalent rows each time.
#[derive(Default)]
pub struct Inputs {
    sources: FxHashMap<String, Box<dyn Fn() -> RowIter>>,
}

impl Inputs {
    /// An empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to an arbitrary thunk.
    pub fn with_source(
        mut self,
        name: impl Into<String>,
        thunk: impl Fn() -> RowIter + 'static,
    ) -> Self {
        self.sources.insert(name.into(), Box::new(thunk));
        self
    }

    /// Binds `name` to a fixed set of rows.
    ///
    /// The rows are cloned on every resolution, so downstream in-place
    /// mutation can never reach back into the binding and repeated runs
    /// see identical input.
    pub fn with_rows(self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.with_source(name, move || -> RowIter {
            Box::new(rows.clone().into_iter())
        })
    }

    pub(crate) fn open(&self, name: &str) -> Result<RowIter> {
        match self.sources.get(name) {
            Some(thunk) => Ok(thunk()),
            None => Err(Error::MissingInput {
                name: name.to_owned(),
            }),
        }
    }
}
