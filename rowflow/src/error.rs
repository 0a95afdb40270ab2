//! Failures surfaced by [`Graph::run`](crate::Graph::run).

use std::io;
use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any failure raised while wiring or draining a computation graph.
///
/// No operator recovers locally: the first error ends its stream and
/// propagates to the caller of `run`.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The run was not given a source binding the graph references.
    #[error("no input source named {name:?} was bound for this run")]
    MissingInput {
        /// The `from_iter` source name.
        name: String,
    },

    /// A row lacked a field named by a key tuple or an operator.
    #[error("row is missing field {field:?}")]
    MissingField {
        /// The absent field name.
        field: String,
    },

    /// A field held a value of the wrong type for the operator reading it.
    #[error("field {field:?} does not hold a {expected}")]
    FieldType {
        /// The offending field name.
        field: String,
        /// What the operator needed the value to be.
        expected: &'static str,
    },

    /// Rows reaching a grouping operator were not ascending by its keys.
    #[error("rows are not sorted by [{fields}]: key ({current}) appeared after ({previous})")]
    NotSorted {
        /// The grouping columns, comma separated.
        fields: String,
        /// The greatest key seen so far.
        previous: String,
        /// The out-of-order key.
        current: String,
    },

    /// A file source could not be opened.
    #[error("failed to open {path:?}")]
    FileOpen {
        /// Path of the file source.
        path: PathBuf,
        /// The underlying filesystem error.
        source: io::Error,
    },

    /// An i/o failure while reading rows.
    #[error("i/o failure while reading rows")]
    Io(#[from] io::Error),

    /// A line of a file source did not parse into a row.
    #[error("failed to parse {path:?} line {line}")]
    Parse {
        /// Path of the file source.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The parser's error.
        source: Box<Error>,
    },

    /// An error raised by a user-supplied mapper, reducer, joiner, or
    /// parser, propagated unchanged.
    #[error("{0}")]
    Custom(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a user-side error so it propagates through `run` as-is.
    pub fn custom(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Custom(err.into())
    }
}
