//! Source operators: named run-time iterators and line-parsed files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::inputs::Inputs;
use crate::ops::{Operation, RowStream};
use crate::row::Row;

/// Emits the rows of the input binding named `name`.
///
/// The binding's thunk is invoked once per node appearance per run, so a
/// graph referencing the same source twice reads it twice.
pub struct FromIter {
    name: String,
}

impl FromIter {
    /// Source reading from the binding named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Operation for FromIter {
    fn name(&self) -> &'static str {
        "from_iter"
    }

    fn stream<'a>(&'a self, _deps: Vec<RowStream<'a>>, inputs: &Inputs) -> Result<RowStream<'a>> {
        let rows = inputs.open(&self.name)?;
        Ok(Box::new(rows.map(Ok)))
    }
}

/// Reads `path` line by line through a parser, once per instantiation.
pub struct FromFile {
    path: PathBuf,
    parser: Box<dyn Fn(&str) -> Result<Option<Row>>>,
}

impl FromFile {
    /// Source reading `path`; `parser` turns one line into one row, or
    /// `None` to skip the line.
    pub fn new(
        path: impl Into<PathBuf>,
        parser: impl Fn(&str) -> Result<Option<Row>> + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            parser: Box::new(parser),
        }
    }
}

impl Operation for FromFile {
    fn name(&self) -> &'static str {
        "from_file"
    }

    fn stream<'a>(&'a self, _deps: Vec<RowStream<'a>>, _inputs: &Inputs) -> Result<RowStream<'a>> {
        let file = File::open(&self.path).map_err(|source| Error::FileOpen {
            path: self.path.clone(),
            source,
        })?;
        let lines = BufReader::new(file).lines();
        let stream = lines.enumerate().filter_map(move |(index, line)| {
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(Error::Io(err))),
            };
            match (self.parser)(&line) {
                Ok(Some(row)) => Some(Ok(row)),
                Ok(None) => None,
                Err(err) => Some(Err(Error::Parse {
                    path: self.path.clone(),
                    line: index + 1,
                    source: Box::new(err),
                })),
            }
        });
        Ok(Box::new(stream))
    }
}

/// Line parser for one JSON object per line; blank lines are skipped.
pub fn json_line_parser(line: &str) -> Result<Option<Row>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(line).map_err(Error::custom)? {
        Value::Object(row) => Ok(Some(row)),
        other => Err(Error::custom(format!(
            "expected a JSON object per line, got {other}"
        ))),
    }
}
