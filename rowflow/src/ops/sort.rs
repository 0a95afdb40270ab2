//! The buffering sort operator.

use crate::error::Result;
use crate::inputs::Inputs;
use crate::ops::{Operation, RowStream};
use crate::row::{self, Key, Row};

/// Buffers the whole upstream and re-emits it ascending by `keys`.
/// Stable: rows with equal keys keep their input order.
pub struct Sort {
    keys: Vec<String>,
}

impl Sort {
    /// Sort ascending by the tuple of `keys` values.
    pub fn new(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

impl Operation for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn stream<'a>(&'a self, deps: Vec<RowStream<'a>>, _inputs: &Inputs) -> Result<RowStream<'a>> {
        let Ok([input]) = <[RowStream<'a>; 1]>::try_from(deps) else {
            unreachable!("sort takes exactly one dependency");
        };
        Ok(Box::new(SortStream {
            key_fields: &self.keys,
            state: State::Accumulating { input },
        }))
    }
}

enum State<'a> {
    Accumulating { input: RowStream<'a> },
    Emitting { rows: std::vec::IntoIter<Row> },
    Failed,
}

/// Waits for the upstream to finish on the first pull, sorts, then emits.
struct SortStream<'a> {
    key_fields: &'a [String],
    state: State<'a>,
}

fn drain_and_sort(input: &mut RowStream<'_>, key_fields: &[String]) -> Result<Vec<Row>> {
    let mut keyed: Vec<(Key, Row)> = Vec::new();
    for current in input {
        let current = current?;
        let key = row::key_of(&current, key_fields)?;
        keyed.push((key, current));
    }
    keyed.sort_by(|(a, _), (b, _)| row::cmp_keys(a, b));
    Ok(keyed.into_iter().map(|(_, current)| current).collect())
}

impl Iterator for SortStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let State::Accumulating { input } = &mut self.state {
            match drain_and_sort(input, self.key_fields) {
                Ok(rows) => {
                    self.state = State::Emitting {
                        rows: rows.into_iter(),
                    };
                }
                Err(err) => {
                    self.state = State::Failed;
                    return Some(Err(err));
                }
            }
        }
        match &mut self.state {
            State::Emitting { rows } => rows.next().map(Ok),
            State::Failed => None,
            State::Accumulating { .. } => unreachable!(),
        }
    }
}
