//! Grouping of sorted row streams into runs of equal keys.

use std::cmp::Ordering;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::ops::RowStream;
use crate::row::{self, Key, Row};

/// Iterator over maximal runs of adjacent rows sharing a key.
///
/// Requires the input to already be ascending by `fields`: every run's key
/// must compare strictly greater than the previous run's, otherwise the
/// next pull yields [`Error::NotSorted`]. This catches both descending
/// transitions and a key reappearing after an intervening one. Rows within
/// a run keep their input order; empty input yields no runs. Fuses after
/// the first error.
pub struct GroupRuns<'a> {
    input: RowStream<'a>,
    fields: &'a [String],
    lookahead: Option<(Key, Row)>,
    last_key: Option<Key>,
    done: bool,
}

impl<'a> GroupRuns<'a> {
    /// Wraps `input`, grouping by the tuple of `fields` values.
    pub fn new(input: RowStream<'a>, fields: &'a [String]) -> Self {
        Self {
            input,
            fields,
            lookahead: None,
            last_key: None,
            done: false,
        }
    }

    fn pull(&mut self) -> Result<Option<(Key, Row)>> {
        if let Some(pair) = self.lookahead.take() {
            return Ok(Some(pair));
        }
        match self.input.next() {
            None => Ok(None),
            Some(row) => {
                let row = row?;
                let key = row::key_of(&row, self.fields)?;
                Ok(Some((key, row)))
            }
        }
    }

    fn not_sorted(&self, previous: &Key, current: &Key) -> Error {
        Error::NotSorted {
            fields: self.fields.iter().join(", "),
            previous: previous.iter().join(", "),
            current: current.iter().join(", "),
        }
    }

    fn step(&mut self) -> Result<Option<(Key, Vec<Row>)>> {
        let Some((key, first)) = self.pull()? else {
            return Ok(None);
        };
        if let Some(last) = &self.last_key {
            if row::cmp_keys(last, &key) != Ordering::Less {
                return Err(self.not_sorted(last, &key));
            }
        }
        let mut rows = vec![first];
        while let Some((next_key, next_row)) = self.pull()? {
            if row::cmp_keys(&next_key, &key) == Ordering::Equal {
                rows.push(next_row);
            } else {
                self.lookahead = Some((next_key, next_row));
                break;
            }
        }
        self.last_key = Some(key.clone());
        Ok(Some((key, rows)))
    }
}

impl Iterator for GroupRuns<'_> {
    type Item = Result<(Key, Vec<Row>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(group)) => Some(Ok(group)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
