//! The reduce operator and the built-in reducers.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::group::GroupRuns;
use crate::inputs::Inputs;
use crate::ops::{LazyOnce, Operation, Reducer, RowStream};
use crate::row::{self, OrdValue, Row};

/// Groups the sorted upstream by `keys` and folds each group through a
/// [`Reducer`]. With empty `keys` the whole upstream is one group.
pub struct Reduce {
    reducer: Box<dyn Reducer>,
    keys: Vec<String>,
}

impl Reduce {
    /// Reduce over `reducer`, grouping by `keys`.
    pub fn new(reducer: impl Reducer + 'static, keys: &[&str]) -> Self {
        Self {
            reducer: Box::new(reducer),
            keys: keys.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

impl Operation for Reduce {
    fn name(&self) -> &'static str {
        "reduce"
    }

    fn stream<'a>(&'a self, deps: Vec<RowStream<'a>>, _inputs: &Inputs) -> Result<RowStream<'a>> {
        let Ok([input]) = <[RowStream<'a>; 1]>::try_from(deps) else {
            unreachable!("reduce takes exactly one dependency");
        };
        if self.keys.is_empty() {
            let reducer = &*self.reducer;
            return Ok(Box::new(LazyOnce::new(move || {
                let rows = input.collect::<Result<Vec<_>>>()?;
                reducer.reduce(&[], rows)
            })));
        }
        Ok(Box::new(ReduceStream {
            reducer: &*self.reducer,
            key_fields: &self.keys,
            groups: GroupRuns::new(input, &self.keys),
            pending: Vec::new().into_iter(),
            done: false,
        }))
    }
}

struct ReduceStream<'a> {
    reducer: &'a dyn Reducer,
    key_fields: &'a [String],
    groups: GroupRuns<'a>,
    pending: std::vec::IntoIter<Row>,
    done: bool,
}

impl Iterator for ReduceStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(out) = self.pending.next() {
                return Some(Ok(out));
            }
            if self.done {
                return None;
            }
            match self.groups.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                Some(Ok((_key, rows))) => match self.reducer.reduce(self.key_fields, rows) {
                    Ok(produced) => self.pending = produced.into_iter(),
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                },
            }
        }
    }
}

/// A row carrying just the group's key fields, taken from its first row.
fn key_row(rows: &[Row], key_fields: &[String]) -> Result<Row> {
    let mut out = Row::new();
    if let Some(first) = rows.first() {
        for name in key_fields {
            out.insert(name.clone(), row::field(first, name)?.clone());
        }
    }
    Ok(out)
}

/// Keeps only the first row of each group.
pub struct First;

impl Reducer for First {
    fn reduce(&self, _key_fields: &[String], rows: Vec<Row>) -> Result<Vec<Row>> {
        Ok(rows.into_iter().take(1).collect())
    }
}

/// Emits one row per group: the key fields plus the group size.
pub struct Count {
    column: String,
}

impl Count {
    /// Count rows into `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Count {
    fn reduce(&self, key_fields: &[String], rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut out = key_row(&rows, key_fields)?;
        out.insert(self.column.clone(), Value::from(rows.len()));
        Ok(vec![out])
    }
}

/// Emits one row per group: the key fields plus the sum of `column`.
/// The sum stays integral until a float value appears.
pub struct Sum {
    column: String,
}

impl Sum {
    /// Sum `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Sum {
    fn reduce(&self, key_fields: &[String], rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut sum_int = 0i64;
        let mut sum_float = 0f64;
        let mut is_float = false;
        for current in &rows {
            let value = row::field(current, &self.column)?;
            if let Some(v) = value.as_i64() {
                if is_float {
                    sum_float += v as f64;
                } else {
                    sum_int += v;
                }
            } else {
                let v = value.as_f64().ok_or_else(|| Error::FieldType {
                    field: self.column.clone(),
                    expected: "number",
                })?;
                if !is_float {
                    is_float = true;
                    sum_float = sum_int as f64;
                }
                sum_float += v;
            }
        }
        let total = if is_float {
            Value::from(sum_float)
        } else {
            Value::from(sum_int)
        };
        let mut out = key_row(&rows, key_fields)?;
        out.insert(self.column.clone(), total);
        Ok(vec![out])
    }
}

/// Emits one row per group: the key fields plus the arithmetic mean of
/// `column`.
pub struct Mean {
    column: String,
}

impl Mean {
    /// Average `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Mean {
    fn reduce(&self, key_fields: &[String], rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut sum = 0f64;
        for current in &rows {
            sum += row::field_f64(current, &self.column)?;
        }
        let mut out = key_row(&rows, key_fields)?;
        out.insert(self.column.clone(), Value::from(sum / rows.len() as f64));
        Ok(vec![out])
    }
}

/// Emits, per distinct value of `words_column` in the group, the key
/// fields, the value, and its share of the group size, in value order.
/// The result column is `"tf"` unless overridden.
pub struct Tf {
    words_column: String,
    result_column: String,
}

impl Tf {
    /// Frequency of each distinct `words_column` value within the group.
    pub fn new(words_column: impl Into<String>) -> Self {
        Self {
            words_column: words_column.into(),
            result_column: "tf".to_owned(),
        }
    }

    /// Overrides the result column name.
    pub fn with_result_column(mut self, name: impl Into<String>) -> Self {
        self.result_column = name.into();
        self
    }
}

impl Reducer for Tf {
    fn reduce(&self, key_fields: &[String], rows: Vec<Row>) -> Result<Vec<Row>> {
        let template = key_row(&rows, key_fields)?;
        let total = rows.len() as f64;
        let mut occurrences: BTreeMap<OrdValue, usize> = BTreeMap::new();
        for current in &rows {
            let word = row::field(current, &self.words_column)?.clone();
            *occurrences.entry(OrdValue(word)).or_insert(0) += 1;
        }
        Ok(occurrences
            .into_iter()
            .map(|(word, count)| {
                let mut out = template.clone();
                out.insert(self.words_column.clone(), word.0);
                out.insert(self.result_column.clone(), Value::from(count as f64 / total));
                out
            })
            .collect())
    }
}

/// Keeps the `n` rows with the largest `column` values; ties keep the
/// earliest rows.
pub struct TopN {
    column: String,
    n: usize,
}

impl TopN {
    /// Top `n` rows by `column`.
    pub fn new(column: impl Into<String>, n: usize) -> Self {
        Self {
            column: column.into(),
            n,
        }
    }
}

impl Reducer for TopN {
    fn reduce(&self, _key_fields: &[String], rows: Vec<Row>) -> Result<Vec<Row>> {
        let keyed = rows
            .into_iter()
            .map(|current| {
                row::field(&current, &self.column)
                    .cloned()
                    .map(|value| (value, current))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(keyed
            .into_iter()
            .sorted_by(|(a, _), (b, _)| row::cmp_values(b, a))
            .take(self.n)
            .map(|(_, current)| current)
            .collect())
    }
}

/// Collects the group's `column` values; if the predicate accepts them,
/// emits the group's last row, otherwise nothing.
pub struct FilterGroup {
    predicate: Box<dyn Fn(&[Value]) -> bool>,
    column: String,
}

impl FilterGroup {
    /// Keep groups whose `column` values satisfy `predicate`.
    pub fn new(predicate: impl Fn(&[Value]) -> bool + 'static, column: impl Into<String>) -> Self {
        Self {
            predicate: Box::new(predicate),
            column: column.into(),
        }
    }
}

impl Reducer for FilterGroup {
    fn reduce(&self, _key_fields: &[String], mut rows: Vec<Row>) -> Result<Vec<Row>> {
        let values = rows
            .iter()
            .map(|current| row::field(current, &self.column).cloned())
            .collect::<Result<Vec<_>>>()?;
        if (self.predicate)(&values) {
            Ok(rows.pop().into_iter().collect())
        } else {
            Ok(Vec::new())
        }
    }
}
