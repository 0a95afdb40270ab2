//! The map operator and the built-in mappers.

use serde_json::Value;

use crate::error::Result;
use crate::inputs::Inputs;
use crate::ops::{Mapper, Operation, RowStream};
use crate::row::{self, Row};

/// Applies a [`Mapper`] to every upstream row, emitting all produced rows.
pub struct Map {
    mapper: Box<dyn Mapper>,
}

impl Map {
    /// Map over `mapper`.
    pub fn new(mapper: impl Mapper + 'static) -> Self {
        Self {
            mapper: Box::new(mapper),
        }
    }
}

impl Operation for Map {
    fn name(&self) -> &'static str {
        "map"
    }

    fn stream<'a>(&'a self, deps: Vec<RowStream<'a>>, _inputs: &Inputs) -> Result<RowStream<'a>> {
        let Ok([input]) = <[RowStream<'a>; 1]>::try_from(deps) else {
            unreachable!("map takes exactly one dependency");
        };
        Ok(Box::new(MapStream {
            mapper: &*self.mapper,
            input,
            pending: Vec::new().into_iter(),
            done: false,
        }))
    }
}

/// Fan-out cursor: the rows produced for the current input row drain
/// before the next upstream row is pulled.
struct MapStream<'a> {
    mapper: &'a dyn Mapper,
    input: RowStream<'a>,
    pending: std::vec::IntoIter<Row>,
    done: bool,
}

impl Iterator for MapStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(out) = self.pending.next() {
                return Some(Ok(out));
            }
            if self.done {
                return None;
            }
            match self.input.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                Some(Ok(next_row)) => match self.mapper.map(next_row) {
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

/// Yields every row unchanged.
pub struct Identity;

impl Mapper for Identity {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        Ok(vec![row])
    }
}

/// Strips ASCII punctuation from `column`.
pub struct FilterPunctuation {
    column: String,
}

impl FilterPunctuation {
    /// Strip punctuation out of `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for FilterPunctuation {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let text = row::field_str(&row, &self.column)?;
        let stripped: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        row.insert(self.column.clone(), Value::String(stripped));
        Ok(vec![row])
    }
}

/// Lowercases `column`.
pub struct LowerCase {
    column: String,
}

impl LowerCase {
    /// Lowercase `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for LowerCase {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let lowered = row::field_str(&row, &self.column)?.to_lowercase();
        row.insert(self.column.clone(), Value::String(lowered));
        Ok(vec![row])
    }
}

/// Fans one row out to one row per token of `column`, all other fields
/// preserved.
pub struct Split {
    column: String,
    separator: Option<String>,
}

impl Split {
    /// Split `column` on runs of whitespace, dropping empty tokens.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            separator: None,
        }
    }

    /// Split `column` on an explicit separator, keeping empty tokens.
    pub fn with_separator(column: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            separator: Some(separator.into()),
        }
    }
}

impl Mapper for Split {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        let text = row::field_str(&row, &self.column)?;
        let tokens: Vec<String> = match &self.separator {
            None => text.split_whitespace().map(str::to_owned).collect(),
            Some(sep) => text.split(sep.as_str()).map(str::to_owned).collect(),
        };
        Ok(tokens
            .into_iter()
            .map(|token| {
                let mut out = row.clone();
                out.insert(self.column.clone(), Value::String(token));
                out
            })
            .collect())
    }
}

/// Keeps only the listed columns.
pub struct Project {
    columns: Vec<String>,
}

impl Project {
    /// Project onto `columns`.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

impl Mapper for Project {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        let mut out = Row::new();
        for column in &self.columns {
            out.insert(column.clone(), row::field(&row, column)?.clone());
        }
        Ok(vec![out])
    }
}

/// Keeps only rows satisfying the predicate.
pub struct Filter {
    predicate: Box<dyn Fn(&Row) -> bool>,
}

impl Filter {
    /// Keep rows for which `predicate` returns true.
    pub fn new(predicate: impl Fn(&Row) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl Mapper for Filter {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        if (self.predicate)(&row) {
            Ok(vec![row])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Writes `function(columns...)` into `result_column`.
pub struct Apply {
    function: Box<dyn Fn(&[Value]) -> Value>,
    columns: Vec<String>,
    result_column: String,
}

impl Apply {
    /// Apply `function` to the values of `columns`, storing the result in
    /// `result_column`.
    pub fn new(
        function: impl Fn(&[Value]) -> Value + 'static,
        columns: &[&str],
        result_column: impl Into<String>,
    ) -> Self {
        Self {
            function: Box::new(function),
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for Apply {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let args = self
            .columns
            .iter()
            .map(|column| row::field(&row, column).cloned())
            .collect::<Result<Vec<_>>>()?;
        row.insert(self.result_column.clone(), (self.function)(&args));
        Ok(vec![row])
    }
}

/// Writes `ln(total / term_occurrences)` into the result column
/// (`"idf"` unless overridden).
pub struct Idf {
    total_column: String,
    term_occ_column: String,
    result_column: String,
}

impl Idf {
    /// Inverse document frequency from a total-documents column and a
    /// documents-containing-term column.
    pub fn new(total_column: impl Into<String>, term_occ_column: impl Into<String>) -> Self {
        Self {
            total_column: total_column.into(),
            term_occ_column: term_occ_column.into(),
            result_column: "idf".to_owned(),
        }
    }

    /// Overrides the result column name.
    pub fn with_result_column(mut self, name: impl Into<String>) -> Self {
        self.result_column = name.into();
        self
    }
}

impl Mapper for Idf {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let total = row::field_f64(&row, &self.total_column)?;
        let occurrences = row::field_f64(&row, &self.term_occ_column)?;
        row.insert(
            self.result_column.clone(),
            Value::from((total / occurrences).ln()),
        );
        Ok(vec![row])
    }
}

/// Writes `tf * idf` into the result column (`"tf_idf"` unless
/// overridden).
pub struct TfIdf {
    tf_column: String,
    idf_column: String,
    result_column: String,
}

impl TfIdf {
    /// Product of the `"tf"` and `"idf"` columns.
    pub fn new() -> Self {
        Self {
            tf_column: "tf".to_owned(),
            idf_column: "idf".to_owned(),
            result_column: "tf_idf".to_owned(),
        }
    }

    /// Overrides the factor column names.
    pub fn with_columns(mut self, tf_column: impl Into<String>, idf_column: impl Into<String>) -> Self {
        self.tf_column = tf_column.into();
        self.idf_column = idf_column.into();
        self
    }

    /// Overrides the result column name.
    pub fn with_result_column(mut self, name: impl Into<String>) -> Self {
        self.result_column = name.into();
        self
    }
}

impl Default for TfIdf {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for TfIdf {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let tf = row::field_f64(&row, &self.tf_column)?;
        let idf = row::field_f64(&row, &self.idf_column)?;
        row.insert(self.result_column.clone(), Value::from(tf * idf));
        Ok(vec![row])
    }
}
