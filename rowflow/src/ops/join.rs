//! The sort-merge join operator and the joiner strategies.

use std::cmp::Ordering;

use itertools::Itertools;

use crate::error::Result;
use crate::group::GroupRuns;
use crate::inputs::Inputs;
use crate::ops::{Joiner, LazyOnce, Operation, RowStream};
use crate::row::{self, Key, Row};

/// Sort-merge join of two upstreams already ascending by `keys`.
///
/// Each matched pair of key groups — or an unmatched group paired with an
/// empty one — is handed to the [`Joiner`]. With empty `keys` each side is
/// a single whole-stream group. Sortedness of both sides is enforced by
/// the grouping pass.
pub struct Join {
    joiner: Box<dyn Joiner>,
    keys: Vec<String>,
}

impl Join {
    /// Join on the tuple of `keys` values with the given strategy.
    pub fn new(joiner: impl Joiner + 'static, keys: &[&str]) -> Self {
        Self {
            joiner: Box::new(joiner),
            keys: keys.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

impl Operation for Join {
    fn name(&self) -> &'static str {
        "join"
    }

    fn stream<'a>(&'a self, deps: Vec<RowStream<'a>>, _inputs: &Inputs) -> Result<RowStream<'a>> {
        let Some((left, right)) = deps.into_iter().collect_tuple() else {
            unreachable!("join takes exactly two dependencies");
        };
        if self.keys.is_empty() {
            let joiner = &*self.joiner;
            return Ok(Box::new(LazyOnce::new(move || {
                let left = left.collect::<Result<Vec<_>>>()?;
                let right = right.collect::<Result<Vec<_>>>()?;
                joiner.join(&[], left, right)
            })));
        }
        Ok(Box::new(MergeJoin {
            joiner: &*self.joiner,
            key_fields: &self.keys,
            left: GroupRuns::new(left, &self.keys),
            right: GroupRuns::new(right, &self.keys),
            left_group: None,
            right_group: None,
            primed: false,
            pending: Vec::new().into_iter(),
            done: false,
        }))
    }
}

type Group = (Key, Vec<Row>);

/// Two-cursor merge over the sides' group runs.
struct MergeJoin<'a> {
    joiner: &'a dyn Joiner,
    key_fields: &'a [String],
    left: GroupRuns<'a>,
    right: GroupRuns<'a>,
    left_group: Option<Group>,
    right_group: Option<Group>,
    primed: bool,
    pending: std::vec::IntoIter<Row>,
    done: bool,
}

impl MergeJoin<'_> {
    /// One merge transition; `Ok(None)` means both sides ran out.
    fn step(&mut self) -> Result<Option<Vec<Row>>> {
        if !self.primed {
            self.primed = true;
            self.left_group = self.left.next().transpose()?;
            self.right_group = self.right.next().transpose()?;
        }
        match (self.left_group.take(), self.right_group.take()) {
            (None, None) => Ok(None),
            (Some((_, rows)), None) => {
                self.left_group = self.left.next().transpose()?;
                Ok(Some(self.joiner.join(self.key_fields, rows, Vec::new())?))
            }
            (None, Some((_, rows))) => {
                self.right_group = self.right.next().transpose()?;
                Ok(Some(self.joiner.join(self.key_fields, Vec::new(), rows)?))
            }
            (Some((left_key, left_rows)), Some((right_key, right_rows))) => {
                match row::cmp_keys(&left_key, &right_key) {
                    Ordering::Less => {
                        self.right_group = Some((right_key, right_rows));
                        self.left_group = self.left.next().transpose()?;
                        Ok(Some(self.joiner.join(
                            self.key_fields,
                            left_rows,
                            Vec::new(),
                        )?))
                    }
                    Ordering::Equal => {
                        self.left_group = self.left.next().transpose()?;
                        self.right_group = self.right.next().transpose()?;
                        Ok(Some(self.joiner.join(
                            self.key_fields,
                            left_rows,
                            right_rows,
                        )?))
                    }
                    Ordering::Greater => {
                        self.left_group = Some((left_key, left_rows));
                        self.right_group = self.right.next().transpose()?;
                        Ok(Some(self.joiner.join(
                            self.key_fields,
                            Vec::new(),
                            right_rows,
                        )?))
                    }
                }
            }
        }
    }
}

impl Iterator for MergeJoin<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(out) = self.pending.next() {
                return Some(Ok(out));
            }
            if self.done {
                return None;
            }
            match self.step() {
                Ok(Some(batch)) => self.pending = batch.into_iter(),
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Suffixes appended to non-key fields present on both sides of a merged
/// pair of rows.
#[derive(Clone, Debug)]
pub struct Suffixes {
    /// Appended to the left row's colliding fields.
    pub left: String,
    /// Appended to the right row's colliding fields.
    pub right: String,
}

impl Suffixes {
    /// Explicit suffix pair.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl Default for Suffixes {
    fn default() -> Self {
        Self::new("_1", "_2")
    }
}

/// Merges one pair of rows: key fields merge bare, colliding non-key
/// fields get their side's suffix, one-sided fields pass through.
fn merge(a: &Row, b: &Row, key_fields: &[String], suffixes: &Suffixes) -> Row {
    let mut out = Row::new();
    for (name, value) in a {
        if b.contains_key(name) && !key_fields.contains(name) {
            out.insert(format!("{}{}", name, suffixes.left), value.clone());
        } else {
            out.insert(name.clone(), value.clone());
        }
    }
    for (name, value) in b {
        if a.contains_key(name) && !key_fields.contains(name) {
            out.insert(format!("{}{}", name, suffixes.right), value.clone());
        } else {
            out.insert(name.clone(), value.clone());
        }
    }
    out
}

fn cross(key_fields: &[String], left: &[Row], right: &[Row], suffixes: &Suffixes) -> Vec<Row> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for a in left {
        for b in right {
            out.push(merge(a, b, key_fields, suffixes));
        }
    }
    out
}

/// Emits the cross product of matched groups; one-sided groups vanish.
pub struct InnerJoiner {
    suffixes: Suffixes,
}

impl InnerJoiner {
    /// Inner join with the default `_1`/`_2` suffixes.
    pub fn new() -> Self {
        Self {
            suffixes: Suffixes::default(),
        }
    }

    /// Inner join with explicit suffixes.
    pub fn with_suffixes(suffixes: Suffixes) -> Self {
        Self { suffixes }
    }
}

impl Default for InnerJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Joiner for InnerJoiner {
    fn join(&self, key_fields: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        if left.is_empty() || right.is_empty() {
            return Ok(Vec::new());
        }
        Ok(cross(key_fields, &left, &right, &self.suffixes))
    }
}

/// Cross product where matched; one-sided groups pass through as-is.
pub struct OuterJoiner {
    suffixes: Suffixes,
}

impl OuterJoiner {
    /// Outer join with the default `_1`/`_2` suffixes.
    pub fn new() -> Self {
        Self {
            suffixes: Suffixes::default(),
        }
    }

    /// Outer join with explicit suffixes.
    pub fn with_suffixes(suffixes: Suffixes) -> Self {
        Self { suffixes }
    }
}

impl Default for OuterJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Joiner for OuterJoiner {
    fn join(&self, key_fields: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        match (left.is_empty(), right.is_empty()) {
            (false, false) => Ok(cross(key_fields, &left, &right, &self.suffixes)),
            (true, _) => Ok(right),
            (_, true) => Ok(left),
        }
    }
}

/// Every left row survives: matched groups cross, unmatched left groups
/// pass through; right-only groups vanish.
pub struct LeftJoiner {
    suffixes: Suffixes,
}

impl LeftJoiner {
    /// Left join with the default `_1`/`_2` suffixes.
    pub fn new() -> Self {
        Self {
            suffixes: Suffixes::default(),
        }
    }

    /// Left join with explicit suffixes.
    pub fn with_suffixes(suffixes: Suffixes) -> Self {
        Self { suffixes }
    }
}

impl Default for LeftJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Joiner for LeftJoiner {
    fn join(&self, key_fields: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        if left.is_empty() {
            Ok(Vec::new())
        } else if right.is_empty() {
            Ok(left)
        } else {
            Ok(cross(key_fields, &left, &right, &self.suffixes))
        }
    }
}

/// Mirror of [`LeftJoiner`]: every right row survives.
pub struct RightJoiner {
    suffixes: Suffixes,
}

impl RightJoiner {
    /// Right join with the default `_1`/`_2` suffixes.
    pub fn new() -> Self {
        Self {
            suffixes: Suffixes::default(),
        }
    }

    /// Right join with explicit suffixes.
    pub fn with_suffixes(suffixes: Suffixes) -> Self {
        Self { suffixes }
    }
}

impl Default for RightJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Joiner for RightJoiner {
    fn join(&self, key_fields: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        if right.is_empty() {
            Ok(Vec::new())
        } else if left.is_empty() {
            Ok(right)
        } else {
            Ok(cross(key_fields, &left, &right, &self.suffixes))
        }
    }
}
