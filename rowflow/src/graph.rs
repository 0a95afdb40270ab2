//! Computation graphs: immutable operator DAGs and their execution.

use std::path::PathBuf;
use std::rc::Rc;

use crate::error::Result;
use crate::inputs::Inputs;
use crate::ops::{
    FromFile, FromIter, Join, Joiner, Map, Mapper, Operation, Reduce, Reducer, RowStream, Sort,
};
use crate::row::Row;

struct Node {
    op: Box<dyn Operation>,
    deps: Vec<Rc<Node>>,
}

/// A computation graph: a cheap handle onto an immutable operator DAG.
///
/// Builder methods never mutate; each returns a new graph depending on the
/// receiver, so graphs can branch from and re-join shared prefixes, and
/// the builder cannot form cycles. Executing with [`Graph::run`]
/// materializes one lazy stream per node appearance and drains the root,
/// which makes a graph reusable across any number of runs and inputs.
#[derive(Clone)]
pub struct Graph {
    node: Rc<Node>,
}

impl Graph {
    fn node(op: impl Operation + 'static, deps: Vec<Rc<Node>>) -> Self {
        Self {
            node: Rc::new(Node {
                op: Box::new(op),
                deps,
            }),
        }
    }

    /// Graph reading rows from the run input binding named `name`.
    pub fn from_iter(name: impl Into<String>) -> Self {
        Self::node(FromIter::new(name), Vec::new())
    }

    /// Graph reading rows from `path`, one parsed line at a time.
    pub fn from_file(
        path: impl Into<PathBuf>,
        parser: impl Fn(&str) -> Result<Option<Row>> + 'static,
    ) -> Self {
        Self::node(FromFile::new(path, parser), Vec::new())
    }

    /// Extends with a map over `mapper`.
    pub fn map(&self, mapper: impl Mapper + 'static) -> Self {
        Self::node(Map::new(mapper), vec![self.node.clone()])
    }

    /// Extends with a reduce of `reducer` over groups of `keys`.
    pub fn reduce(&self, reducer: impl Reducer + 'static, keys: &[&str]) -> Self {
        Self::node(Reduce::new(reducer, keys), vec![self.node.clone()])
    }

    /// Extends with a stable ascending sort by `keys`.
    pub fn sort(&self, keys: &[&str]) -> Self {
        Self::node(Sort::new(keys), vec![self.node.clone()])
    }

    /// Extends with a sort-merge join against `other` on `keys`.
    pub fn join(&self, joiner: impl Joiner + 'static, other: &Graph, keys: &[&str]) -> Self {
        Self::node(
            Join::new(joiner, keys),
            vec![self.node.clone(), other.node.clone()],
        )
    }

    /// Executes the graph against `inputs` and collects the root stream.
    pub fn run(&self, inputs: &Inputs) -> Result<Vec<Row>> {
        let stream = instantiate(&self.node, inputs)?;
        let rows = stream.collect::<Result<Vec<_>>>()?;
        tracing::debug!(rows = rows.len(), "root stream drained");
        Ok(rows)
    }
}

fn instantiate<'a>(node: &'a Node, inputs: &Inputs) -> Result<RowStream<'a>> {
    let deps = node
        .deps
        .iter()
        .map(|dep| instantiate(dep, inputs))
        .collect::<Result<Vec<_>>>()?;
    tracing::trace!(op = node.op.name(), deps = deps.len(), "wiring operator stream");
    node.op.stream(deps, inputs)
}
