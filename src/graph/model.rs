//! Dependency graph over requests.
//!
//! Nodes are request records (plus lens attributes), edges carry the rule
//! that inferred them. Storage is a petgraph `DiGraph` with an id index on
//! the side.

use crate::tracker::{RequestId, RequestRecord};
use petgraph::algo::{has_path_connecting, is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Why an edge exists. Variants are listed from most to least confident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeReason {
    Initiator,
    Redirect,
    SameFrameSerial,
}

impl EdgeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiator => "initiator",
            Self::Redirect => "redirect",
            Self::SameFrameSerial => "same-frame-serial",
        }
    }
}

impl fmt::Display for EdgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub from: RequestId,
    pub to: RequestId,
    pub reason: EdgeReason,
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub record: RequestRecord,

    /// Lens-derived attributes, keyed `<lens>.<key>`
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, EdgeReason>,
    index: HashMap<RequestId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request node. Re-adding an existing id keeps the first node.
    pub fn add_node(&mut self, record: RequestRecord) -> NodeIndex {
        if let Some(&idx) = self.index.get(&record.id) {
            return idx;
        }
        let id = record.id.clone();
        let idx = self.graph.add_node(GraphNode {
            record,
            attributes: BTreeMap::new(),
        });
        self.index.insert(id, idx);
        idx
    }

    /// Add an edge. Returns false for self-edges, unknown endpoints and
    /// duplicates of the same reason.
    pub fn add_edge(&mut self, from: &RequestId, to: &RequestId, reason: EdgeReason) -> bool {
        if from == to {
            return false;
        }
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if self
            .graph
            .edges_connecting(a, b)
            .any(|edge| *edge.weight() == reason)
        {
            return false;
        }
        self.graph.add_edge(a, b, reason);
        true
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &RequestId) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub(crate) fn node_mut(&mut self, id: &RequestId) -> Option<&mut GraphNode> {
        let idx = *self.index.get(id)?;
        Some(&mut self.graph[idx])
    }

    /// Nodes in id order
    pub fn nodes(&self) -> Vec<&GraphNode> {
        let mut nodes: Vec<&GraphNode> = self.graph.node_weights().collect();
        nodes.sort_by(|a, b| a.record.id.cmp(&b.record.id));
        nodes
    }

    /// Edges sorted by (from, to, reason)
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .graph
            .edge_references()
            .map(|edge| Edge {
                from: self.graph[edge.source()].record.id.clone(),
                to: self.graph[edge.target()].record.id.clone(),
                reason: *edge.weight(),
            })
            .collect();
        edges.sort();
        edges
    }

    /// Incoming edges of a node
    pub fn parents(&self, id: &RequestId) -> Vec<(RequestId, EdgeReason)> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut parents: Vec<(RequestId, EdgeReason)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (self.graph[edge.source()].record.id.clone(), *edge.weight()))
            .collect();
        parents.sort();
        parents
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether adding `from -> to` would close a cycle
    pub fn would_close_cycle(&self, from: &RequestId, to: &RequestId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => a == b || has_path_connecting(&self.graph, b, a, None),
            _ => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// A request sitting on a cycle, if the graph has one
    pub fn find_cycle(&self) -> Option<RequestId> {
        toposort(&self.graph, None)
            .err()
            .map(|cycle| self.graph[cycle.node_id()].record.id.clone())
    }
}
