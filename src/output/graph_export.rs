//! Graph exporter.
//!
//! Maps a [`DependencyGraph`] to the interchange document
//! `{nodes: [...], edges: [{from, to, reason}, ...]}`. No semantic
//! transformation happens here.

use crate::graph::{DependencyGraph, EdgeReason, GraphNode};
use crate::tracker::{Outcome, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeDescriptor>,
    pub edges: Vec<EdgeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: RequestId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    pub outcome: Outcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    /// Lens output, opaque to the exporter
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    pub from: RequestId,
    pub to: RequestId,
    pub reason: EdgeReason,
}

impl From<&GraphNode> for NodeDescriptor {
    fn from(node: &GraphNode) -> Self {
        let record = &node.record;
        Self {
            id: record.id.clone(),
            url: record.url.clone(),
            method: record.method.clone(),
            status: record.status,
            outcome: record.outcome,
            frame_id: record.frame_id.clone(),
            resource_type: record.resource_type.clone(),
            start: record.timing.start,
            end: record.timing.end,
            duration_ms: record.duration_ms(),
            attributes: node.attributes.clone(),
        }
    }
}

/// Export a resolved graph
///
/// **Public** - main entry point for graph export
pub fn export_graph(graph: &DependencyGraph) -> GraphDocument {
    GraphDocument {
        nodes: graph.nodes().into_iter().map(NodeDescriptor::from).collect(),
        edges: graph
            .edges()
            .into_iter()
            .map(|edge| EdgeDescriptor {
                from: edge.from,
                to: edge.to,
                reason: edge.reason,
            })
            .collect(),
    }
}

impl GraphDocument {
    /// Edge counts per reason
    pub fn edges_by_reason(&self) -> BTreeMap<EdgeReason, usize> {
        let mut counts = BTreeMap::new();
        for edge in &self.edges {
            *counts.entry(edge.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Structural problems: duplicate node ids, dangling or self edges
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(&node.id) {
                problems.push(format!("duplicate node {}", node.id));
            }
        }
        for edge in &self.edges {
            if edge.from == edge.to {
                problems.push(format!("self edge on {}", edge.from));
            }
            for end in [&edge.from, &edge.to] {
                if !ids.contains(end) {
                    problems.push(format!(
                        "edge {} -> {} references unknown node {}",
                        edge.from, edge.to, end
                    ));
                }
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::RequestRecord;
    use serde_json::json;

    #[test]
    fn test_export_shape() {
        let mut graph = DependencyGraph::new();
        for id in ["1", "2"] {
            graph.add_node(RequestRecord {
                id: RequestId::from(id),
                url: Some(format!("https://a.test/{}", id)),
                ..RequestRecord::default()
            });
        }
        graph.add_edge(&RequestId::from("1"), &RequestId::from("2"), EdgeReason::Initiator);

        let value = serde_json::to_value(export_graph(&graph)).unwrap();
        assert_eq!(
            value["edges"],
            json!([{"from": "1", "to": "2", "reason": "initiator"}])
        );
        assert_eq!(value["nodes"][0]["id"], "1");
        assert_eq!(value["nodes"][0]["outcome"], "pending");
        assert!(value["nodes"][0].get("attributes").is_none());
    }

    #[test]
    fn test_validate_reports_dangling_edge() {
        let doc: GraphDocument = serde_json::from_value(json!({
            "nodes": [{"id": "1", "outcome": "succeeded"}],
            "edges": [{"from": "1", "to": "7", "reason": "redirect"}]
        }))
        .unwrap();

        let problems = doc.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("unknown node 7"));
        assert_eq!(doc.edges_by_reason()[&EdgeReason::Redirect], 1);
    }
}
