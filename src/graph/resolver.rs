//! Dependency inference.
//!
//! Edges come from three rules, in priority order:
//! 1. Initiator: the explicit parent id, else the latest earlier request for
//!    the initiator URL
//! 2. Redirect: the closed hop a request continues from
//! 3. Same-frame-serial: the request in the same frame whose response became
//!    ready last, strictly before this request's start
//!
//! Rules 1 and 2 both apply when they match, so a redirected request keeps
//! its initiator edge next to the edge from its previous hop. Rule 3 is only
//! consulted when neither of them produced a parent.
//!
//! Frame-serial edges are added after all explicit edges and dropped when
//! they would close a cycle. Explicit edges are kept as-is and any cycle they
//! form is left for callers to find with [`DependencyGraph::find_cycle`].

use super::lens::NodeLens;
use super::model::{DependencyGraph, EdgeReason};
use crate::trace::Trace;
use crate::tracker::{RequestId, RequestRecord};
use log::{debug, warn};
use std::collections::HashMap;

/// Infer the dependency graph of a trace
///
/// **Public** - main entry point for dependency inference
///
/// Deterministic for a fixed trace and fixed lens outputs.
pub fn resolve(trace: &Trace, lenses: &[Box<dyn NodeLens>]) -> DependencyGraph {
    let mut records: Vec<&RequestRecord> = trace.requests().iter().collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));

    let mut graph = DependencyGraph::new();
    for record in &records {
        graph.add_node((*record).clone());
        annotate(&mut graph, record, lenses);
    }

    let by_url = bucket(&records, |r| r.url.as_deref());
    let by_frame = bucket(&records, |r| r.frame_id.as_deref());

    let mut heuristic = Vec::new();
    for child in &records {
        let mut explicit = false;
        if let Some(parent) = initiator_parent(&graph, child, &by_url) {
            explicit |= graph.add_edge(&parent, &child.id, EdgeReason::Initiator);
        }
        if let Some(hop) = &child.redirected_from {
            explicit |= graph.add_edge(hop, &child.id, EdgeReason::Redirect);
        }
        if explicit {
            continue;
        }
        if let Some(parent) = frame_serial_parent(child, &by_frame) {
            heuristic.push((parent, child.id.clone()));
        }
    }

    for (parent, child) in heuristic {
        if graph.would_close_cycle(&parent, &child) {
            warn!(
                "Dropping same-frame-serial edge {} -> {}: it would close a cycle",
                parent, child
            );
            continue;
        }
        graph.add_edge(&parent, &child, EdgeReason::SameFrameSerial);
    }

    debug!(
        "Resolved {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

fn annotate(graph: &mut DependencyGraph, record: &RequestRecord, lenses: &[Box<dyn NodeLens>]) {
    let Some(node) = graph.node_mut(&record.id) else {
        return;
    };
    for lens in lenses {
        for (key, value) in lens.annotate(record) {
            node.attributes.insert(format!("{}.{}", lens.name(), key), value);
        }
    }
}

fn bucket<'a>(
    records: &[&'a RequestRecord],
    key: impl Fn(&'a RequestRecord) -> Option<&'a str>,
) -> HashMap<&'a str, Vec<&'a RequestRecord>> {
    let mut buckets: HashMap<&str, Vec<&RequestRecord>> = HashMap::new();
    for &record in records {
        if let Some(k) = key(record) {
            buckets.entry(k).or_default().push(record);
        }
    }
    buckets
}

/// Rule 1: explicit parent id, falling back to the initiator URL
fn initiator_parent(
    graph: &DependencyGraph,
    child: &RequestRecord,
    by_url: &HashMap<&str, Vec<&RequestRecord>>,
) -> Option<RequestId> {
    if let Some(parent) = &child.initiator.request_id {
        if parent != &child.id && graph.contains(parent) {
            return Some(parent.clone());
        }
        debug!("Request {}: initiator {} not in trace", child.id, parent);
    }

    let url = child.initiator.url.as_deref()?;
    let start = child.timing.start;
    by_url
        .get(url)?
        .iter()
        .filter(|candidate| candidate.id != child.id)
        .filter(|candidate| match (candidate.timing.start, start) {
            (Some(s), Some(child_start)) => s <= child_start,
            _ => true,
        })
        .max_by(|a, b| {
            let (sa, sb) = (a.timing.start.unwrap_or(f64::MIN), b.timing.start.unwrap_or(f64::MIN));
            sa.total_cmp(&sb).then_with(|| a.id.cmp(&b.id))
        })
        .map(|parent| parent.id.clone())
}

/// Rule 3: latest request in the same frame that was ready before this one
/// started. A parent ready at the exact start instant does not count.
fn frame_serial_parent(
    child: &RequestRecord,
    by_frame: &HashMap<&str, Vec<&RequestRecord>>,
) -> Option<RequestId> {
    let frame = child.frame_id.as_deref()?;
    let start = child.timing.start?;
    by_frame
        .get(frame)?
        .iter()
        .filter(|candidate| candidate.id != child.id)
        .filter_map(|candidate| {
            let ready = candidate.ready_time()?;
            (ready < start).then_some((ready, *candidate))
        })
        .max_by(|(ra, a), (rb, b)| ra.total_cmp(rb).then_with(|| a.id.cmp(&b.id)))
        .map(|(_, parent)| parent.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{PageTrack, RequestTrack, TraceMetadata, TracingTrack};
    use crate::tracker::{Initiator, Outcome, Timing};

    fn record(id: &str, frame: &str, start: f64, headers: f64) -> RequestRecord {
        RequestRecord {
            id: RequestId::from(id),
            url: Some(format!("https://a.test/{}", id)),
            frame_id: Some(frame.to_string()),
            timing: Timing {
                start: Some(start),
                headers: Some(headers),
                end: Some(headers + 0.1),
                ..Timing::default()
            },
            outcome: Outcome::Succeeded,
            ..RequestRecord::default()
        }
    }

    fn trace(records: Vec<RequestRecord>) -> Trace {
        Trace {
            url: "https://a.test/".to_string(),
            tracing_track: TracingTrack::default(),
            page_track: PageTrack::default(),
            request_track: RequestTrack {
                events: records,
                ..RequestTrack::default()
            },
            metadata: TraceMetadata::default(),
        }
    }

    #[test]
    fn test_initiator_by_url() {
        let doc = record("1", "F1", 1.0, 1.1);
        let mut script = record("2", "F1", 1.5, 1.6);
        script.initiator = Initiator {
            url: Some("https://a.test/1".to_string()),
            ..Initiator::default()
        };

        let graph = resolve(&trace(vec![doc, script]), &[]);
        assert_eq!(
            graph.parents(&RequestId::from("2")),
            vec![(RequestId::from("1"), EdgeReason::Initiator)]
        );
    }

    #[test]
    fn test_frame_serial_picks_latest_ready() {
        let a = record("1", "F1", 1.0, 1.1);
        let b = record("2", "F1", 1.0, 1.3);
        let c = record("3", "F1", 1.4, 1.5);
        let other_frame = record("4", "F2", 1.0, 1.35);

        let graph = resolve(&trace(vec![a, b, c, other_frame]), &[]);
        assert_eq!(
            graph.parents(&RequestId::from("3")),
            vec![(RequestId::from("2"), EdgeReason::SameFrameSerial)]
        );
        // neither 1 nor 2 has anything ready before it starts
        assert!(graph.parents(&RequestId::from("1")).is_empty());
    }

    #[test]
    fn test_redirected_request_keeps_initiator() {
        let doc = record("1", "F1", 1.0, 1.1);
        let mut hop = record("2.redirect.0", "F1", 1.2, 1.3);
        hop.initiator.request_id = Some(RequestId::from("1"));
        hop.redirected_to = Some(RequestId::from("2"));
        let mut live = record("2", "F1", 1.3, 1.4);
        live.initiator.request_id = Some(RequestId::from("1"));
        live.redirected_from = Some(RequestId::from("2.redirect.0"));

        let graph = resolve(&trace(vec![doc, hop, live]), &[]);
        assert_eq!(
            graph.parents(&RequestId::from("2")),
            vec![
                (RequestId::from("1"), EdgeReason::Initiator),
                (RequestId::from("2.redirect.0"), EdgeReason::Redirect),
            ]
        );
        assert_eq!(
            graph.parents(&RequestId::from("2.redirect.0")),
            vec![(RequestId::from("1"), EdgeReason::Initiator)]
        );
    }

    #[test]
    fn test_frame_serial_needs_ready_before_start() {
        let a = record("1", "F1", 1.0, 1.2);
        let b = record("2", "F1", 1.2, 1.5);

        let graph = resolve(&trace(vec![a, b]), &[]);
        assert!(graph.parents(&RequestId::from("2")).is_empty());
    }

    #[test]
    fn test_explicit_cycle_kept_and_reported() {
        let mut a = record("1", "F1", 1.0, 1.1);
        a.initiator.request_id = Some(RequestId::from("2"));
        let mut b = record("2", "F1", 1.0, 1.1);
        b.initiator.request_id = Some(RequestId::from("1"));

        let graph = resolve(&trace(vec![a, b]), &[]);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.is_acyclic());
        assert!(graph.find_cycle().is_some());
    }

    #[test]
    fn test_skewed_frame_serial_cycle_dropped() {
        // headers before start on both sides: each looks ready before the other
        let a = record("1", "F1", 2.0, 1.0);
        let b = record("2", "F1", 2.0, 1.5);

        let graph = resolve(&trace(vec![a, b]), &[]);
        assert!(graph.is_acyclic());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_lens_attributes_namespaced() {
        struct Fixed;
        impl NodeLens for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            fn annotate(&self, _record: &RequestRecord) -> Vec<(String, serde_json::Value)> {
                vec![("k".to_string(), serde_json::json!(1))]
            }
        }

        let lenses: Vec<Box<dyn NodeLens>> = vec![Box::new(Fixed)];
        let graph = resolve(&trace(vec![record("1", "F1", 1.0, 1.1)]), &lenses);
        let node = graph.node(&RequestId::from("1")).unwrap();
        assert_eq!(node.attributes["fixed.k"], serde_json::json!(1));
    }
}
