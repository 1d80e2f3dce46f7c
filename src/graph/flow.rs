//! flow.rs
//! The node-indexed revenue-flow graph derived from a set of `FlowRecord`s.

use super::error::GraphError;
use crate::analysis::topology;
use crate::store::{FlowRecord, NodeId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// One edge of a `FlowGraph`, in record order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub value: f64,
}

/// Immutable flow graph. Built fresh for each report; never mutated.
///
/// Node ids follow first-seen order across the records (a record's source is
/// seen before its target). Edge ids follow record order.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    pub(crate) graph: DiGraph<String, f64>,
    index: HashMap<String, NodeId>,
    inflow: Vec<f64>,
    outflow: Vec<f64>,
}

impl FlowGraph {
    /// Builds the graph and its per-node aggregates. Rejects directed cycles.
    pub fn build(records: &[FlowRecord]) -> Result<Self, GraphError> {
        let mut graph = DiGraph::with_capacity(records.len() * 2, records.len());
        let mut index: HashMap<String, NodeId> = HashMap::new();

        let mut intern = |graph: &mut DiGraph<String, f64>, label: &str| -> NodeIndex {
            if let Some(id) = index.get(label) {
                return NodeIndex::new(id.index());
            }
            let idx = graph.add_node(label.to_string());
            index.insert(label.to_string(), NodeId::new(idx.index()));
            idx
        };

        for r in records {
            let s = intern(&mut graph, &r.source);
            let t = intern(&mut graph, &r.target);
            graph.add_edge(s, t, r.value);
        }

        let count = graph.node_count();
        let mut inflow = vec![0.0; count];
        let mut outflow = vec![0.0; count];
        for e in graph.edge_references() {
            outflow[e.source().index()] += *e.weight();
            inflow[e.target().index()] += *e.weight();
        }

        let flow = Self { graph, index, inflow, outflow };
        topology::check_acyclic(&flow)?;
        Ok(flow)
    }

    pub fn node_count(&self) -> usize { self.graph.node_count() }
    pub fn edge_count(&self) -> usize { self.graph.edge_count() }
    pub fn is_empty(&self) -> bool { self.graph.node_count() == 0 }

    pub fn node_id(&self, label: &str) -> Option<NodeId> { self.index.get(label).copied() }

    pub fn label(&self, id: NodeId) -> &str { &self.graph[NodeIndex::new(id.index())] }

    /// Labels in node-id order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(move |i| self.graph[i].as_str())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(|i| NodeId::new(i.index()))
    }

    pub fn inflow(&self, id: NodeId) -> f64 { self.inflow[id.index()] }
    pub fn outflow(&self, id: NodeId) -> f64 { self.outflow[id.index()] }

    /// `max(outflow, inflow)`: an intermediate node passes through what it
    /// receives, while roots and leaves only have one side populated.
    pub fn node_total(&self, id: NodeId) -> f64 {
        self.outflow[id.index()].max(self.inflow[id.index()])
    }

    /// Inflow of the named node, `0.0` if the label is absent.
    pub fn target_sum(&self, label: &str) -> f64 {
        self.node_id(label).map_or(0.0, |id| self.inflow(id))
    }

    /// Outflow of the named node, `0.0` if the label is absent.
    pub fn source_sum(&self, label: &str) -> f64 {
        self.node_id(label).map_or(0.0, |id| self.outflow(id))
    }

    pub fn edges(&self) -> impl Iterator<Item = FlowEdge> + '_ {
        self.graph.edge_references().map(|e| FlowEdge {
            source: NodeId::new(e.source().index()),
            target: NodeId::new(e.target().index()),
            value: *e.weight(),
        })
    }

    /// Edge value as a percentage of its source node's total; `0.0` when the
    /// source total is zero.
    pub fn edge_percentage(&self, edge: &FlowEdge) -> f64 {
        let total = self.node_total(edge.source);
        if total > 0.0 { edge.value / total * 100.0 } else { 0.0 }
    }

    /// Direct successors of a node, used by the topology checks.
    pub(crate) fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(id.index()), Direction::Outgoing)
            .map(|n| NodeId::new(n.index()))
    }
}
