//! Per-dataset revenue breakdowns: by segment and by end market.

use crate::graph::FlowGraph;
use crate::store::taxonomy::{SEGMENTS, TOTAL_REVENUE};

#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub label: String,
    pub value: f64,
    /// Percent of the table total, rounded to one decimal.
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShareTable {
    pub rows: Vec<ShareRow>,
}

impl ShareTable {
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn total(&self) -> f64 { self.rows.iter().map(|r| r.value).sum() }

    /// Groups the targets of every edge whose source satisfies `from`, then
    /// sorts by value, largest first.
    fn from_edges(graph: &FlowGraph, from: impl Fn(&str) -> bool) -> Self {
        let mut sums: Vec<(String, f64)> = Vec::new();
        for edge in graph.edges().filter(|e| from(graph.label(e.source))) {
            let label = graph.label(edge.target);
            match sums.iter_mut().find(|(l, _)| l == label) {
                Some((_, v)) => *v += edge.value,
                None => sums.push((label.to_string(), edge.value)),
            }
        }

        let total: f64 = sums.iter().map(|(_, v)| v).sum();
        let mut rows: Vec<ShareRow> = sums
            .into_iter()
            .map(|(label, value)| ShareRow { label, value, share: round1(value / total * 100.0) })
            .collect();
        rows.sort_by(|a, b| b.value.total_cmp(&a.value));
        Self { rows }
    }
}

fn round1(x: f64) -> f64 { (x * 10.0).round() / 10.0 }

/// Revenue by segment (layer 1) and by end market (layer 2).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTables {
    pub by_segment: ShareTable,
    pub by_end_market: ShareTable,
}

impl SummaryTables {
    pub fn build(graph: &FlowGraph) -> Self {
        Self {
            by_segment: ShareTable::from_edges(graph, |s| s == TOTAL_REVENUE),
            by_end_market: ShareTable::from_edges(graph, |s| SEGMENTS.contains(&s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::template::sample_records;
    use crate::store::FlowRecord;

    #[test]
    fn test_segments_sorted_with_rounded_shares() {
        let g = FlowGraph::build(&sample_records()).unwrap();
        let t = SummaryTables::build(&g);

        let labels: Vec<_> = t.by_segment.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["DRAM", "NAND", "Emerging"]);
        assert_eq!(t.by_segment.rows[0].share, 77.6);
        assert!((t.by_segment.total() - 8.70).abs() < 1e-9);
    }

    #[test]
    fn test_end_markets_aggregate_across_segments() {
        let g = FlowGraph::build(&sample_records()).unwrap();
        let t = SummaryTables::build(&g);

        let ai = &t.by_end_market.rows[0];
        assert_eq!(ai.label, "AI/Datacenter");
        assert!((ai.value - 4.28).abs() < 1e-9);
        assert_eq!(t.by_end_market.rows.last().unwrap().label, "Industrial");
    }

    #[test]
    fn test_missing_layer_gives_empty_table() {
        let g = FlowGraph::build(&[FlowRecord::new("DRAM", "Mobile", 1.0)]).unwrap();
        let t = SummaryTables::build(&g);
        assert!(t.by_segment.is_empty());
        assert_eq!(t.by_end_market.rows[0].share, 100.0);
    }
}
