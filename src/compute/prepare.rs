//! prepare.rs
//! Turns flow records into the parallel sequences a Sankey renderer consumes.

use super::normalize::{normalize_records, resolve_root, NormalizationPolicy};
use crate::display::palette::Palette;
use crate::graph::{FlowGraph, GraphError};
use crate::store::taxonomy::ROOT_CANDIDATES;
use crate::store::{FlowRecord, Loader};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueScale {
    /// Billions USD.
    Absolute,
    /// Percent of the normalization root.
    Percent,
}

/// Render-ready view of a `FlowGraph`. Node vectors are indexed by node id,
/// link vectors by record order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyData {
    pub scale: ValueScale,
    pub nodes: Vec<String>,
    pub node_labels: Vec<String>,
    pub node_colors: Vec<String>,
    pub node_totals: Vec<f64>,
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub value: Vec<f64>,
    pub link_colors: Vec<String>,
    pub percentages: Vec<String>,
    pub source_names: Vec<String>,
    pub target_names: Vec<String>,
}

/// Output of `FlowPreparer::prepare`.
#[derive(Debug, Clone)]
pub struct PreparedFlow {
    pub graph: FlowGraph,
    pub sankey: SankeyData,
    /// Set when normalization was requested and a divisor was found.
    pub normalization: Option<NormalizationPolicy>,
}

pub struct FlowPreparer<'a> {
    palette: &'a Palette,
    company: Option<String>,
    normalize: bool,
    root_candidates: Vec<String>,
}

impl<'a> FlowPreparer<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        Self {
            palette,
            company: None,
            normalize: false,
            root_candidates: ROOT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Company label used for segment colours.
    pub fn with_company(mut self, company: Option<&str>) -> Self {
        self.company = company.map(str::to_string);
        self
    }

    pub fn normalized(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_root_candidates(mut self, candidates: Vec<String>) -> Self {
        self.root_candidates = candidates;
        self
    }

    pub fn prepare(&self, records: &[FlowRecord]) -> Result<PreparedFlow, GraphError> {
        let normalization;
        let scaled;
        let records = if self.normalize {
            normalization = resolve_root(records, &self.root_candidates);
            match &normalization {
                Some(policy) => {
                    scaled = normalize_records(records, policy);
                    &scaled[..]
                }
                None => records,
            }
        } else {
            normalization = None;
            records
        };

        // Without a divisor the values stay in billions.
        let scale = if normalization.is_some() { ValueScale::Percent } else { ValueScale::Absolute };
        let graph = FlowGraph::build(records)?;
        let sankey = self.sankey_data(&graph, scale);
        Ok(PreparedFlow { graph, sankey, normalization })
    }

    /// Loads a flow table and prepares it in one step.
    pub fn prepare_file(&self, loader: &Loader, path: &Path) -> crate::Result<PreparedFlow> {
        let table = loader.load(path)?;
        Ok(self.prepare(&table.records)?)
    }

    fn sankey_data(&self, graph: &FlowGraph, scale: ValueScale) -> SankeyData {
        let company = self.company.as_deref();

        let nodes: Vec<String> = graph.labels().map(str::to_string).collect();
        let node_totals: Vec<f64> = graph.node_ids().map(|id| graph.node_total(id)).collect();
        let node_labels = nodes
            .iter()
            .zip(&node_totals)
            .map(|(name, total)| match scale {
                ValueScale::Absolute => format!("{name}\n${total:.2}B"),
                ValueScale::Percent => format!("{name}\n{total:.1}%"),
            })
            .collect();
        let node_colors = nodes.iter().map(|n| self.palette.node_color(n, company).to_string()).collect();

        let edge_count = graph.edge_count();
        let mut data = SankeyData {
            scale,
            nodes,
            node_labels,
            node_colors,
            node_totals,
            source: Vec::with_capacity(edge_count),
            target: Vec::with_capacity(edge_count),
            value: Vec::with_capacity(edge_count),
            link_colors: Vec::with_capacity(edge_count),
            percentages: Vec::with_capacity(edge_count),
            source_names: Vec::with_capacity(edge_count),
            target_names: Vec::with_capacity(edge_count),
        };

        for edge in graph.edges() {
            let source_name = graph.label(edge.source);
            data.source.push(edge.source.index());
            data.target.push(edge.target.index());
            data.value.push(edge.value);
            data.link_colors.push(self.palette.link_color(source_name, company));
            data.percentages.push(format!("{:.1}%", graph.edge_percentage(&edge)));
            data.source_names.push(source_name.to_string());
            data.target_names.push(graph.label(edge.target).to_string());
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::template::sample_records;

    fn three_flows() -> Vec<FlowRecord> {
        vec![
            FlowRecord::new("Total Revenue", "DRAM", 6.75),
            FlowRecord::new("Total Revenue", "NAND", 1.85),
            FlowRecord::new("DRAM", "Mobile", 1.60),
        ]
    }

    #[test]
    fn test_absolute_labels_and_percentages() {
        let palette = Palette::default();
        let prepared = FlowPreparer::new(&palette).prepare(&three_flows()).unwrap();
        let s = &prepared.sankey;

        assert_eq!(s.nodes, vec!["Total Revenue", "DRAM", "NAND", "Mobile"]);
        assert_eq!(s.node_labels[1], "DRAM\n$6.75B");
        assert_eq!(s.node_labels[0], "Total Revenue\n$8.60B");
        assert_eq!(s.source, vec![0, 0, 1]);
        assert_eq!(s.target, vec![1, 2, 3]);
        assert_eq!(s.percentages, vec!["78.5%", "21.5%", "23.7%"]);
        assert_eq!(s.source_names[2], "DRAM");
        assert_eq!(s.target_names[2], "Mobile");
        assert!(prepared.normalization.is_none());
    }

    #[test]
    fn test_colors_follow_company() {
        let palette = Palette::default();
        let prepared = FlowPreparer::new(&palette)
            .with_company(Some("Samsung"))
            .prepare(&three_flows())
            .unwrap();
        assert_eq!(prepared.sankey.node_colors, vec!["#34495E", "#3498DB", "#9B59B6", "#06A77D"]);
        assert_eq!(prepared.sankey.link_colors[2], "rgba(52,152,219,0.4)");
    }

    #[test]
    fn test_normalized_mode_uses_percent_labels() {
        let palette = Palette::default();
        let prepared = FlowPreparer::new(&palette).normalized(true).prepare(&sample_records()).unwrap();
        let s = &prepared.sankey;

        assert_eq!(s.scale, ValueScale::Percent);
        assert_eq!(s.node_labels[0], "Total Revenue\n100.0%");
        let root_out: f64 = s.source.iter().zip(&s.value).filter(|(src, _)| **src == 0).map(|(_, v)| v).sum();
        assert!((root_out - 100.0).abs() < 1e-9);
        // Per-edge shares are scale invariant.
        assert_eq!(s.percentages[0], "77.6%");
        assert_eq!(prepared.normalization.unwrap().root_label(), "Total Revenue");
    }

    #[test]
    fn test_prepare_file_reports_load_and_graph_errors() {
        let palette = Palette::default();
        let preparer = FlowPreparer::new(&palette);
        let dir = tempfile::tempdir().unwrap();

        let missing = preparer.prepare_file(&Loader::new(), &dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(missing, crate::Error::Load(_)));

        let cyclic = dir.path().join("cyclic.csv");
        std::fs::write(&cyclic, "source,target,value\nA,B,1\nB,A,1\n").unwrap();
        let err = preparer.prepare_file(&Loader::new(), &cyclic).unwrap_err();
        assert!(matches!(err, crate::Error::Graph(GraphError::CycleDetected { .. })));
    }

    #[test]
    fn test_normalizing_without_positive_outflow_stays_absolute() {
        let palette = Palette::default();
        let prepared = FlowPreparer::new(&palette).normalized(true).prepare(&[]).unwrap();
        assert!(prepared.normalization.is_none());
        assert_eq!(prepared.sankey.scale, ValueScale::Absolute);
    }

    #[test]
    fn test_custom_root_candidates() {
        let palette = Palette::default();
        let records = vec![FlowRecord::new("Net Sales", "DRAM", 2.0), FlowRecord::new("Net Sales", "NAND", 2.0)];
        let prepared = FlowPreparer::new(&palette)
            .normalized(true)
            .with_root_candidates(vec!["Net Sales".into()])
            .prepare(&records)
            .unwrap();
        assert!(matches!(prepared.normalization, Some(NormalizationPolicy::ExplicitRoot { .. })));
        assert_eq!(prepared.sankey.value, vec![50.0, 50.0]);
    }
}
