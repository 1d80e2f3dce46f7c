use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// One directed, weighted edge of a revenue-flow table.
///
/// Records coming out of the loader always carry `value > 0` and
/// `source != target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub source: String,
    pub target: String,
    pub value: f64,
    /// Only set when the table has a `quarter` column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
}

impl FlowRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self { source: source.into(), target: target.into(), value, quarter: None }
    }

    pub fn in_quarter(mut self, quarter: impl Into<String>) -> Self {
        self.quarter = Some(quarter.into());
        self
    }
}
