//! Rescaling flow values to percentages of a root node.

use crate::store::FlowRecord;
use serde::Serialize;
use tracing::{debug, warn};

/// How the normalization divisor was chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NormalizationPolicy {
    /// A named root candidate with nonzero outflow.
    ExplicitRoot { label: String, total: f64 },
    /// No candidate matched; the source with the largest total outflow is
    /// used instead. Percentages need not sum to 100 on unusual topologies.
    LargestOutflowFallback { label: String, total: f64 },
}

impl NormalizationPolicy {
    pub fn divisor(&self) -> f64 {
        match self {
            Self::ExplicitRoot { total, .. } | Self::LargestOutflowFallback { total, .. } => *total,
        }
    }

    pub fn root_label(&self) -> &str {
        match self {
            Self::ExplicitRoot { label, .. } | Self::LargestOutflowFallback { label, .. } => label,
        }
    }
}

/// Outflow per source label, in first-seen order.
fn outflows(records: &[FlowRecord]) -> Vec<(&str, f64)> {
    let mut sums: Vec<(&str, f64)> = Vec::new();
    for r in records {
        match sums.iter_mut().find(|(label, _)| *label == r.source) {
            Some((_, sum)) => *sum += r.value,
            None => sums.push((r.source.as_str(), r.value)),
        }
    }
    sums
}

/// Picks the first candidate whose outflow is nonzero, falling back to the
/// largest single-source outflow. `None` only for a table with no positive
/// outflow at all.
pub fn resolve_root<S: AsRef<str>>(records: &[FlowRecord], candidates: &[S]) -> Option<NormalizationPolicy> {
    let sums = outflows(records);

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let total: f64 = sums.iter().filter(|(l, _)| *l == candidate).map(|(_, s)| s).sum();
        if total > 0.0 {
            debug!(root = candidate, total, "normalizing against named root");
            return Some(NormalizationPolicy::ExplicitRoot { label: candidate.to_string(), total });
        }
    }

    // Ties keep the first-seen source.
    let (label, total) = sums
        .into_iter()
        .fold(None, |best: Option<(&str, f64)>, (l, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((l, s)),
        })?;
    if total <= 0.0 {
        return None;
    }
    warn!(root = label, total, "no named root node; normalizing against the largest outflow");
    Some(NormalizationPolicy::LargestOutflowFallback { label: label.to_string(), total })
}

/// Returns copies of `records` with every value as a percentage of the
/// policy's divisor.
pub fn normalize_records(records: &[FlowRecord], policy: &NormalizationPolicy) -> Vec<FlowRecord> {
    let divisor = policy.divisor();
    records
        .iter()
        .map(|r| FlowRecord { value: r.value / divisor * 100.0, ..r.clone() })
        .collect()
}
