//! Category-by-category comparison of two flow graphs, and the quarterly
//! split that feeds it from a single multi-quarter table.

use crate::graph::FlowGraph;
use crate::store::taxonomy::{END_MARKETS, SEGMENTS};
use crate::store::{FlowRecord, FlowTable};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("table has no 'quarter' column; expected columns: source, target, value, quarter")]
    MissingQuarterColumn,
    #[error("no data for quarter(s) {requested:?}; available quarters: {available:?}")]
    QuarterNotFound { requested: Vec<String>, available: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub category: String,
    pub left: f64,
    pub right: f64,
    /// `left - right`
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSummary {
    pub left_name: String,
    pub right_name: String,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonSummary {
    /// Joins the two graphs on the fixed segment and end-market categories,
    /// using each category's inflow. Categories absent from both sides are
    /// left out.
    pub fn build(left: &FlowGraph, left_name: &str, right: &FlowGraph, right_name: &str) -> Self {
        let rows = SEGMENTS
            .iter()
            .chain(END_MARKETS.iter())
            .filter_map(|&category| {
                let (l, r) = (left.target_sum(category), right.target_sum(category));
                (l > 0.0 || r > 0.0).then(|| ComparisonRow {
                    category: category.to_string(),
                    left: l,
                    right: r,
                    difference: l - r,
                })
            })
            .collect();

        Self { left_name: left_name.to_string(), right_name: right_name.to_string(), rows }
    }
}

/// Distinct quarter labels in first-seen order.
pub fn available_quarters(records: &[FlowRecord]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for q in records.iter().filter_map(|r| r.quarter.as_deref()) {
        if !seen.iter().any(|s| s == q) {
            seen.push(q.to_string());
        }
    }
    seen
}

/// Splits a multi-quarter table into the rows of two quarters.
pub fn split_quarters(table: &FlowTable, first: &str, second: &str) -> Result<(Vec<FlowRecord>, Vec<FlowRecord>), LookupError> {
    if !table.has_quarter_column {
        return Err(LookupError::MissingQuarterColumn);
    }

    let rows_for = |quarter: &str| -> Vec<FlowRecord> {
        table.records.iter().filter(|r| r.quarter.as_deref() == Some(quarter)).cloned().collect()
    };
    let (a, b) = (rows_for(first), rows_for(second));

    if a.is_empty() || b.is_empty() {
        let requested = [(first, &a), (second, &b)]
            .iter()
            .filter(|(_, rows)| rows.is_empty())
            .map(|(q, _)| q.to_string())
            .collect();
        return Err(LookupError::QuarterNotFound { requested, available: available_quarters(&table.records) });
    }
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(records: &[(&str, &str, f64)]) -> FlowGraph {
        let recs: Vec<_> = records.iter().map(|&(s, t, v)| FlowRecord::new(s, t, v)).collect();
        FlowGraph::build(&recs).unwrap()
    }

    fn quarterly() -> FlowTable {
        let mut records = Vec::new();
        for (i, q) in ["Q1 FY25", "Q2 FY25", "Q3 FY25", "Q4 FY25"].iter().enumerate() {
            records.push(FlowRecord::new("Total Revenue", "DRAM", 6.0 + i as f64).in_quarter(*q));
            records.push(FlowRecord::new("DRAM", "Mobile", 1.0).in_quarter(*q));
        }
        FlowTable { records, has_quarter_column: true }
    }

    #[test]
    fn test_category_missing_on_one_side_reads_zero() {
        let a = graph(&[("Total Revenue", "DRAM", 6.75), ("DRAM", "Mobile", 1.6)]);
        let b = graph(&[("Total Revenue", "NAND", 2.0)]);
        let summary = ComparisonSummary::build(&a, "Micron", &b, "Kioxia");

        let dram = summary.rows.iter().find(|r| r.category == "DRAM").unwrap();
        assert_eq!((dram.left, dram.right, dram.difference), (6.75, 0.0, 6.75));

        let nand = summary.rows.iter().find(|r| r.category == "NAND").unwrap();
        assert_eq!(nand.difference, -2.0);
    }

    #[test]
    fn test_categories_absent_from_both_are_omitted() {
        let a = graph(&[("Total Revenue", "DRAM", 6.75), ("DRAM", "Mobile", 1.6)]);
        let b = graph(&[("Total Revenue", "DRAM", 5.0)]);
        let summary = ComparisonSummary::build(&a, "A", &b, "B");
        let categories: Vec<_> = summary.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["DRAM", "Mobile"]);
    }

    #[test]
    fn test_split_quarters() {
        let (q1, q2) = split_quarters(&quarterly(), "Q1 FY25", "Q4 FY25").unwrap();
        assert_eq!(q1.len(), 2);
        assert_eq!(q2[0].value, 9.0);
    }

    #[test]
    fn test_unknown_quarter_lists_available() {
        let err = split_quarters(&quarterly(), "Q5 FY25", "Q1 FY25").unwrap_err();
        assert_eq!(
            err,
            LookupError::QuarterNotFound {
                requested: vec!["Q5 FY25".into()],
                available: vec!["Q1 FY25".into(), "Q2 FY25".into(), "Q3 FY25".into(), "Q4 FY25".into()],
            }
        );
        assert!(err.to_string().contains("Q4 FY25"));
    }

    #[test]
    fn test_table_without_quarter_column() {
        let table = FlowTable { records: vec![FlowRecord::new("A", "B", 1.0)], has_quarter_column: false };
        assert_eq!(split_quarters(&table, "Q1", "Q2").unwrap_err(), LookupError::MissingQuarterColumn);
    }
}
