//! loader.rs
//! Reads `source,target,value[,quarter]` tables into `FlowRecord`s.
//!
//! Cleaning rules: `#` lines are comments, blank lines are skipped, and rows
//! whose value is missing, non-numeric or `<= 0` are dropped without error.
//! Rows with an empty label are dropped the same way.

use super::taxonomy::{is_segment, normalize_end_market};
use super::types::FlowRecord;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const REQUIRED_COLUMNS: [&str; 3] = ["source", "target", "value"];
pub const QUARTER_COLUMN: &str = "quarter";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("missing required column(s) {missing:?}; expected columns: source, target, value")]
    MissingColumns { missing: Vec<String> },
    #[error("self-loop at line {line}: '{label}' flows into itself")]
    SelfLoop { line: u64, label: String },
    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON in '{path}': {source}")]
    Json { path: PathBuf, #[source] source: serde_json::Error },
}

/// A cleaned flow table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowTable {
    pub records: Vec<FlowRecord>,
    /// Whether the header carried a `quarter` column. Quarterly comparison is
    /// unavailable without it.
    pub has_quarter_column: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Loader {
    canonicalize_markets: bool,
}

impl Loader {
    pub fn new() -> Self { Self::default() }

    /// Map free-form target labels onto the standard end-market names.
    /// Only targets of segment-to-market edges are rewritten; layer-1
    /// segment names and profitability nodes are left alone. A rewrite
    /// that would turn the row into a self-loop is skipped.
    pub fn canonicalize_markets(mut self, enabled: bool) -> Self {
        self.canonicalize_markets = enabled;
        self
    }

    pub fn load(&self, path: &Path) -> Result<FlowTable, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        let table = self.load_from_reader(file)?;
        info!(path = %path.display(), records = table.records.len(), "loaded flow records");
        Ok(table)
    }

    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<FlowTable, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let (Some(src_col), Some(tgt_col), Some(val_col)) = (column("source"), column("target"), column("value")) else {
            let missing = REQUIRED_COLUMNS
                .iter()
                .copied()
                .filter(|&c| column(c).is_none())
                .map(|c| c.to_string())
                .collect();
            return Err(LoadError::MissingColumns { missing });
        };
        let quarter_col = column(QUARTER_COLUMN);

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for row in rdr.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let source = row.get(src_col).unwrap_or("");
            let target = row.get(tgt_col).unwrap_or("");
            let value = row.get(val_col).and_then(|v| v.parse::<f64>().ok());

            let value = match value {
                Some(v) if v.is_finite() && v > 0.0 && !source.is_empty() && !target.is_empty() => v,
                _ => {
                    debug!(line, "dropping row with empty label or non-positive value");
                    dropped += 1;
                    continue;
                }
            };

            if source == target {
                return Err(LoadError::SelfLoop { line, label: target.to_string() });
            }

            let target = match self.canonicalize_markets && is_segment(source) {
                true => {
                    let canonical = normalize_end_market(target);
                    if canonical == source {
                        debug!(line, target, "canonical name would loop back to its source; keeping it as written");
                        target.to_string()
                    } else {
                        canonical
                    }
                }
                false => target.to_string(),
            };

            let quarter = quarter_col
                .and_then(|q| row.get(q))
                .filter(|q| !q.is_empty())
                .map(str::to_string);

            records.push(FlowRecord { source: source.to_string(), target, value, quarter });
        }

        if dropped > 0 {
            debug!(dropped, "rows excluded by the cleaning rules");
        }

        Ok(FlowTable { records, has_quarter_column: quarter_col.is_some() })
    }
}

/// Shorthand for `Loader::new().load(path)`.
pub fn load_flows(path: &Path) -> Result<FlowTable, LoadError> {
    Loader::new().load(path)
}

/// Writes records in the format `Loader` reads. A `quarter` column is emitted
/// only if at least one record carries a quarter.
pub fn write_records<W: Write>(writer: W, records: &[FlowRecord]) -> Result<(), LoadError> {
    let with_quarter = records.iter().any(|r| r.quarter.is_some());
    let mut wtr = csv::Writer::from_writer(writer);

    if with_quarter {
        wtr.write_record(["source", "target", "value", QUARTER_COLUMN])?;
    } else {
        wtr.write_record(REQUIRED_COLUMNS)?;
    }

    for r in records {
        let value = r.value.to_string();
        if with_quarter {
            wtr.write_record([r.source.as_str(), r.target.as_str(), value.as_str(), r.quarter.as_deref().unwrap_or("")])?;
        } else {
            wtr.write_record([r.source.as_str(), r.target.as_str(), value.as_str()])?;
        }
    }
    wtr.flush().map_err(|e| LoadError::Csv(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load_str(s: &str) -> Result<FlowTable, LoadError> {
        Loader::new().load_from_reader(Cursor::new(s.as_bytes().to_vec()))
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let input = "# Revenue Flow Template\n#\nsource,target,value\n# Layer 1\nTotal Revenue,DRAM,6.75\n\nTotal Revenue,NAND,1.85\n";
        let table = load_str(input).unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0], FlowRecord::new("Total Revenue", "DRAM", 6.75));
        assert!(!table.has_quarter_column);
    }

    #[test]
    fn test_zero_value_row_is_excluded() {
        let input = "source,target,value\n\"DRAM\",\"Mobile\",0\n\"DRAM\",\"PC\",0.65\n";
        let table = load_str(input).unwrap();
        assert_eq!(table.records, vec![FlowRecord::new("DRAM", "PC", 0.65)]);
    }

    #[test]
    fn test_negative_non_numeric_and_partial_rows_are_excluded() {
        let input = "source,target,value\nDRAM,Mobile,-1\nDRAM,PC,n/a\nDRAM,Auto\nNAND,,0.3\nNAND,Mobile,0.5\n";
        let table = load_str(input).unwrap();
        assert_eq!(table.records, vec![FlowRecord::new("NAND", "Mobile", 0.5)]);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let err = load_str("from,to,value\nA,B,1\n").unwrap_err();
        match err {
            LoadError::MissingColumns { missing } => assert_eq!(missing, vec!["source", "target"]),
            other => panic!("Wrong error type: {other}"),
        }
    }

    #[test]
    fn test_self_loop_is_rejected() {
        let err = load_str("source,target,value\nDRAM,DRAM,1.0\n").unwrap_err();
        assert!(matches!(err, LoadError::SelfLoop { ref label, .. } if label == "DRAM"), "Msg: {}", err);
    }

    #[test]
    fn test_quarter_column_is_read() {
        let input = "source,target,value,quarter\nTotal Revenue,DRAM,6.0,Q1 FY25\nTotal Revenue,DRAM,6.5,Q2 FY25\n";
        let table = load_str(input).unwrap();
        assert!(table.has_quarter_column);
        assert_eq!(table.records[1].quarter.as_deref(), Some("Q2 FY25"));
    }

    #[test]
    fn test_canonicalize_markets_rewrites_layer_two_targets_only() {
        let input = "source,target,value\nTotal Revenue,Other,0.1\nDRAM,Data Center,3.5\nDRAM,Client,0.6\n";
        let table = Loader::new()
            .canonicalize_markets(true)
            .load_from_reader(Cursor::new(input.as_bytes().to_vec()))
            .unwrap();
        let targets: Vec<_> = table.records.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["Other", "AI/Datacenter", "PC"]);
    }

    #[test]
    fn test_canonicalize_markets_leaves_profit_layer_alone() {
        let input = "source,target,value\nTotal Revenue,DRAM,6.75\nDRAM,server,3.5\nAI/Datacenter,COGS,1\nAI/Datacenter,Gross Profit,2.5\nNAND Flash,cloud,0.7\n";
        let table = Loader::new()
            .canonicalize_markets(true)
            .load_from_reader(Cursor::new(input.as_bytes().to_vec()))
            .unwrap();
        let targets: Vec<_> = table.records.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["DRAM", "AI/Datacenter", "COGS", "Gross Profit", "AI/Datacenter"]);
    }

    #[test]
    fn test_canonical_name_never_creates_a_self_loop() {
        let input = "source,target,value\nOther,smartphone,1\nOther,other,0.5\nMobile,smartphone,1\n";
        let table = Loader::new()
            .canonicalize_markets(true)
            .load_from_reader(Cursor::new(input.as_bytes().to_vec()))
            .unwrap();
        let targets: Vec<_> = table.records.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["Mobile", "other", "smartphone"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_flows(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_write_then_load_preserves_records() {
        let records = vec![
            FlowRecord::new("Total Revenue", "DRAM", 6.75),
            FlowRecord::new("Total Revenue", "NAND", 1.85),
            FlowRecord::new("DRAM", "AI/Datacenter, HBM", 1.0 / 3.0),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flows.csv");
        write_records(File::create(&path).unwrap(), &records).unwrap();

        let reloaded = load_flows(&path).unwrap().records;
        assert_eq!(reloaded.len(), records.len());
        for (a, b) in records.iter().zip(&reloaded) {
            assert_eq!(a.source, b.source);
            assert_eq!(a.target, b.target);
            assert!((a.value - b.value).abs() < 1e-12);
        }
    }
}
