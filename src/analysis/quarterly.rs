//! Quarter-over-quarter and year-over-year trends from a company's
//! historical results table.
//!
//! Input columns follow the earnings-history layout (`Quarter`,
//! `Fiscal_Year`, `Date`, `Revenue_Total_B`, ...). Every metric column is
//! optional and an empty cell means "not reported yet".

use crate::store::LoadError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

pub const HISTORY_TEMPLATE_PATH: &str = "historical_data_template.csv";
pub const DEFAULT_QUARTERS: usize = 4;

/// Quarters between a period and the same period one year earlier.
const YEAR_LAG: usize = 4;

const REVENUE_SWING_PCT: f64 = 5.0;
const MARGIN_SWING_PP: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterRecord {
    #[serde(rename = "Quarter")]
    pub quarter: String,
    #[serde(rename = "Fiscal_Year")]
    pub fiscal_year: i32,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Revenue_Total_B", default)]
    pub revenue_total: Option<f64>,
    #[serde(rename = "Revenue_DRAM_B", default)]
    pub revenue_dram: Option<f64>,
    #[serde(rename = "Revenue_NAND_B", default)]
    pub revenue_nand: Option<f64>,
    #[serde(rename = "Gross_Margin_Pct", default)]
    pub gross_margin: Option<f64>,
    #[serde(rename = "Operating_Margin_Pct", default)]
    pub operating_margin: Option<f64>,
    #[serde(rename = "DRAM_Bit_Growth_QoQ", default)]
    pub dram_bit_growth: Option<f64>,
    #[serde(rename = "DRAM_ASP_Change_QoQ", default)]
    pub dram_asp_change: Option<f64>,
    #[serde(rename = "NAND_Bit_Growth_QoQ", default)]
    pub nand_bit_growth: Option<f64>,
    #[serde(rename = "NAND_ASP_Change_QoQ", default)]
    pub nand_asp_change: Option<f64>,
    #[serde(rename = "CapEx_B", default)]
    pub capex: Option<f64>,
    #[serde(rename = "Guidance_Revenue_Low_B", default)]
    pub guidance_low: Option<f64>,
    #[serde(rename = "Guidance_Revenue_High_B", default)]
    pub guidance_high: Option<f64>,
}

impl QuarterRecord {
    /// `Q4 FY24`
    pub fn label(&self) -> String {
        format!("{} FY{:02}", self.quarter, self.fiscal_year.rem_euclid(100))
    }
}

pub fn load_history(path: &Path) -> Result<Vec<QuarterRecord>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let records = load_history_from_reader(file)?;
    info!(path = %path.display(), quarters = records.len(), "loaded quarterly history");
    Ok(records)
}

pub fn load_history_from_reader<R: Read>(reader: R) -> Result<Vec<QuarterRecord>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);
    let records = rdr.deserialize().collect::<Result<Vec<QuarterRecord>, _>>()?;
    Ok(records)
}

/// Writes `sample_history()` as a starting point for real figures.
pub fn write_history_template(path: &Path) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in sample_history() {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

/// Illustrative Micron history, FY24 Q4 through FY25 Q3. The last quarter
/// is dated but not yet reported.
pub fn sample_history() -> Vec<QuarterRecord> {
    let row = |quarter: &str, fiscal_year: i32, (y, m, d): (i32, u32, u32), metrics: Option<[f64; 12]>| {
        let m12 = metrics.map(|vals| vals.map(Some)).unwrap_or([None; 12]);
        QuarterRecord {
            quarter: quarter.to_string(),
            fiscal_year,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
            revenue_total: m12[0],
            revenue_dram: m12[1],
            revenue_nand: m12[2],
            gross_margin: m12[3],
            operating_margin: m12[4],
            dram_bit_growth: m12[5],
            dram_asp_change: m12[6],
            nand_bit_growth: m12[7],
            nand_asp_change: m12[8],
            capex: m12[9],
            guidance_low: m12[10],
            guidance_high: m12[11],
        }
    };
    vec![
        row("Q4", 2024, (2024, 8, 31), Some([7.75, 5.58, 2.05, 34.8, 19.2, 2.0, 15.0, -2.0, 12.0, 2.4, 8.5, 8.9])),
        row("Q1", 2025, (2024, 11, 30), Some([8.71, 6.32, 2.26, 39.6, 24.5, 5.0, 8.0, 7.0, 5.0, 2.6, 8.9, 9.3])),
        row("Q2", 2025, (2025, 2, 28), Some([9.08, 6.75, 2.20, 42.1, 27.8, 4.0, 3.0, 2.0, -1.0, 2.8, 9.2, 9.6])),
        row("Q3", 2025, (2025, 5, 31), None),
    ]
}

/// Percent change from `previous` to `current`. `None` when either side is
/// missing or the base is zero.
pub fn pct_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(c), Some(p)) if p != 0.0 => Some((c - p) / p * 100.0),
        _ => None,
    }
}

fn share(part: Option<f64>, total: Option<f64>) -> Option<f64> {
    match (part, total) {
        (Some(p), Some(t)) if t != 0.0 => Some((p / t * 1000.0).round() / 10.0),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Change {
    pub qoq: Option<f64>,
    pub yoy: Option<f64>,
}

/// One quarter with its changes against the previous quarter and the same
/// quarter a year earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterTrend {
    pub record: QuarterRecord,
    pub revenue: Change,
    pub dram: Change,
    pub nand: Change,
    /// Relative change of the margin percentage, not percentage points.
    pub gross_margin_qoq: Option<f64>,
    pub operating_margin_qoq: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRow {
    pub quarter: String,
    pub revenue: Option<f64>,
    pub qoq: Option<f64>,
    pub yoy: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub capex: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRow {
    pub quarter: String,
    pub dram: Option<f64>,
    pub nand: Option<f64>,
    pub dram_bits: Option<f64>,
    pub dram_asp: Option<f64>,
    pub nand_bits: Option<f64>,
    pub nand_asp: Option<f64>,
    /// Share of total revenue, rounded to one decimal.
    pub dram_mix: Option<f64>,
    pub nand_mix: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendInsight {
    RevenueGrowth(f64),
    RevenueDecline(f64),
    MarginExpansion { change: f64, latest: f64 },
    MarginCompression { change: f64, latest: f64 },
    DramMix(f64),
}

impl fmt::Display for TrendInsight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RevenueGrowth(pct) => write!(f, "Strong revenue growth: +{pct:.1}% QoQ"),
            Self::RevenueDecline(pct) => write!(f, "Revenue decline: {pct:.1}% QoQ"),
            Self::MarginExpansion { change, latest } => write!(f, "Margin expansion: +{change:.1}pp to {latest:.1}%"),
            Self::MarginCompression { change, latest } => write!(f, "Margin compression: {change:.1}pp to {latest:.1}%"),
            Self::DramMix(pct) => write!(f, "DRAM mix: {pct:.1}% of revenue"),
        }
    }
}

/// A company's quarters in date order, with changes precomputed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuarterlyHistory {
    pub quarters: Vec<QuarterTrend>,
}

impl QuarterlyHistory {
    pub fn build(mut records: Vec<QuarterRecord>) -> Self {
        records.sort_by_key(|r| r.date);

        let quarters = (0..records.len())
            .map(|i| {
                let r = &records[i];
                let prev = i.checked_sub(1).map(|j| &records[j]);
                let year_ago = i.checked_sub(YEAR_LAG).map(|j| &records[j]);
                let change = |field: fn(&QuarterRecord) -> Option<f64>| Change {
                    qoq: pct_change(field(r), prev.and_then(field)),
                    yoy: pct_change(field(r), year_ago.and_then(field)),
                };
                QuarterTrend {
                    revenue: change(|q| q.revenue_total),
                    dram: change(|q| q.revenue_dram),
                    nand: change(|q| q.revenue_nand),
                    gross_margin_qoq: pct_change(r.gross_margin, prev.and_then(|p| p.gross_margin)),
                    operating_margin_qoq: pct_change(r.operating_margin, prev.and_then(|p| p.operating_margin)),
                    record: r.clone(),
                }
            })
            .collect();
        Self { quarters }
    }

    pub fn is_empty(&self) -> bool { self.quarters.is_empty() }

    /// The last `n` quarters, oldest first.
    pub fn recent(&self, n: usize) -> &[QuarterTrend] {
        &self.quarters[self.quarters.len().saturating_sub(n)..]
    }

    pub fn performance_rows(&self, n: usize) -> Vec<PerformanceRow> {
        self.recent(n)
            .iter()
            .map(|t| PerformanceRow {
                quarter: t.record.label(),
                revenue: t.record.revenue_total,
                qoq: t.revenue.qoq,
                yoy: t.revenue.yoy,
                gross_margin: t.record.gross_margin,
                operating_margin: t.record.operating_margin,
                capex: t.record.capex,
            })
            .collect()
    }

    pub fn segment_rows(&self, n: usize) -> Vec<SegmentRow> {
        self.recent(n)
            .iter()
            .map(|t| {
                let r = &t.record;
                SegmentRow {
                    quarter: r.label(),
                    dram: r.revenue_dram,
                    nand: r.revenue_nand,
                    dram_bits: r.dram_bit_growth,
                    dram_asp: r.dram_asp_change,
                    nand_bits: r.nand_bit_growth,
                    nand_asp: r.nand_asp_change,
                    dram_mix: share(r.revenue_dram, r.revenue_total),
                    nand_mix: share(r.revenue_nand, r.revenue_total),
                }
            })
            .collect()
    }

    /// Headline movements between the two most recent reported quarters.
    /// Quarters without total revenue are not reported yet and are skipped.
    pub fn insights(&self) -> Vec<TrendInsight> {
        let mut reported = self.quarters.iter().rev().map(|t| &t.record).filter(|r| r.revenue_total.is_some());
        let Some(latest) = reported.next() else {
            return Vec::new();
        };
        let prior = reported.next();
        let mut out = Vec::new();

        if let Some(change) = pct_change(latest.revenue_total, prior.and_then(|p| p.revenue_total)) {
            if change > REVENUE_SWING_PCT {
                out.push(TrendInsight::RevenueGrowth(change));
            } else if change < -REVENUE_SWING_PCT {
                out.push(TrendInsight::RevenueDecline(change));
            }
        }

        if let (Some(now), Some(before)) = (latest.gross_margin, prior.and_then(|p| p.gross_margin)) {
            let change = now - before;
            if change > MARGIN_SWING_PP {
                out.push(TrendInsight::MarginExpansion { change, latest: now });
            } else if change < -MARGIN_SWING_PP {
                out.push(TrendInsight::MarginCompression { change, latest: now });
            }
        }

        if let (Some(dram), Some(total)) = (latest.revenue_dram, latest.revenue_total) {
            if total != 0.0 {
                out.push(TrendInsight::DramMix(dram / total * 100.0));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    const HEADER: &str = "Quarter,Fiscal_Year,Date,Revenue_Total_B,Revenue_DRAM_B,Revenue_NAND_B,Gross_Margin_Pct";

    fn history(rows: &[&str]) -> QuarterlyHistory {
        let input = format!("{HEADER}\n{}\n", rows.join("\n"));
        QuarterlyHistory::build(load_history_from_reader(Cursor::new(input.into_bytes())).unwrap())
    }

    #[rstest]
    #[case(Some(11.0), Some(10.0), Some(10.0))]
    #[case(Some(9.0), Some(10.0), Some(-10.0))]
    #[case(Some(1.0), Some(0.0), None)]
    #[case(None, Some(10.0), None)]
    #[case(Some(1.0), None, None)]
    fn test_pct_change(#[case] current: Option<f64>, #[case] previous: Option<f64>, #[case] expected: Option<f64>) {
        let got = pct_change(current, previous);
        match (got, expected) {
            (Some(g), Some(e)) => assert!((g - e).abs() < 1e-9, "{g} != {e}"),
            _ => assert_eq!(got, expected),
        }
    }

    #[test]
    fn test_rows_sorted_by_date_before_changes() {
        let h = history(&[
            "Q2,2025,2025-02-28,9.0,6.0,2.0,42",
            "Q1,2025,2024-11-30,8.0,6.0,2.0,40",
        ]);
        let labels: Vec<_> = h.quarters.iter().map(|t| t.record.label()).collect();
        assert_eq!(labels, vec!["Q1 FY25", "Q2 FY25"]);
        assert_eq!(h.quarters[0].revenue.qoq, None);
        assert!((h.quarters[1].revenue.qoq.unwrap() - 12.5).abs() < 1e-9);
        assert!((h.quarters[1].gross_margin_qoq.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_year_over_year_looks_four_quarters_back() {
        let h = history(&[
            "Q1,2024,2023-11-30,4.0,,,",
            "Q2,2024,2024-02-29,5.0,,,",
            "Q3,2024,2024-05-31,6.0,,,",
            "Q4,2024,2024-08-31,7.0,,,",
            "Q1,2025,2024-11-30,8.0,,,",
        ]);
        assert_eq!(h.quarters[3].revenue.yoy, None);
        assert!((h.quarters[4].revenue.yoy.unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(h.quarters[4].dram, Change::default());
    }

    #[test]
    fn test_tables_take_the_most_recent_quarters() {
        let h = QuarterlyHistory::build(sample_history());
        let perf = h.performance_rows(2);
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].quarter, "Q2 FY25");
        assert_eq!(perf[0].revenue, Some(9.08));
        assert_eq!(perf[1].revenue, None);
        assert_eq!(perf[1].qoq, None);

        let seg = h.segment_rows(DEFAULT_QUARTERS);
        assert_eq!(seg.len(), 4);
        assert_eq!(seg[0].dram_mix, Some(72.0));
        assert_eq!(seg[0].nand_mix, Some(26.5));
        assert_eq!(seg[2].nand_asp, Some(-1.0));
        assert_eq!(h.performance_rows(10).len(), 4);
    }

    #[test]
    fn test_insights_use_latest_reported_quarters() {
        let h = QuarterlyHistory::build(sample_history());
        let text: Vec<String> = h.insights().iter().map(ToString::to_string).collect();
        // Q3 FY25 has no figures; Q2 vs Q1 is +4.2% revenue and +2.5pp margin.
        assert_eq!(text, vec!["Margin expansion: +2.5pp to 42.1%", "DRAM mix: 74.3% of revenue"]);
    }

    #[rstest]
    #[case(&["Q1,2025,2024-11-30,8,6,2,40", "Q2,2025,2025-02-28,9,6,2,40"], "Strong revenue growth: +12.5% QoQ")]
    #[case(&["Q1,2025,2024-11-30,10,6,2,40", "Q2,2025,2025-02-28,9,6,2,40"], "Revenue decline: -10.0% QoQ")]
    #[case(&["Q1,2025,2024-11-30,9,6,2,40", "Q2,2025,2025-02-28,9,6,2,37"], "Margin compression: -3.0pp to 37.0%")]
    fn test_insight_thresholds(#[case] rows: &[&str], #[case] expected: &str) {
        let text: Vec<String> = history(rows).insights().iter().map(ToString::to_string).collect();
        assert_eq!(text[0], expected);
    }

    #[test]
    fn test_single_quarter_only_reports_mix() {
        let h = history(&["Q1,2025,2024-11-30,8,6,2,40"]);
        assert_eq!(h.insights(), vec![TrendInsight::DramMix(75.0)]);
        assert!(history(&[]).insights().is_empty());
    }

    #[test]
    fn test_template_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_TEMPLATE_PATH);
        write_history_template(&path).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("Quarter,Fiscal_Year,Date,Revenue_Total_B"));
        assert_eq!(load_history(&path).unwrap(), sample_history());
    }

    #[test]
    fn test_bad_date_is_a_table_error() {
        let input = format!("{HEADER}\nQ1,2025,last tuesday,8,6,2,40\n");
        let err = load_history_from_reader(Cursor::new(input.into_bytes())).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }
}
