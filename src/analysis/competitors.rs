//! Side-by-side competitor tables for battle cards.
//!
//! Each competitor's figures come from `<name>_data.json` with optional
//! `financials`, `technology` and `market_position` objects. Anything
//! missing, including the whole file, shows up as `N/A`.

use crate::store::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const COMPETITOR_TEMPLATE_PATH: &str = "competitor_comparison_template.csv";
pub const NOT_AVAILABLE: &str = "N/A";

/// A reported figure: numbers for financials and shares, text for
/// technology generations and qualitative positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Number(f64),
    Flag(bool),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(x) => write!(f, "{x}"),
            Self::Flag(b) => write!(f, "{}", if *b { "Yes" } else { "No" }),
            Self::Text(s) => f.write_str(s),
        }
    }
}

pub type MetricMap = HashMap<String, MetricValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorProfile {
    pub financials: MetricMap,
    pub technology: MetricMap,
    pub market_position: MetricMap,
}

/// `SK Hynix` -> `<dir>/sk_hynix_data.json`
pub fn profile_path(dir: &Path, competitor: &str) -> PathBuf {
    dir.join(format!("{}_data.json", competitor.to_lowercase().replace(' ', "_")))
}

/// Reads a competitor's profile. A missing file is not an error: the
/// competitor's column is filled with `N/A`.
pub fn load_profile(dir: &Path, competitor: &str) -> Result<CompetitorProfile, LoadError> {
    let path = profile_path(dir, competitor);
    if !path.is_file() {
        warn!(competitor, path = %path.display(), "competitor data file not found");
        return Ok(CompetitorProfile::default());
    }
    let content = fs::read_to_string(&path).map_err(|source| LoadError::Io { path: path.clone(), source })?;
    let profile = serde_json::from_str(&content).map_err(|source| LoadError::Json { path: path.clone(), source })?;
    debug!(competitor, path = %path.display(), "loaded competitor profile");
    Ok(profile)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Financial,
    Technology,
    Market,
}

const FINANCIAL_ROWS: [(&str, &str); 10] = [
    ("Total Revenue ($B)", "total_revenue_billions"),
    ("Memory Revenue ($B)", "memory_revenue_billions"),
    ("DRAM Revenue ($B)", "dram_revenue_billions"),
    ("NAND Revenue ($B)", "nand_revenue_billions"),
    ("Gross Margin (%)", "gross_margin_percent"),
    ("Operating Margin (%)", "operating_margin_percent"),
    ("R&D Spending ($B)", "rd_spending_billions"),
    ("R&D % of Revenue", "rd_percent_revenue"),
    ("CapEx ($B)", "capex_billions"),
    ("Market Cap ($B)", "market_cap_billions"),
];

const TECHNOLOGY_ROWS: [(&str, &str); 8] = [
    ("DRAM Node (Leading Edge)", "dram_node"),
    ("HBM Generation (Production)", "hbm_production"),
    ("HBM Generation (Development)", "hbm_development"),
    ("DDR5 Status", "ddr5_status"),
    ("LPDDR Generation", "lpddr_gen"),
    ("NAND Layers (Production)", "nand_layers_production"),
    ("NAND Layers (Development)", "nand_layers_development"),
    ("CXL Memory", "cxl_status"),
];

const MARKET_ROWS: [(&str, &str); 7] = [
    ("DRAM Market Share (%)", "dram_share"),
    ("NAND Market Share (%)", "nand_share"),
    ("HBM Market Share (%)", "hbm_share"),
    ("AI/Datacenter Position", "ai_datacenter"),
    ("Mobile DRAM Position", "mobile_dram"),
    ("Enterprise SSD Position", "enterprise_ssd"),
    ("Automotive Memory Position", "automotive"),
];

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Self::Financial => "Financial Comparison",
            Self::Technology => "Technology Comparison",
            Self::Market => "Market Position Comparison",
        }
    }

    /// Header of the row-label column.
    pub fn label_header(self) -> &'static str {
        match self {
            Self::Financial => "Metric",
            Self::Technology => "Technology",
            Self::Market => "Segment",
        }
    }

    /// `(row label, JSON key)` pairs, in display order.
    fn rows(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Financial => &FINANCIAL_ROWS,
            Self::Technology => &TECHNOLOGY_ROWS,
            Self::Market => &MARKET_ROWS,
        }
    }

    fn metrics(self, profile: &CompetitorProfile) -> &MetricMap {
        match self {
            Self::Financial => &profile.financials,
            Self::Technology => &profile.technology,
            Self::Market => &profile.market_position,
        }
    }
}

/// Which tables `competitors` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MetricSet {
    #[default]
    All,
    Financial,
    Technology,
    Market,
}

impl MetricSet {
    pub fn sections(self) -> &'static [Section] {
        match self {
            Self::All => &[Section::Financial, Section::Technology, Section::Market],
            Self::Financial => &[Section::Financial],
            Self::Technology => &[Section::Technology],
            Self::Market => &[Section::Market],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub label: String,
    /// One cell per competitor, in column order.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub section: Section,
    pub competitors: Vec<String>,
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn build(section: Section, profiles: &[(String, CompetitorProfile)]) -> Self {
        let rows = section
            .rows()
            .iter()
            .map(|&(label, key)| MetricRow {
                label: label.to_string(),
                values: profiles
                    .iter()
                    .map(|(_, p)| section.metrics(p).get(key).map_or_else(|| NOT_AVAILABLE.to_string(), ToString::to_string))
                    .collect(),
            })
            .collect();
        Self { section, competitors: profiles.iter().map(|(name, _)| name.clone()).collect(), rows }
    }
}

/// Loads every competitor once and builds the requested tables.
pub fn compare_competitors(dir: &Path, competitors: &[String], metrics: MetricSet) -> Result<Vec<MetricTable>, LoadError> {
    let profiles = competitors
        .iter()
        .map(|name| Ok((name.clone(), load_profile(dir, name)?)))
        .collect::<Result<Vec<_>, LoadError>>()?;
    Ok(metrics.sections().iter().map(|&s| MetricTable::build(s, &profiles)).collect())
}

/// `"Micron, Samsung,,SK Hynix"` -> `["Micron", "Samsung", "SK Hynix"]`
pub fn parse_competitors(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|c| !c.is_empty()).map(str::to_string).collect()
}

#[derive(Debug, Serialize)]
struct TemplateRow {
    competitor: &'static str,
    total_revenue_billions: f64,
    memory_revenue_billions: f64,
    dram_revenue_billions: f64,
    nand_revenue_billions: f64,
    gross_margin_percent: f64,
    operating_margin_percent: f64,
    rd_spending_billions: f64,
    capex_billions: f64,
    dram_market_share: u32,
    nand_market_share: u32,
    hbm_market_share: u32,
    dram_node: &'static str,
    hbm_production: &'static str,
    nand_layers: u32,
}

/// Writes an illustrative one-row-per-competitor sheet to fill in.
pub fn write_competitor_template(path: &Path) -> Result<(), LoadError> {
    let rows = [
        TemplateRow {
            competitor: "Micron",
            total_revenue_billions: 25.0,
            memory_revenue_billions: 24.0,
            dram_revenue_billions: 15.0,
            nand_revenue_billions: 9.0,
            gross_margin_percent: 28.5,
            operating_margin_percent: 15.2,
            rd_spending_billions: 2.5,
            capex_billions: 7.5,
            dram_market_share: 23,
            nand_market_share: 14,
            hbm_market_share: 10,
            dram_node: "1β",
            hbm_production: "HBM3",
            nand_layers: 232,
        },
        TemplateRow {
            competitor: "Samsung",
            total_revenue_billions: 35.0,
            memory_revenue_billions: 33.0,
            dram_revenue_billions: 20.0,
            nand_revenue_billions: 13.0,
            gross_margin_percent: 35.2,
            operating_margin_percent: 22.1,
            rd_spending_billions: 3.8,
            capex_billions: 9.2,
            dram_market_share: 42,
            nand_market_share: 34,
            hbm_market_share: 25,
            dram_node: "1β",
            hbm_production: "HBM3E",
            nand_layers: 236,
        },
        TemplateRow {
            competitor: "SK Hynix",
            total_revenue_billions: 30.0,
            memory_revenue_billions: 28.0,
            dram_revenue_billions: 20.0,
            nand_revenue_billions: 8.0,
            gross_margin_percent: 32.1,
            operating_margin_percent: 20.3,
            rd_spending_billions: 3.2,
            capex_billions: 8.1,
            dram_market_share: 29,
            nand_market_share: 20,
            hbm_market_share: 60,
            dram_node: "1β",
            hbm_production: "HBM3E",
            nand_layers: 238,
        },
    ];

    let mut wtr = csv::Writer::from_path(path)?;
    for row in &rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}
