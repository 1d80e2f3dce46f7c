//! Pre-filled input files and the built-in demo dataset.

use super::types::FlowRecord;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATE_PATH: &str = "revenue_template.csv";

const TEMPLATE_END_MARKETS: [&str; 5] = ["AI/Datacenter", "Mobile", "Enterprise", "PC", "Automotive"];

/// Segment breakdown reported by each company. Unknown companies use Micron's.
pub fn company_segments(company: &str) -> &'static [&'static str] {
    match company.to_lowercase().as_str() {
        "sk hynix" => &["DRAM", "NAND Flash", "Others"],
        "samsung" => &["Memory", "System LSI", "Foundry"],
        _ => &["DRAM", "NAND", "Other"],
    }
}

/// The generic three-layer template. Zero values are dropped by the loader,
/// so an unedited template loads as an empty table.
pub fn generic_template() -> String {
    let mut out = String::new();
    out.push_str("# Revenue Flow Template\n");
    out.push_str("# Fill in revenue values in billions USD\n");
    out.push_str("# Lines starting with # are comments and will be ignored\n");
    out.push_str("#\n");
    out.push_str("source,target,value\n");
    out.push_str("# Layer 1: Total Revenue to Segments\n");
    for seg in ["DRAM", "NAND", "Emerging"] {
        let _ = writeln!(out, "Total Revenue,{seg},0.0");
    }
    for seg in ["DRAM", "NAND"] {
        out.push_str("#\n");
        let _ = writeln!(out, "# Layer 2: {seg} to End Markets");
        for market in TEMPLATE_END_MARKETS {
            let _ = writeln!(out, "{seg},{market},0.0");
        }
    }
    out.push_str("#\n");
    out.push_str("# Layer 2: Emerging to End Markets (optional)\n");
    out.push_str("# Emerging,AI/Datacenter,0.0\n");
    out.push_str("# Emerging,Industrial,0.0\n");
    out.push_str("#\n");
    out.push_str("# Layer 3: End Markets to Profitability (optional)\n");
    out.push_str("# AI/Datacenter,Gross Profit,0.0\n");
    out.push_str("# AI/Datacenter,COGS,0.0\n");
    out
}

/// A template laid out with the company's own segment names.
pub fn company_template(company: &str) -> String {
    let segments = company_segments(company);
    let mut out = String::new();
    let _ = writeln!(out, "# {company} Revenue Flow Template");
    out.push_str("# Fill in revenue values in billions USD\n");
    out.push_str("#\n");
    out.push_str("source,target,value\n");
    out.push_str("#\n");
    out.push_str("# Layer 1: Total Revenue to Segments\n");
    for seg in segments {
        let _ = writeln!(out, "Total Revenue,{seg},0.0");
    }
    out.push_str("#\n");
    for seg in segments.iter().filter(|s| !matches!(s.to_lowercase().as_str(), "other" | "others")) {
        let _ = writeln!(out, "# Layer 2: {seg} to End Markets");
        for market in TEMPLATE_END_MARKETS {
            let _ = writeln!(out, "{seg},{market},0.0");
        }
        out.push_str("#\n");
    }
    out
}

/// Default output name for a company template, e.g. `sk_hynix_revenue_template.csv`.
pub fn company_template_path(company: &str) -> PathBuf {
    PathBuf::from(format!("{}_revenue_template.csv", company.to_lowercase().replace(' ', "_")))
}

pub fn write_template(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}

/// Micron Q2 FY25 revenue flows, in billions USD.
pub fn sample_records() -> Vec<FlowRecord> {
    const ROWS: [(&str, &str, f64); 15] = [
        // Layer 1: Total -> Segments (~$8.7B)
        ("Total Revenue", "DRAM", 6.75),
        ("Total Revenue", "NAND", 1.85),
        ("Total Revenue", "Emerging", 0.10),
        // Layer 2: DRAM -> End Markets
        ("DRAM", "AI/Datacenter", 3.50),
        ("DRAM", "Mobile", 1.60),
        ("DRAM", "Enterprise", 0.85),
        ("DRAM", "PC", 0.65),
        ("DRAM", "Automotive", 0.15),
        // Layer 2: NAND -> End Markets
        ("NAND", "AI/Datacenter", 0.70),
        ("NAND", "Mobile", 0.50),
        ("NAND", "Enterprise", 0.35),
        ("NAND", "PC", 0.25),
        ("NAND", "Automotive", 0.05),
        // Layer 2: Emerging
        ("Emerging", "AI/Datacenter", 0.08),
        ("Emerging", "Industrial", 0.02),
    ];
    ROWS.iter().map(|&(s, t, v)| FlowRecord::new(s, t, v)).collect()
}
