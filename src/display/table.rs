//! Plain-text and markdown rendering of the summary, comparison, quarterly
//! and competitor tables.

use crate::analysis::competitors::NOT_AVAILABLE;
use crate::analysis::{ComparisonSummary, MetricTable, QuarterlyHistory, ShareTable, SummaryTables};
use chrono::NaiveDateTime;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Plain,
    Markdown,
}

/// Lays out a grid. Plain text left-aligns the first column and right-aligns
/// the rest; markdown marks the numeric columns as right-aligned.
fn render_grid(headers: &[String], rows: &[Vec<String>], format: TableFormat) -> String {
    let mut out = String::new();
    match format {
        TableFormat::Plain => {
            let widths: Vec<usize> = (0..headers.len())
                .map(|c| rows.iter().map(|r| r[c].chars().count()).chain([headers[c].chars().count()]).max().unwrap_or(0))
                .collect();
            let line = |cells: &[String]| -> String {
                cells
                    .iter()
                    .enumerate()
                    .map(|(c, cell)| if c == 0 { format!("{:<w$}", cell, w = widths[c]) } else { format!("{:>w$}", cell, w = widths[c]) })
                    .collect::<Vec<_>>()
                    .join("  ")
            };
            let _ = writeln!(out, "{}", line(headers).trim_end());
            for row in rows {
                let _ = writeln!(out, "{}", line(row).trim_end());
            }
        }
        TableFormat::Markdown => {
            let _ = writeln!(out, "| {} |", headers.join(" | "));
            let align: Vec<&str> = (0..headers.len()).map(|c| if c == 0 { "---" } else { "---:" }).collect();
            let _ = writeln!(out, "|{}|", align.join("|"));
            for row in rows {
                let _ = writeln!(out, "| {} |", row.join(" | "));
            }
        }
    }
    out
}

fn share_grid(title_col: &str, table: &ShareTable, format: TableFormat) -> String {
    let headers = [title_col.to_string(), "Revenue ($B)".to_string(), "% of Total".to_string()];
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| vec![r.label.clone(), format!("{:.2}", r.value), format!("{:.1}", r.share)])
        .collect();
    render_grid(&headers, &rows, format)
}

fn banner(out: &mut String, title: &str, width: usize, format: TableFormat) {
    match format {
        TableFormat::Plain => {
            let rule = "=".repeat(width);
            let _ = writeln!(out, "\n{rule}\n{title}\n{rule}");
        }
        TableFormat::Markdown => {
            let _ = writeln!(out, "\n## {title}\n");
        }
    }
}

/// The revenue-by-segment and revenue-by-end-market report. Empty tables are
/// skipped.
pub fn format_summary(tables: &SummaryTables, format: TableFormat) -> String {
    let mut out = String::new();
    for (title, col, table) in [
        ("REVENUE BY SEGMENT", "Segment", &tables.by_segment),
        ("REVENUE BY END MARKET", "End Market", &tables.by_end_market),
    ] {
        if table.is_empty() {
            continue;
        }
        banner(&mut out, title, 50, format);
        out.push_str(&share_grid(col, table, format));
        let _ = writeln!(out, "\nTotal: ${:.2}B", table.total());
    }
    if format == TableFormat::Plain {
        let _ = writeln!(out, "{}", "=".repeat(50));
    }
    out
}

pub fn format_comparison(summary: &ComparisonSummary, format: TableFormat) -> String {
    let mut out = String::new();
    banner(&mut out, "COMPARISON SUMMARY", 60, format);
    let headers = [
        "Segment".to_string(),
        format!("{} ($B)", summary.left_name),
        format!("{} ($B)", summary.right_name),
        "Difference ($B)".to_string(),
    ];
    let rows: Vec<Vec<String>> = summary
        .rows
        .iter()
        .map(|r| vec![r.category.clone(), format!("{:.2}", r.left), format!("{:.2}", r.right), format!("{:.2}", r.difference)])
        .collect();
    out.push_str(&render_grid(&headers, &rows, format));
    out
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}"))
}

fn strings<const N: usize>(headers: [&str; N]) -> Vec<String> {
    headers.iter().map(|h| h.to_string()).collect()
}

/// Markdown report of the last `quarters` quarters: performance trend,
/// segment performance and the headline trends.
pub fn format_quarterly_report(company: &str, history: &QuarterlyHistory, quarters: usize, generated: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {company} Quarterly Comparison");
    let _ = writeln!(out, "*Generated: {}*", generated.format("%Y-%m-%d %H:%M"));

    let headers = strings(["Quarter", "Revenue ($B)", "QoQ %", "YoY %", "GM %", "OM %", "CapEx ($B)"]);
    let rows: Vec<Vec<String>> = history
        .performance_rows(quarters)
        .into_iter()
        .map(|r| vec![r.quarter, cell(r.revenue), cell(r.qoq), cell(r.yoy), cell(r.gross_margin), cell(r.operating_margin), cell(r.capex)])
        .collect();
    let _ = writeln!(out, "\n### Financial Performance Trend\n");
    out.push_str(&render_grid(&headers, &rows, TableFormat::Markdown));

    let headers = strings([
        "Quarter",
        "DRAM ($B)",
        "NAND ($B)",
        "DRAM Bits (QoQ%)",
        "DRAM ASP (QoQ%)",
        "NAND Bits (QoQ%)",
        "NAND ASP (QoQ%)",
        "DRAM %",
        "NAND %",
    ]);
    let rows: Vec<Vec<String>> = history
        .segment_rows(quarters)
        .into_iter()
        .map(|r| {
            vec![
                r.quarter,
                cell(r.dram),
                cell(r.nand),
                cell(r.dram_bits),
                cell(r.dram_asp),
                cell(r.nand_bits),
                cell(r.nand_asp),
                cell(r.dram_mix),
                cell(r.nand_mix),
            ]
        })
        .collect();
    let _ = writeln!(out, "\n### Segment Performance\n");
    out.push_str(&render_grid(&headers, &rows, TableFormat::Markdown));

    let insights = history.insights();
    if !insights.is_empty() {
        let _ = writeln!(out, "\n### Key Trends\n");
        for insight in insights {
            let _ = writeln!(out, "- {insight}");
        }
    }
    out
}

pub fn format_metric_table(table: &MetricTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {}\n", table.section.title());
    let headers: Vec<String> = std::iter::once(table.section.label_header().to_string()).chain(table.competitors.iter().cloned()).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| std::iter::once(r.label.clone()).chain(r.values.iter().cloned()).collect())
        .collect();
    out.push_str(&render_grid(&headers, &rows, TableFormat::Markdown));
    out
}

/// Competitor tables separated by blank lines.
pub fn format_competitor_report(tables: &[MetricTable]) -> String {
    tables.iter().map(format_metric_table).collect::<Vec<_>>().join("\n")
}
