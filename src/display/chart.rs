//! chart.rs
//! Emits self-contained chart documents for prepared flow data.
//!
//! Drawing is left to plotly.js in the browser: the document embeds the
//! figure definition as JSON and loads the library from its CDN.

use crate::compute::{SankeyData, ValueScale};
use serde_json::{json, Value as Json};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot write '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("cannot encode figure: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Html,
    Png,
    Svg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self { Self { width: 1200, height: 600 } }
}

/// What to draw.
#[derive(Debug, Clone)]
pub enum ChartSpec<'a> {
    Single { data: &'a SankeyData, title: String },
    /// Two diagrams side by side.
    Comparison { left: (&'a SankeyData, String), right: (&'a SankeyData, String), title: String },
}

/// The renderer seam. Returns every file written.
pub trait ChartRenderer {
    fn render(&self, spec: &ChartSpec<'_>, size: ChartSize, output: &Path, format: OutputFormat) -> Result<Vec<PathBuf>, RenderError>;
}

/// `"{company} {quarter} - {title}"`, dropping whichever label is absent.
pub fn chart_title(title: &str, company: Option<&str>, quarter: Option<&str>) -> String {
    match (company, quarter) {
        (Some(c), Some(q)) => format!("{c} {q} - {title}"),
        (Some(c), None) => format!("{c} - {title}"),
        (None, Some(q)) => format!("{q} - {title}"),
        (None, None) => title.to_string(),
    }
}

/// Comparison titles carry the unit.
pub fn comparison_title(title: &str, scale: ValueScale) -> String {
    match scale {
        ValueScale::Percent => format!("{title} (%)"),
        ValueScale::Absolute => format!("{title} ($B)"),
    }
}

fn sankey_trace(data: &SankeyData, pad: u32, thickness: u32, domain: Option<[f64; 2]>) -> Json {
    let labels: Vec<String> = data.node_labels.iter().map(|l| l.replace('\n', "<br>")).collect();
    let customdata: Vec<[&str; 3]> = data
        .source_names
        .iter()
        .zip(&data.target_names)
        .zip(&data.percentages)
        .map(|((s, t), p)| [s.as_str(), t.as_str(), p.as_str()])
        .collect();
    let value_fmt = match data.scale {
        ValueScale::Absolute => "$%{value:.2f}B",
        ValueScale::Percent => "%{value:.1f}%",
    };

    let mut trace = json!({
        "type": "sankey",
        "node": {
            "pad": pad,
            "thickness": thickness,
            "line": { "color": "black", "width": 0.5 },
            "label": labels,
            "color": data.node_colors,
            "hovertemplate": "%{label}<extra></extra>",
        },
        "link": {
            "source": data.source,
            "target": data.target,
            "value": data.value,
            "color": data.link_colors,
            "customdata": customdata,
            "hovertemplate": format!("<b>%{{customdata[0]}} → %{{customdata[1]}}</b><br>{value_fmt} (%{{customdata[2]}})<extra></extra>"),
        },
    });
    if let Some([x0, x1]) = domain {
        trace["domain"] = json!({ "x": [x0, x1], "y": [0, 1] });
    }
    trace
}

/// The plotly figure (`data` + `layout`) for a chart.
pub fn figure(spec: &ChartSpec<'_>, size: ChartSize) -> Json {
    match spec {
        ChartSpec::Single { data, title } => json!({
            "data": [sankey_trace(data, 20, 25, None)],
            "layout": {
                "title": { "text": title, "font": { "size": 22, "family": "Arial Black" }, "x": 0.5, "xanchor": "center" },
                "font": { "size": 12, "family": "Arial" },
                "plot_bgcolor": "white",
                "paper_bgcolor": "white",
                "width": size.width,
                "height": size.height,
                "margin": { "l": 30, "r": 30, "t": 80, "b": 30 },
            },
        }),
        ChartSpec::Comparison { left, right, title } => {
            let subtitle = |text: &str, x: f64| {
                json!({ "text": format!("<b>{text}</b>"), "x": x, "y": 1.0, "xref": "paper", "yref": "paper",
                        "xanchor": "center", "yanchor": "bottom", "showarrow": false, "font": { "size": 14 } })
            };
            json!({
                "data": [
                    sankey_trace(left.0, 15, 20, Some([0.0, 0.45])),
                    sankey_trace(right.0, 15, 20, Some([0.55, 1.0])),
                ],
                "layout": {
                    "title": { "text": title, "font": { "size": 20, "family": "Arial Black" }, "x": 0.5, "xanchor": "center" },
                    "annotations": [subtitle(left.1.as_str(), 0.225), subtitle(right.1.as_str(), 0.775)],
                    "font": { "size": 11, "family": "Arial" },
                    "paper_bgcolor": "white",
                    "width": size.width,
                    "height": size.height,
                    "margin": { "l": 30, "r": 30, "t": 100, "b": 30 },
                },
            })
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

pub struct PlotlyHtmlRenderer;

impl PlotlyHtmlRenderer {
    pub fn document(spec: &ChartSpec<'_>, size: ChartSize) -> Result<String, RenderError> {
        let title = match spec {
            ChartSpec::Single { title, .. } | ChartSpec::Comparison { title, .. } => title,
        };
        // `</script>` inside a label must not end the inline script.
        let figure_json = serde_json::to_string(&figure(spec, size))?.replace("</", "<\\/");
        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
             <script src=\"{PLOTLY_CDN}\"></script>\n</head>\n<body>\n\
             <div id=\"chart\"></div>\n<script>\nconst figure = {figure_json};\n\
             Plotly.newPlot(\"chart\", figure.data, figure.layout);\n</script>\n</body>\n</html>\n",
            title = escape_html(title),
        ))
    }
}

impl ChartRenderer for PlotlyHtmlRenderer {
    fn render(&self, spec: &ChartSpec<'_>, size: ChartSize, output: &Path, format: OutputFormat) -> Result<Vec<PathBuf>, RenderError> {
        let html_path = match format {
            OutputFormat::Html => output.to_path_buf(),
            OutputFormat::Png | OutputFormat::Svg => {
                warn!(?format, path = %output.display(), "static image export needs an external image engine; writing interactive HTML instead");
                output.with_extension("html")
            }
        };

        let doc = Self::document(spec, size)?;
        fs::write(&html_path, doc).map_err(|source| RenderError::Io { path: html_path.clone(), source })?;
        info!(path = %html_path.display(), "saved interactive chart");
        Ok(vec![html_path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::FlowPreparer;
    use crate::display::palette::Palette;
    use crate::store::template::sample_records;

    fn sample_data(normalize: bool) -> SankeyData {
        let palette = Palette::default();
        FlowPreparer::new(&palette).normalized(normalize).prepare(&sample_records()).unwrap().sankey
    }

    #[test]
    fn test_chart_title_variants() {
        assert_eq!(chart_title("Flow", Some("Micron"), Some("Q2 FY25")), "Micron Q2 FY25 - Flow");
        assert_eq!(chart_title("Flow", Some("Micron"), None), "Micron - Flow");
        assert_eq!(chart_title("Flow", None, Some("Q2 FY25")), "Q2 FY25 - Flow");
        assert_eq!(chart_title("Flow", None, None), "Flow");
        assert_eq!(comparison_title("Revenue Flow Comparison", ValueScale::Percent), "Revenue Flow Comparison (%)");
    }

    #[test]
    fn test_single_figure_embeds_graph_definition() {
        let data = sample_data(false);
        let fig = figure(&ChartSpec::Single { data: &data, title: "T".into() }, ChartSize::default());
        let trace = &fig["data"][0];

        assert_eq!(trace["type"], "sankey");
        assert_eq!(trace["node"]["label"][1], "DRAM<br>$6.75B");
        assert_eq!(trace["link"]["source"].as_array().unwrap().len(), data.value.len());
        assert_eq!(trace["link"]["customdata"][0][0], "Total Revenue");
        assert!(trace["link"]["hovertemplate"].as_str().unwrap().contains("$%{value:.2f}B"));
        assert_eq!(fig["layout"]["width"], 1200);
    }

    #[test]
    fn test_comparison_figure_has_two_domains() {
        let (a, b) = (sample_data(true), sample_data(true));
        let spec = ChartSpec::Comparison { left: (&a, "Micron".into()), right: (&b, "SK Hynix".into()), title: "C (%)".into() };
        let fig = figure(&spec, ChartSize { width: 1400, height: 700 });

        assert_eq!(fig["data"][0]["domain"]["x"][1], 0.45);
        assert_eq!(fig["data"][1]["domain"]["x"][0], 0.55);
        assert!(fig["data"][1]["link"]["hovertemplate"].as_str().unwrap().contains("%{value:.1f}%"));
        assert_eq!(fig["layout"]["annotations"][1]["text"], "<b>SK Hynix</b>");
    }

    #[test]
    fn test_png_request_writes_html_next_to_it() {
        let data = sample_data(false);
        let dir = tempfile::tempdir().unwrap();
        let written = PlotlyHtmlRenderer
            .render(&ChartSpec::Single { data: &data, title: "<Flow>".into() }, ChartSize::default(), &dir.path().join("out.png"), OutputFormat::Png)
            .unwrap();

        assert_eq!(written, vec![dir.path().join("out.html")]);
        let doc = fs::read_to_string(&written[0]).unwrap();
        assert!(doc.contains("<title>&lt;Flow&gt;</title>"));
        assert!(doc.contains("Plotly.newPlot"));
        assert!(doc.contains("<\\/b>"));
    }
}
