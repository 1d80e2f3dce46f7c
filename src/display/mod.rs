//! Output surfaces: colours, text tables and chart documents.
pub mod chart;
pub mod palette;
pub mod table;

pub use chart::{ChartRenderer, ChartSize, ChartSpec, OutputFormat, PlotlyHtmlRenderer, RenderError};
pub use palette::Palette;
pub use table::{format_comparison, format_competitor_report, format_quarterly_report, format_summary, TableFormat};
