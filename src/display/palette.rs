//! Node and link colours for the flow charts.
//!
//! The palette is plain configuration: it can be deserialized from the
//! `[palette]` table of the config file and is handed to the preparer
//! explicitly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_COLOR: &str = "#CCCCCC";
const FALLBACK_LINK_COLOR: &str = "rgba(0,0,0,0.2)";

/// Segment colours of one company. `key` is matched as a substring of the
/// lowercased company label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyScheme {
    pub key: String,
    pub primary: String,
    pub segments: HashMap<String, String>,
}

/// Config files override individual entries; see [`PaletteOverrides`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PaletteOverrides")]
pub struct Palette {
    /// Company-independent colours (end markets, profitability, the root).
    pub end_markets: HashMap<String, String>,
    /// Checked in order; the first matching scheme that defines the node wins.
    pub companies: Vec<CompanyScheme>,
    /// Scheme used for segments when no company matches.
    pub default_company: String,
    pub default_color: String,
}

impl Default for Palette {
    fn default() -> Self {
        let end_markets = [
            ("AI/Datacenter", "#2E86AB"),
            ("Datacenter", "#2E86AB"),
            ("AI", "#2E86AB"),
            ("Mobile", "#06A77D"),
            ("Enterprise", "#D62839"),
            ("PC", "#717568"),
            ("PC/Client", "#717568"),
            ("Client", "#717568"),
            ("Automotive", "#F26419"),
            ("Auto", "#F26419"),
            ("Industrial", "#8338EC"),
            ("Industrial/IoT", "#8338EC"),
            ("IoT", "#8338EC"),
            ("Consumer", "#3A86FF"),
            ("Embedded", "#9B59B6"),
            ("Gross Profit", "#27AE60"),
            ("COGS", "#E74C3C"),
            ("Operating Income", "#2ECC71"),
            ("Total Revenue", "#34495E"),
        ];

        let companies = vec![
            scheme("micron", "#0066B3", "#A23B72", "#F18F01", "#C2C5BB"),
            scheme("sk hynix", "#ED1C24", "#E74C3C", "#F39C12", "#95A5A6"),
            scheme("samsung", "#1428A0", "#3498DB", "#9B59B6", "#BDC3C7"),
            scheme("western digital", "#005EB8", "#3498DB", "#E67E22", "#95A5A6"),
            scheme("kioxia", "#E60012", "#E74C3C", "#C0392B", "#7F8C8D"),
        ];

        Self {
            end_markets: end_markets.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect(),
            companies,
            default_company: "micron".to_string(),
            default_color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// The `[palette]` table as written. Entries are merged over
/// `Palette::default()` rather than replacing whole maps.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PaletteOverrides {
    end_markets: HashMap<String, String>,
    companies: Vec<SchemeOverride>,
    default_company: Option<String>,
    default_color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchemeOverride {
    key: String,
    primary: Option<String>,
    #[serde(default)]
    segments: HashMap<String, String>,
}

impl From<PaletteOverrides> for Palette {
    fn from(overrides: PaletteOverrides) -> Self {
        let mut palette = Palette::default();
        palette.end_markets.extend(overrides.end_markets);

        for over in overrides.companies {
            let key = over.key.to_lowercase();
            match palette.companies.iter_mut().find(|s| s.key == key) {
                Some(existing) => {
                    if let Some(primary) = over.primary {
                        existing.primary = primary;
                    }
                    existing.segments.extend(over.segments);
                }
                None => palette.companies.push(CompanyScheme {
                    key,
                    primary: over.primary.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                    segments: over.segments,
                }),
            }
        }

        if let Some(company) = overrides.default_company {
            palette.default_company = company.to_lowercase();
        }
        if let Some(color) = overrides.default_color {
            palette.default_color = color;
        }
        palette
    }
}

// Emerging and Other share a colour in every built-in scheme.
fn scheme(key: &str, primary: &str, dram: &str, nand: &str, other: &str) -> CompanyScheme {
    let segments = [("DRAM", dram), ("NAND", nand), ("Emerging", other), ("Other", other)]
        .iter()
        .map(|&(k, v)| (k.to_string(), v.to_string()))
        .collect();
    CompanyScheme { key: key.to_string(), primary: primary.to_string(), segments }
}

impl Palette {
    /// Lookup order: end-market table, matching company scheme, default
    /// company scheme, then the default gray.
    pub fn node_color(&self, node: &str, company: Option<&str>) -> &str {
        if let Some(c) = self.end_markets.get(node) {
            return c;
        }

        if let Some(company) = company {
            let lower = company.to_lowercase();
            let hit = self
                .companies
                .iter()
                .filter(|s| lower.contains(&s.key))
                .find_map(|s| s.segments.get(node));
            if let Some(c) = hit {
                return c;
            }
        }

        self.companies
            .iter()
            .find(|s| s.key == self.default_company)
            .and_then(|s| s.segments.get(node))
            .map(String::as_str)
            .unwrap_or(self.default_color.as_str())
    }

    /// The source node's colour at 40% opacity.
    pub fn link_color(&self, source: &str, company: Option<&str>) -> String {
        hex_to_rgba(self.node_color(source, company), 0.4).unwrap_or_else(|| FALLBACK_LINK_COLOR.to_string())
    }
}

/// `#RRGGBB` to `rgba(r,g,b,alpha)`; `None` for anything else.
pub fn hex_to_rgba(color: &str, alpha: f64) -> Option<String> {
    let hex = color
        .strip_prefix('#')?
        .get(0..6)
        .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    let (r, g, b) = (channel(0..2)?, channel(2..4)?, channel(4..6)?);
    Some(format!("rgba({r},{g},{b},{alpha})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Mobile", Some("SK Hynix"), "#06A77D")] // end markets ignore the company
    #[case("DRAM", Some("SK Hynix Inc."), "#E74C3C")]
    #[case("NAND", Some("Samsung Electronics"), "#9B59B6")]
    #[case("Emerging", Some("Kioxia"), "#7F8C8D")]
    #[case("DRAM", Some("Nanya"), "#A23B72")] // unknown company -> micron scheme
    #[case("DRAM", None, "#A23B72")]
    #[case("Other", None, "#C2C5BB")]
    #[case("HBM", Some("Micron"), DEFAULT_COLOR)]
    fn test_node_color_lookup(#[case] node: &str, #[case] company: Option<&str>, #[case] expected: &str) {
        assert_eq!(Palette::default().node_color(node, company), expected);
    }

    #[test]
    fn test_link_color_is_translucent_source_color() {
        let p = Palette::default();
        assert_eq!(p.link_color("Total Revenue", None), "rgba(52,73,94,0.4)");
    }

    #[test]
    fn test_non_hex_color_falls_back() {
        let mut p = Palette::default();
        p.end_markets.insert("Mobile".into(), "teal".into());
        assert_eq!(p.link_color("Mobile", None), "rgba(0,0,0,0.2)");
        assert_eq!(hex_to_rgba("#12", 0.4), None);
        // Multi-byte characters inside the first six bytes.
        assert_eq!(hex_to_rgba("#aé1234", 0.4), None);
        assert_eq!(hex_to_rgba("#+12345", 0.4), None);
        assert_eq!(hex_to_rgba("#0A0b0C", 0.5).as_deref(), Some("rgba(10,11,12,0.5)"));
    }

    #[test]
    fn test_palette_overrides_from_toml() {
        let p: Palette = toml::from_str(
            r##"
            default_color = "#000000"
            [end_markets]
            Mobile = "#111111"
            "##,
        )
        .unwrap();
        assert_eq!(p.node_color("Mobile", None), "#111111");
        assert_eq!(p.node_color("Unknown", None), "#000000");
        // Company schemes keep their defaults when not overridden.
        assert_eq!(p.node_color("DRAM", Some("Samsung")), "#3498DB");
    }

    #[test]
    fn test_end_market_override_keeps_other_entries() {
        let p: Palette = toml::from_str(
            r##"
            [end_markets]
            "AI/Datacenter" = "#FF0000"
            "##,
        )
        .unwrap();
        assert_eq!(p.node_color("AI/Datacenter", None), "#FF0000");
        assert_eq!(p.node_color("Mobile", None), "#06A77D");
        assert_eq!(p.node_color("Total Revenue", None), "#34495E");
        assert_eq!(p.default_color, DEFAULT_COLOR);
    }

    #[test]
    fn test_company_override_merges_segments() {
        let p: Palette = toml::from_str(
            r##"
            default_company = "Nanya"
            [[companies]]
            key = "Samsung"
            segments = { NAND = "#000001" }

            [[companies]]
            key = "nanya"
            segments = { DRAM = "#000002" }
            "##,
        )
        .unwrap();
        assert_eq!(p.node_color("NAND", Some("Samsung")), "#000001");
        assert_eq!(p.node_color("DRAM", Some("Samsung")), "#3498DB");
        // Unknown companies now fall through to the new default scheme.
        assert_eq!(p.node_color("DRAM", Some("Acme")), "#000002");
        assert_eq!(p.companies.len(), Palette::default().companies.len() + 1);
    }
}
