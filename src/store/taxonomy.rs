//! Category names shared by the loader, summaries and templates.

/// Root candidates tried, in order, when normalizing a table to percentages.
pub const ROOT_CANDIDATES: [&str; 3] = ["Total Revenue", "Revenue", "Total"];

/// The layer-1 source of the segment summary.
pub const TOTAL_REVENUE: &str = "Total Revenue";

pub const SEGMENTS: [&str; 4] = ["DRAM", "NAND", "Emerging", "Other"];

/// Segment names some companies report instead of the standard ones.
const COMPANY_SEGMENTS: [&str; 5] = ["NAND Flash", "Others", "Memory", "System LSI", "Foundry"];

/// Whether `label` names a business segment, i.e. a layer-2 source.
pub fn is_segment(label: &str) -> bool {
    SEGMENTS.contains(&label) || COMPANY_SEGMENTS.contains(&label)
}

pub const END_MARKETS: [&str; 6] = [
    "AI/Datacenter",
    "Mobile",
    "Enterprise",
    "PC",
    "Automotive",
    "Industrial",
];

// Substring patterns, checked in order. "auto/industrial" must stay ahead of
// "industrial" so the combined bucket lands on Automotive.
const END_MARKET_PATTERNS: [(&str, &str); 23] = [
    ("data center", "AI/Datacenter"),
    ("datacenter", "AI/Datacenter"),
    ("server", "AI/Datacenter"),
    ("cloud", "AI/Datacenter"),
    ("mobile", "Mobile"),
    ("smartphone", "Mobile"),
    ("handset", "Mobile"),
    ("client", "PC"),
    ("notebook", "PC"),
    ("desktop", "PC"),
    ("graphics", "PC"),
    ("consumer electronics", "Consumer"),
    ("consumer", "Consumer"),
    ("auto/industrial", "Automotive"),
    ("automotive", "Automotive"),
    ("auto", "Automotive"),
    ("industrial", "Industrial"),
    ("iot", "Industrial"),
    ("embedded", "Enterprise"),
    ("enterprise", "Enterprise"),
    ("ai", "AI/Datacenter"),
    ("pc", "PC"),
    ("ssd", "Enterprise"),
];

/// Maps a free-form end-market name from earnings material onto the standard
/// categories. Names already in canonical form pass through untouched; names
/// with no match are title-cased.
pub fn normalize_end_market(name: &str) -> String {
    let trimmed = name.trim();
    if END_MARKETS.contains(&trimmed) || trimmed == "Consumer" {
        return trimmed.to_string();
    }
    let lower = trimmed.to_lowercase();
    END_MARKET_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| title_case(trimmed))
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
