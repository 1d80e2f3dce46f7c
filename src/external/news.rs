//! News articles about a tracked company, and the keyword heuristics that
//! sort them into the "Recent Developments" section of a battle card.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub date: NaiveDate,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: String,
    /// 1-10, as scored by the feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u8>,
}

impl Article {
    fn text(&self) -> String {
        format!("{} {}", self.title, self.summary).to_lowercase()
    }

    /// The first category with a keyword in the title or summary.
    pub fn category(&self) -> NewsCategory {
        let text = self.text();
        NewsCategory::ALL
            .into_iter()
            .find(|c| c.keywords().iter().any(|k| text.contains(k)))
            .unwrap_or(NewsCategory::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    Strategic,
    ProductLaunches,
    Financial,
    Leadership,
    Partnerships,
    Manufacturing,
    Customers,
    Technology,
    Other,
}

impl NewsCategory {
    /// Matching order. `Other` is last and has no keywords.
    pub const ALL: [NewsCategory; 9] = [
        Self::Strategic,
        Self::ProductLaunches,
        Self::Financial,
        Self::Leadership,
        Self::Partnerships,
        Self::Manufacturing,
        Self::Customers,
        Self::Technology,
        Self::Other,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Strategic => &["acquisition", "merger", "strategy", "investment", "expansion"],
            Self::ProductLaunches => &["launch", "announce", "unveil", "introduce", "new product"],
            Self::Financial => &["earnings", "revenue", "margin", "profit", "guidance"],
            Self::Leadership => &["ceo", "cfo", "executive", "appoint", "hire", "resignation"],
            Self::Partnerships => &["partnership", "collaboration", "agreement", "deal"],
            Self::Manufacturing => &["fab", "factory", "capacity", "production", "yield"],
            Self::Customers => &["customer", "win", "contract", "design win", "nvidia", "amd"],
            Self::Technology => &["hbm", "dram", "nand", "node", "process", "technology"],
            Self::Other => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategic => "strategic",
            Self::ProductLaunches => "product_launches",
            Self::Financial => "financial",
            Self::Leadership => "leadership",
            Self::Partnerships => "partnerships",
            Self::Manufacturing => "manufacturing",
            Self::Customers => "customers",
            Self::Technology => "technology",
            Self::Other => "other",
        }
    }

    /// `product_launches` -> `Product Launches`
    pub fn heading(self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Buckets articles per category, every category present and in matching
/// order. Articles keep their input order within a bucket.
pub fn categorize_news(articles: &[Article]) -> Vec<(NewsCategory, Vec<&Article>)> {
    let mut buckets: Vec<(NewsCategory, Vec<&Article>)> = NewsCategory::ALL.into_iter().map(|c| (c, Vec::new())).collect();
    for article in articles {
        let category = article.category();
        if let Some((_, bucket)) = buckets.iter_mut().find(|(c, _)| *c == category) {
            bucket.push(article);
        }
    }
    buckets
}

/// Keeps articles mentioning any keyword (case-insensitive) in the title or
/// summary.
pub fn filter_by_keywords<S: AsRef<str>>(articles: Vec<Article>, keywords: &[S]) -> Vec<Article> {
    let keywords: Vec<String> = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
    articles
        .into_iter()
        .filter(|a| {
            let text = a.text();
            keywords.iter().any(|k| text.contains(k.as_str()))
        })
        .collect()
}

/// Markdown for the battle card: the `limit` most recent articles grouped by
/// category.
pub fn recent_developments_markdown(articles: &[Article], limit: usize) -> String {
    if articles.is_empty() {
        return "No recent developments found.\n".to_string();
    }

    let mut recent: Vec<Article> = articles.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(limit);

    let mut lines = vec!["## Recent Developments (Last 6 Months)\n".to_string()];
    for (category, items) in categorize_news(&recent) {
        if items.is_empty() {
            continue;
        }
        lines.push(format!("\n**{}:**", category.heading()));
        for a in items {
            if a.summary.is_empty() {
                lines.push(format!("- [{}]: {}", a.date, a.title));
            } else {
                let summary: String = a.summary.chars().take(100).collect();
                lines.push(format!("- [{}]: {} - {}...", a.date, a.title, summary));
            }
        }
    }
    lines.join("\n")
}

/// JSON document written by the `news` command.
#[derive(Debug, Clone, Serialize)]
pub struct NewsReport {
    pub company: String,
    pub ticker: String,
    pub period_days: u32,
    pub total_articles: usize,
    pub categorized: BTreeMap<&'static str, usize>,
    pub articles: Vec<Article>,
}

impl NewsReport {
    pub fn new(company: &str, ticker: &str, period_days: u32, articles: Vec<Article>) -> Self {
        let categorized = categorize_news(&articles).into_iter().map(|(c, items)| (c.as_str(), items.len())).collect();
        Self {
            company: company.to_string(),
            ticker: ticker.to_string(),
            period_days,
            total_articles: articles.len(),
            categorized,
            articles,
        }
    }
}

/// Three Micron headlines dated 30, 60 and 90 days before `today`.
pub fn sample_articles(today: NaiveDate) -> Vec<Article> {
    let ago = |days: u64| today.checked_sub_days(Days::new(days)).unwrap_or(today);
    vec![
        Article {
            title: "Micron Announces HBM3E Volume Production".into(),
            date: ago(30),
            source: "Company Press Release".into(),
            url: None,
            summary: "Micron announces mass production of HBM3E for AI datacenter applications".into(),
            relevance: Some(9),
        },
        Article {
            title: "Micron Receives $6.1B CHIPS Act Funding".into(),
            date: ago(60),
            source: "Government Announcement".into(),
            url: None,
            summary: "US government awards Micron $6.1B to expand domestic manufacturing".into(),
            relevance: Some(8),
        },
        Article {
            title: "Micron Reports Q4 FY24 Results - Revenue Up 25% YoY".into(),
            date: ago(90),
            source: "Earnings Release".into(),
            url: None,
            summary: "Strong quarter driven by memory market recovery and AI demand".into(),
            relevance: Some(7),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn article(title: &str, summary: &str) -> Article {
        Article { title: title.into(), date: today(), source: "Wire".into(), url: None, summary: summary.into(), relevance: None }
    }

    #[rstest]
    #[case("SK Hynix completes acquisition of fab", NewsCategory::Strategic)]
    #[case("Samsung unveils 12-high stack", NewsCategory::ProductLaunches)]
    #[case("Kioxia names new CEO", NewsCategory::Leadership)]
    #[case("Micron signs supply agreement", NewsCategory::Partnerships)]
    #[case("NAND prices rise", NewsCategory::Technology)]
    #[case("Weather delays shipping", NewsCategory::Other)]
    fn test_first_matching_category(#[case] title: &str, #[case] expected: NewsCategory) {
        assert_eq!(article(title, "").category(), expected);
    }

    #[test]
    fn test_sample_articles_categorize() {
        let articles = sample_articles(today());
        let buckets = categorize_news(&articles);

        assert_eq!(buckets.len(), 9);
        let count = |c: NewsCategory| buckets.iter().find(|(k, _)| *k == c).map(|(_, v)| v.len()).unwrap();
        assert_eq!(count(NewsCategory::ProductLaunches), 1);
        assert_eq!(count(NewsCategory::Financial), 1);
        assert_eq!(count(NewsCategory::Other), 1);
        assert_eq!(articles[0].date, NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
    }

    #[test]
    fn test_keyword_filter_is_case_insensitive() {
        let kept = filter_by_keywords(sample_articles(today()), &["hbm", "EARNINGS"]);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].title.contains("HBM3E"));

        let none = filter_by_keywords(sample_articles(today()), &["tariff"]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_markdown_groups_recent_first() {
        let md = recent_developments_markdown(&sample_articles(today()), 2);

        assert!(md.starts_with("## Recent Developments (Last 6 Months)\n"));
        assert!(md.contains("\n**Product Launches:**\n- [2025-05-31]: Micron Announces HBM3E Volume Production - Micron announces"));
        assert!(md.contains("**Other:**"));
        // Limited to the two newest articles.
        assert!(!md.contains("Q4 FY24"));
    }

    #[test]
    fn test_markdown_without_articles() {
        assert_eq!(recent_developments_markdown(&[], 10), "No recent developments found.\n");
    }

    #[test]
    fn test_report_counts_every_category() {
        let report = NewsReport::new("Micron", "MU", 180, sample_articles(today()));
        assert_eq!(report.total_articles, 3);
        assert_eq!(report.categorized.len(), 9);
        assert_eq!(report.categorized["financial"], 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["articles"][0]["date"], "2025-05-31");
    }

    #[test]
    fn test_heading() {
        assert_eq!(NewsCategory::ProductLaunches.heading(), "Product Launches");
        assert_eq!(NewsCategory::Other.heading(), "Other");
    }
}
