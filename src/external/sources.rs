//! Fetch-by-ticker collaborators. Only the in-memory news source carries
//! data; the network-backed ones report `ServiceError::NotImplemented`.

use super::error::ServiceError;
use super::news::Article;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A periodic report filed with the securities regulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    /// e.g. `10-K`, `10-Q`
    pub form: String,
    pub filed: NaiveDate,
    pub url: String,
}

pub trait NewsSource {
    /// Articles about `ticker` dated on or after `since`.
    fn fetch_by_ticker(&self, ticker: &str, since: NaiveDate) -> Result<Vec<Article>, ServiceError>;
}

pub trait FilingSource {
    fn fetch_by_ticker(&self, ticker: &str, form: &str) -> Result<Vec<Filing>, ServiceError>;
}

/// Press releases and presentations from a company's investor-relations site.
pub trait IrSiteSource {
    fn fetch_by_ticker(&self, ticker: &str) -> Result<Vec<Article>, ServiceError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedNewsSource;

impl NewsSource for UnimplementedNewsSource {
    fn fetch_by_ticker(&self, _ticker: &str, _since: NaiveDate) -> Result<Vec<Article>, ServiceError> {
        Err(ServiceError::NotImplemented { service: "news feed" })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedFilingSource;

impl FilingSource for UnimplementedFilingSource {
    fn fetch_by_ticker(&self, _ticker: &str, _form: &str) -> Result<Vec<Filing>, ServiceError> {
        Err(ServiceError::NotImplemented { service: "SEC EDGAR download" })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedIrSiteSource;

impl IrSiteSource for UnimplementedIrSiteSource {
    fn fetch_by_ticker(&self, _ticker: &str) -> Result<Vec<Article>, ServiceError> {
        Err(ServiceError::NotImplemented { service: "investor-relations scraping" })
    }
}

/// Serves a fixed article list regardless of ticker.
#[derive(Debug, Clone, Default)]
pub struct StaticNewsSource {
    articles: Vec<Article>,
}

impl StaticNewsSource {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }
}

impl NewsSource for StaticNewsSource {
    fn fetch_by_ticker(&self, ticker: &str, since: NaiveDate) -> Result<Vec<Article>, ServiceError> {
        let found: Vec<Article> = self.articles.iter().filter(|a| a.date >= since).cloned().collect();
        debug!(ticker, %since, count = found.len(), "served static articles");
        Ok(found)
    }
}
