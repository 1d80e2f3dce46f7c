//! Seams for the collaborators that fetch documents about a company: news
//! feeds, regulatory filings and investor-relations sites.
pub mod error;
pub mod news;
pub mod sources;

pub use error::ServiceError;
pub use news::{categorize_news, filter_by_keywords, recent_developments_markdown, Article, NewsCategory, NewsReport};
pub use sources::{
    Filing, FilingSource, IrSiteSource, NewsSource, StaticNewsSource, UnimplementedFilingSource, UnimplementedIrSiteSource,
    UnimplementedNewsSource,
};
