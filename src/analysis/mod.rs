//! Graph checks, the tables derived from one or two flow graphs, and the
//! quarterly and competitor comparisons.
pub mod comparison;
pub mod competitors;
pub mod quarterly;
pub mod summary;
pub mod topology;

pub use comparison::{split_quarters, ComparisonRow, ComparisonSummary, LookupError};
pub use competitors::{compare_competitors, parse_competitors, MetricSet, MetricTable, Section};
pub use quarterly::{QuarterRecord, QuarterlyHistory, TrendInsight};
pub use summary::{ShareRow, ShareTable, SummaryTables};
