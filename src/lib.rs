//! Revenue-flow graphs for memory-semiconductor battle cards: load
//! `source,target,value` tables, build and normalize the flow graph, derive
//! summary and comparison tables, and emit Sankey chart documents.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod display;
pub mod error;
pub mod external;
pub mod graph;
pub mod logging;
pub mod store;

pub use error::{Error, Result, ValidationError};
