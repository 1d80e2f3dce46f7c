//! Flow tables: record types, loading, category names and templates.
pub mod loader;
pub mod taxonomy;
pub mod template;
pub mod types;

pub use loader::{load_flows, write_records, FlowTable, LoadError, Loader};
pub use types::{FlowRecord, NodeId};
