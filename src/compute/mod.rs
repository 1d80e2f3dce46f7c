//! Normalization and render preparation of flow graphs.
pub mod normalize;
pub mod prepare;

pub use normalize::{normalize_records, resolve_root, NormalizationPolicy};
pub use prepare::{FlowPreparer, PreparedFlow, SankeyData, ValueScale};
