//! Defines the core data structures for the revenue-flow graph.
pub mod error;
pub mod flow;

// Re-export key types for convenient access
pub use error::GraphError;
pub use flow::{FlowEdge, FlowGraph};
