//! Defines the error types for the graph module.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The flow table loops back on itself (e.g. `A -> B -> A`). A node's
    /// `max(inflow, outflow)` total is meaningless on such input.
    #[error("Cycle detected involving node '{node}'")]
    CycleDetected { node: String },
}
