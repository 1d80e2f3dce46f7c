//! Defines the error types for the external-service seams.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No backend is wired up for this collaborator.
    #[error("{service} is not implemented; supply data manually")]
    NotImplemented { service: &'static str },
}
