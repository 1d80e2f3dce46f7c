//! Crate-level error type and the command-line validation errors.
use crate::analysis::LookupError;
use crate::config::ConfigError;
use crate::display::RenderError;
use crate::external::ServiceError;
use crate::graph::GraphError;
use crate::store::LoadError;
use thiserror::Error;

/// A required combination of command-line inputs was not supplied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no data file provided; use --data <file.csv> or --demo for sample data")]
    MissingData,
    #[error("specify --company1 and --company2, or --data with --quarters")]
    MissingComparisonInputs,
    #[error("provide exactly 2 quarters to compare, got {0}")]
    QuarterCount(usize),
    #[error("--days {0} reaches back before the earliest representable date")]
    DaysOutOfRange(u32),
    #[error("no competitors given; use --competitors \"Micron,Samsung,SK Hynix\" or --create-template")]
    MissingCompetitors,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Process exit status: 2 for usage errors, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            _ => 1,
        }
    }
}
