use thiserror::Error;

use crate::geometry::DataLoadError;
use crate::solver::SolverError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("data load failed: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("simulation has not completed initialization")]
    NotInitialized,

    #[error("invalid lifecycle transition: {0}")]
    InvalidTransition(&'static str),

    #[error("invalid probe: {0}")]
    InvalidProbe(String),

    #[error("solver fault: {0}")]
    Solver(#[from] SolverError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
