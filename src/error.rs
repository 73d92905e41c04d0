//! Error type
use crate::envs::{BuildEnvError, ModelError};
use crate::solvers::SolveError;
use thiserror::Error;

/// Error from the dpsolve crate.
#[derive(Error, Debug)]
pub enum DpError {
    #[error("error building environment")]
    BuildEnv(#[from] BuildEnvError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
