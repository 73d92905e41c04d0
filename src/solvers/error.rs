//! Solver errors
use crate::envs::ModelError;
use std::fmt::Debug;
use thiserror::Error;

/// Error running a dynamic programming solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("policy has no action for state {state}")]
    MissingAction { state: String },
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
    #[error("policy iteration did not stabilize within {iterations} iterations")]
    PolicyNotStable { iterations: usize },
}

impl SolveError {
    pub fn missing_action<S: Debug>(state: &S) -> Self {
        Self::MissingAction {
            state: format!("{:?}", state),
        }
    }
}
