//! Dynamic programming solvers for finite MDPs
mod config;
mod error;
mod evaluation;
mod policy_iteration;
mod sweep;
mod tabular;
mod value;
mod value_iteration;

pub use config::{SolverConfig, SweepMode};
pub use error::SolveError;
pub use evaluation::evaluate_policy;
pub use policy_iteration::{policy_iteration, policy_iteration_from};
pub use tabular::{Outcome, TabularModel, TIE_TOLERANCE};
pub use value::{Policy, StateIndex, ValueFunction};
pub use value_iteration::value_iteration;

use serde::Serialize;
use std::hash::Hash;

/// Termination status of an iterative value computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Convergence {
    /// The largest change of the last sweep was below the tolerance.
    Converged { iterations: usize, max_delta: f64 },
    /// The iteration limit was reached first.
    ///
    /// The values are the best available estimate.
    IterationLimit { iterations: usize, max_delta: f64 },
}

impl Convergence {
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// Number of sweeps performed.
    pub const fn iterations(&self) -> usize {
        match self {
            Self::Converged { iterations, .. } | Self::IterationLimit { iterations, .. } => {
                *iterations
            }
        }
    }

    /// Largest state value change of the final sweep.
    pub const fn max_delta(&self) -> f64 {
        match self {
            Self::Converged { max_delta, .. } | Self::IterationLimit { max_delta, .. } => {
                *max_delta
            }
        }
    }
}

/// Value function of a fixed policy.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "S: Serialize + Eq + Hash")]
pub struct Evaluation<S> {
    pub values: ValueFunction<S>,
    pub convergence: Convergence,
    /// Value function after each sweep. Empty unless requested.
    pub history: Vec<ValueFunction<S>>,
}

/// Optimal policy and value function.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "S: Serialize + Eq + Hash, A: Serialize")]
pub struct Solution<S, A> {
    pub values: ValueFunction<S>,
    pub policy: Policy<S, A>,
    /// Number of outer iterations.
    ///
    /// Policy improvement rounds for policy iteration; sweeps for value iteration.
    pub iterations: usize,
    /// Convergence of the final value computation.
    pub convergence: Convergence,
    /// Value function after each outer iteration. Empty unless requested.
    pub history: Vec<ValueFunction<S>>,
}
