//! Dynamic programming for finite Markov decision processes.
//!
//! Environments implement [`FiniteMdp`] and are solved with
//! [`evaluate_policy`], [`policy_iteration`] or [`value_iteration`].
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)]
pub mod cli;
pub mod envs;
mod error;
pub mod instances;
pub mod simulation;
pub mod solvers;

pub use envs::{Episodic, FiniteMdp, Successors};
pub use error::DpError;
pub use simulation::{rollout, Trajectory};
pub use solvers::{
    evaluate_policy, policy_iteration, value_iteration, Convergence, Evaluation, Policy,
    Solution, SolverConfig, ValueFunction,
};

/// Pseudo-random number generator type used by this crate.
pub type Prng = rand_chacha::ChaCha8Rng;
