//! Policy evaluation
use super::sweep::sweep_until_converged;
use super::{Evaluation, Policy, SolveError, SolverConfig, TabularModel, ValueFunction};
use crate::envs::FiniteMdp;
use ndarray::Array1;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// Compute the value function of a deterministic policy.
///
/// Repeatedly applies the Bellman expectation backup
/// `V(s) <- sum_s' P(s' | s, π(s)) [r(s, π(s), s') + γ V(s')]`
/// starting from `V = 0`.
///
/// # Errors
/// * [`SolveError::InvalidConfig`] for an invalid configuration.
/// * [`SolveError::MissingAction`] if the policy has no action for a non-terminal state.
/// * [`SolveError::Model`] if a policy action is not admissible or the environment
///     model is malformed.
pub fn evaluate_policy<E>(
    env: &E,
    policy: &Policy<E::State, E::Action>,
    config: &SolverConfig,
) -> Result<Evaluation<E::State>, SolveError>
where
    E: FiniteMdp + ?Sized,
{
    let discount_factor = config.resolve(env)?;
    let model = TabularModel::from_env(env)?;
    let action_indices = model.action_indices(policy)?;
    Ok(evaluate_indices(&model, &action_indices, discount_factor, config))
}

/// Evaluate per-state action indices on a tabulated model.
pub(super) fn evaluate_indices<S, A>(
    model: &TabularModel<S, A>,
    action_indices: &[Option<usize>],
    discount_factor: f64,
    config: &SolverConfig,
) -> Evaluation<S>
where
    S: Clone + Eq + Hash + Debug,
    A: PartialEq + Debug,
{
    let terminal: Vec<bool> = action_indices.iter().map(Option::is_none).collect();
    let result = sweep_until_converged(
        &terminal,
        config,
        "policy evaluation",
        |s, values: &Array1<f64>| match action_indices[s] {
            Some(a) => model.q_value(s, a, values, discount_factor),
            None => 0.0,
        },
    );
    let index = model.index();
    Evaluation {
        values: ValueFunction::new(Rc::clone(index), result.values),
        convergence: result.convergence,
        history: result
            .history
            .into_iter()
            .map(|values| ValueFunction::new(Rc::clone(index), values))
            .collect(),
    }
}
