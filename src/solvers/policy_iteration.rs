//! Policy iteration
use super::evaluation::evaluate_indices;
use super::{Policy, SolveError, Solution, SolverConfig, TabularModel, ValueFunction};
use crate::envs::FiniteMdp;
use log::{debug, info};
use std::rc::Rc;

/// Find an optimal policy by policy iteration, starting from the first admissible actions.
///
/// See [`policy_iteration_from`].
///
/// # Errors
/// See [`policy_iteration_from`].
pub fn policy_iteration<E>(
    env: &E,
    config: &SolverConfig,
) -> Result<Solution<E::State, E::Action>, SolveError>
where
    E: FiniteMdp + ?Sized,
{
    let initial = Policy::first_admissible(env)?;
    policy_iteration_from(env, &initial, config)
}

/// Find an optimal policy by policy iteration starting from `initial`.
///
/// Alternates evaluating the current policy and improving it greedily until no state changes
/// its action. An action is only replaced if another action is better by more than
/// `config.tolerance`; the returned policy is greedy with respect to the final values with ties
/// going to the lowest action index.
///
/// The history, if requested, holds the value function of each evaluated policy.
///
/// # Errors
/// * [`SolveError::InvalidConfig`] for an invalid configuration.
/// * [`SolveError::MissingAction`] if `initial` has no action for a non-terminal state.
/// * [`SolveError::PolicyNotStable`] if the policy still changes after
///     `config.max_policy_iterations` rounds.
/// * [`SolveError::Model`] for invalid initial actions or a malformed environment model.
pub fn policy_iteration_from<E>(
    env: &E,
    initial: &Policy<E::State, E::Action>,
    config: &SolverConfig,
) -> Result<Solution<E::State, E::Action>, SolveError>
where
    E: FiniteMdp + ?Sized,
{
    let discount_factor = config.resolve(env)?;
    let model = TabularModel::from_env(env)?;
    let mut action_indices = model.action_indices(initial)?;
    let mut history = Vec::new();

    for iteration in 1..=config.max_policy_iterations {
        let evaluation = evaluate_indices(&model, &action_indices, discount_factor, config);
        let values = evaluation.values.values();
        if config.record_history {
            history.push(evaluation.values.clone());
        }

        let mut changed = 0;
        for (s, current) in action_indices.iter_mut().enumerate() {
            let current_action = match current {
                Some(a) => *a,
                None => continue,
            };
            let current_value = model.q_value(s, current_action, values, discount_factor);
            if let Some((best, best_value)) = model.greedy_action(s, values, discount_factor) {
                if best != current_action && best_value - current_value > config.tolerance {
                    *current = Some(best);
                    changed += 1;
                }
            }
        }
        debug!(
            "policy iteration {}: {} actions changed",
            iteration, changed
        );

        if changed == 0 {
            info!(
                "policy iteration stable after {} iterations ({} states)",
                iteration,
                model.num_states()
            );
            let policy = model.policy(&model.greedy_actions(values, discount_factor));
            return Ok(Solution {
                values: ValueFunction::new(Rc::clone(model.index()), values.clone()),
                policy,
                iterations: iteration,
                convergence: evaluation.convergence,
                history,
            });
        }
    }

    Err(SolveError::PolicyNotStable {
        iterations: config.max_policy_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::{
        EnvBuilder, Inventory, InventoryConfig, Knapsack, KnapsackConfig, KnapsackState, Pick,
    };
    use crate::solvers::value_iteration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn knapsack() -> Knapsack {
        KnapsackConfig::default().build_env(0).unwrap()
    }

    #[rstest]
    fn knapsack_optimum(knapsack: Knapsack) {
        let solution = policy_iteration(&knapsack, &SolverConfig::default()).unwrap();
        let start = KnapsackState {
            item: 0,
            remaining: 5,
        };
        assert!((solution.values.get(&start).unwrap() - 7.0).abs() < 1e-6);
        assert_eq!(solution.policy.get(&start), Some(&Pick::Take));
        assert!(solution.convergence.is_converged());
    }

    #[rstest]
    fn terminates_within_policy_count_bound(knapsack: Knapsack) {
        let solution = policy_iteration(&knapsack, &SolverConfig::default()).unwrap();
        let num_states = knapsack.states().len();
        assert!(solution.iterations <= num_states * 2);
    }

    #[rstest]
    fn matches_value_iteration(knapsack: Knapsack) {
        let config = SolverConfig::default();
        let pi = policy_iteration(&knapsack, &config).unwrap();
        let vi = value_iteration(&knapsack, &config).unwrap();
        assert!(pi.values.max_abs_diff(&vi.values) < 1e-6);
        assert_eq!(pi.policy, vi.policy);
    }

    #[rstest]
    fn initial_policy_does_not_matter(knapsack: Knapsack) {
        let config = SolverConfig::default();
        let skip_all = Policy::first_admissible(&knapsack).unwrap();
        let take_all = Policy::from_fn(&knapsack, |_, actions| actions.len() - 1).unwrap();

        let a = policy_iteration_from(&knapsack, &skip_all, &config).unwrap();
        let b = policy_iteration_from(&knapsack, &take_all, &config).unwrap();
        assert!(a.values.max_abs_diff(&b.values) < 1e-6);
        assert_eq!(a.policy, b.policy);
    }

    #[test]
    fn inventory_initial_policies_agree() {
        let env: Inventory = InventoryConfig {
            capacity: 6,
            ..InventoryConfig::default()
        }
        .build_env(0)
        .unwrap();
        let config = SolverConfig::default().with_tolerance(1e-8);
        let order_nothing = Policy::first_admissible(&env).unwrap();
        let fill_up = Policy::from_fn(&env, |_, actions| actions.len() - 1).unwrap();

        let a = policy_iteration_from(&env, &order_nothing, &config).unwrap();
        let b = policy_iteration_from(&env, &fill_up, &config).unwrap();
        assert!(a.values.max_abs_diff(&b.values) < 1e-6);
    }

    #[rstest]
    fn history_per_outer_iteration(knapsack: Knapsack) {
        let config = SolverConfig::default().with_history(true);
        let solution = policy_iteration(&knapsack, &config).unwrap();
        assert_eq!(solution.history.len(), solution.iterations);
        // The first policy skips everything.
        assert!(solution.history[0].iter().all(|(_, v)| v == 0.0));
        assert!(solution.history.last().unwrap().max_abs_diff(&solution.values) < 1e-12);
    }

    #[rstest]
    fn policy_not_stable(knapsack: Knapsack) {
        let config = SolverConfig {
            max_policy_iterations: 1,
            ..SolverConfig::default()
        };
        assert_eq!(
            policy_iteration(&knapsack, &config).unwrap_err(),
            SolveError::PolicyNotStable { iterations: 1 }
        );
    }

    #[rstest]
    fn rejects_incomplete_initial_policy(knapsack: Knapsack) {
        let initial = Policy::new();
        assert!(matches!(
            policy_iteration_from(&knapsack, &initial, &SolverConfig::default()),
            Err(SolveError::MissingAction { .. })
        ));
    }
}
