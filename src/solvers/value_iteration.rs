//! Value iteration
use super::sweep::sweep_until_converged;
use super::{SolveError, Solution, SolverConfig, TabularModel, ValueFunction};
use crate::envs::FiniteMdp;
use log::info;
use ndarray::Array1;
use std::rc::Rc;

/// Find an optimal policy by value iteration.
///
/// Repeatedly applies the Bellman optimality backup
/// `V(s) <- max_a sum_s' P(s' | s, a) [r(s, a, s') + γ V(s')]` starting from `V = 0`,
/// then takes the greedy policy of the final values with ties going to the lowest action index.
///
/// Reaching `config.max_iterations` is not an error;
/// the solution then reports [`Convergence::IterationLimit`](super::Convergence).
///
/// # Errors
/// * [`SolveError::InvalidConfig`] for an invalid configuration.
/// * [`SolveError::Model`] if the environment model is malformed.
pub fn value_iteration<E>(
    env: &E,
    config: &SolverConfig,
) -> Result<Solution<E::State, E::Action>, SolveError>
where
    E: FiniteMdp + ?Sized,
{
    let discount_factor = config.resolve(env)?;
    let model = TabularModel::from_env(env)?;
    let terminal: Vec<_> = (0..model.num_states())
        .map(|s| model.is_terminal(s))
        .collect();

    let result = sweep_until_converged(
        &terminal,
        config,
        "value iteration",
        |s, values: &Array1<f64>| model.max_q_value(s, values, discount_factor),
    );
    if result.convergence.is_converged() {
        info!(
            "value iteration converged after {} sweeps ({} states)",
            result.convergence.iterations(),
            model.num_states()
        );
    }

    let policy = model.policy(&model.greedy_actions(&result.values, discount_factor));
    let index = model.index();
    Ok(Solution {
        values: ValueFunction::new(Rc::clone(index), result.values),
        policy,
        iterations: result.convergence.iterations(),
        convergence: result.convergence,
        history: result
            .history
            .into_iter()
            .map(|values| ValueFunction::new(Rc::clone(index), values))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::{
        EnvBuilder, Inventory, InventoryConfig, Knapsack, KnapsackConfig, KnapsackState, Pick,
    };
    use crate::solvers::{evaluate_policy, policy_iteration, Convergence, Policy, SweepMode};
    use rstest::{fixture, rstest};

    #[fixture]
    fn knapsack() -> Knapsack {
        KnapsackConfig::default().build_env(0).unwrap()
    }

    /// No demand, no revenue: every unit ordered only costs money.
    #[fixture]
    fn idle_inventory() -> Inventory {
        InventoryConfig {
            capacity: 5,
            demand: vec![(0, 1.0)],
            holding_cost: 1.0,
            unit_order_cost: 2.0,
            fixed_order_cost: 0.0,
            unit_price: 0.0,
            initial_stock: 0,
            discount_factor: 0.9,
        }
        .build_env(0)
        .unwrap()
    }

    #[rstest]
    fn knapsack_optimum_is_seven(knapsack: Knapsack) {
        let solution = value_iteration(&knapsack, &SolverConfig::default()).unwrap();
        let start = KnapsackState {
            item: 0,
            remaining: 5,
        };
        assert!((solution.values.get(&start).unwrap() - 7.0).abs() < 1e-9);
        // Weight 2 + 3: take the first two items
        assert_eq!(solution.policy.get(&start), Some(&Pick::Take));
        assert_eq!(
            solution.policy.get(&KnapsackState {
                item: 1,
                remaining: 3
            }),
            Some(&Pick::Take)
        );
        // Terminal states have no action
        assert_eq!(
            solution.policy.get(&KnapsackState {
                item: 3,
                remaining: 0
            }),
            None
        );
    }

    #[rstest]
    fn finite_horizon_sweeps(knapsack: Knapsack) {
        let solution = value_iteration(&knapsack, &SolverConfig::default()).unwrap();
        // Three sweeps to propagate through three items and one more to see no change.
        assert_eq!(
            solution.convergence,
            Convergence::Converged {
                iterations: 4,
                max_delta: 0.0
            }
        );
        assert_eq!(solution.iterations, 4);
    }

    #[rstest]
    fn dominates_fixed_policies(knapsack: Knapsack) {
        let config = SolverConfig::default();
        let optimal = value_iteration(&knapsack, &config).unwrap();
        let policies = [
            Policy::first_admissible(&knapsack).unwrap(),
            Policy::from_fn(&knapsack, |_, actions| actions.len() - 1).unwrap(),
            Policy::from_fn(&knapsack, |state: &KnapsackState, actions: &[Pick]| {
                if state.item == 0 {
                    0
                } else {
                    actions.len() - 1
                }
            })
            .unwrap(),
        ];
        for policy in &policies {
            let evaluation = evaluate_policy(&knapsack, policy, &config).unwrap();
            for (state, value) in evaluation.values.iter() {
                assert!(optimal.values.get(state).unwrap() >= value - 1e-9);
            }
        }
    }

    #[rstest]
    fn idle_inventory_orders_nothing(idle_inventory: Inventory) {
        let config = SolverConfig::default();
        let vi = value_iteration(&idle_inventory, &config).unwrap();
        let pi = policy_iteration(&idle_inventory, &config).unwrap();

        assert!(vi.policy.iter().all(|(_, order)| *order == 0));
        assert_eq!(vi.policy, pi.policy);
        assert!(vi.values.max_abs_diff(&pi.values) < 1e-5);
        // Holding s units forever costs s / (1 - 0.9).
        assert!((vi.values.get(&3).unwrap() + 30.0).abs() < 1e-4);
    }

    #[rstest]
    #[case(SweepMode::Synchronous)]
    #[case(SweepMode::InPlace)]
    fn sweep_modes_agree(#[case] sweep: SweepMode) {
        let env: Inventory = InventoryConfig::default().build_env(0).unwrap();
        let reference = policy_iteration(&env, &SolverConfig::default()).unwrap();
        let config = SolverConfig::default().with_sweep(sweep);
        let solution = value_iteration(&env, &config).unwrap();
        assert!(solution.convergence.is_converged());
        assert!(solution.values.max_abs_diff(&reference.values) < 1e-4);
    }

    #[rstest]
    fn history_has_one_snapshot_per_sweep(knapsack: Knapsack) {
        let config = SolverConfig::default().with_history(true);
        let solution = value_iteration(&knapsack, &config).unwrap();
        assert_eq!(solution.history.len(), solution.iterations);
        let start = KnapsackState {
            item: 0,
            remaining: 5,
        };
        let start_values: Vec<f64> = solution
            .history
            .iter()
            .map(|v| v.get(&start).unwrap())
            .collect();
        assert_eq!(start_values, vec![3.0, 7.0, 7.0, 7.0]);
    }

    #[test]
    fn discount_override() {
        let env: Inventory = InventoryConfig::default().build_env(0).unwrap();
        let myopic = value_iteration(&env, &SolverConfig::default().with_discount_factor(0.0))
            .unwrap();
        assert_eq!(myopic.iterations, 2);
        // One-period lookahead from empty stock
        let order = *myopic.policy.get(&0).unwrap();
        let best = (0..=10)
            .map(|q| {
                let successors = env.transition(&0, &q).unwrap();
                successors
                    .iter()
                    .map(|(next, p)| p * env.reward(&0, &q, next).unwrap())
                    .sum::<f64>()
            })
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((myopic.values.get(&0).unwrap() - best).abs() < 1e-9);
        assert!(env.actions(&0).unwrap().contains(&order));
    }
}
