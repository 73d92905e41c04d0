//! Finite-horizon production planning with deterministic demand
use super::builder::check_finite;
use super::{
    check_discount_factor, BuildEnvError, EnvBuilder, Episodic, FiniteMdp, ModelError,
    Successors,
};
use crate::solvers::{Policy, SolveError};
use serde::{Deserialize, Serialize};

/// Configuration of a [`ProductionPlan`] environment.
///
/// `demand`, `production_costs` and `holding_costs` hold one entry per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub demand: Vec<u32>,
    pub production_costs: Vec<f64>,
    pub holding_costs: Vec<f64>,
    /// Maximum stock level.
    pub capacity: u32,
    /// Stock at the start of the first period.
    pub start_inventory: u32,
    pub discount_factor: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            demand: vec![4, 5, 6, 5],
            production_costs: vec![5.0, 6.0, 10.0, 6.0],
            holding_costs: vec![3.0, 1.0, 6.0, 3.0],
            capacity: 12,
            start_inventory: 0,
            discount_factor: 1.0,
        }
    }
}

impl EnvBuilder<ProductionPlan> for PlanConfig {
    fn build_env(&self, _seed: u64) -> Result<ProductionPlan, BuildEnvError> {
        let horizon = self.demand.len();
        for (name, values) in [
            ("production_costs", &self.production_costs),
            ("holding_costs", &self.holding_costs),
        ] {
            if values.len() != horizon {
                return Err(BuildEnvError::LengthMismatch {
                    name,
                    expected: horizon,
                    actual: values.len(),
                });
            }
            for &value in values {
                check_finite(name, value)?;
            }
        }
        if self.start_inventory > self.capacity {
            return Err(BuildEnvError::StockAboveCapacity {
                stock: self.start_inventory,
                capacity: self.capacity,
            });
        }
        if let Some((period, &demand)) = self
            .demand
            .iter()
            .enumerate()
            .find(|(_, &d)| d > self.capacity)
        {
            return Err(BuildEnvError::DemandAboveCapacity {
                period,
                demand,
                capacity: self.capacity,
            });
        }
        check_discount_factor(self.discount_factor)?;
        Ok(ProductionPlan {
            config: self.clone(),
        })
    }
}

/// Production plan state: the current period and the stock available at its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanState {
    pub period: usize,
    pub stock: u32,
}

/// One period of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub period: usize,
    pub start_stock: u32,
    pub order: u32,
    pub demand: u32,
    pub end_stock: u32,
    pub production_cost: f64,
    pub holding_cost: f64,
}

/// A production plan obtained by following a policy from the initial state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub periods: Vec<PeriodReport>,
    pub total_production_cost: f64,
    pub total_holding_cost: f64,
    pub total_cost: f64,
}

/// Multi-period lot sizing as a deterministic MDP.
///
/// * State `(t, S)` with `t` in `0 ..= horizon` and stock `S` in `0 ..= capacity`.
/// * Action: the quantity `x` produced in period `t`, from `max(0, d_t - S)` (no shortage)
///     to `capacity - S` (no overflow).
/// * The stock at the end of the period is `I_t = S + x - d_t` and the next state is
///     `(t + 1, I_t)`.
/// * Reward `-(c_t x + h_t I_t)`.
///
/// States with `t == horizon` are terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionPlan {
    config: PlanConfig,
}

impl ProductionPlan {
    pub const fn config(&self) -> &PlanConfig {
        &self.config
    }

    /// Number of decision periods.
    pub fn horizon(&self) -> usize {
        self.config.demand.len()
    }

    fn check_action(&self, state: &PlanState, order: u32) -> Result<u32, ModelError> {
        if !self.contains(state) || self.is_terminal(state) {
            return Err(ModelError::invalid_state(state));
        }
        let demand = self.config.demand[state.period];
        match state.stock.checked_add(order) {
            Some(available) if available >= demand && available <= self.config.capacity => {
                Ok(available - demand)
            }
            _ => Err(ModelError::invalid_action(state, &order)),
        }
    }

    /// Follow a policy from the initial state and tabulate the resulting plan.
    ///
    /// # Errors
    /// * [`SolveError::MissingAction`] if the policy does not cover a visited state.
    /// * [`SolveError::Model`] if the policy chooses an inadmissible quantity.
    pub fn report(&self, policy: &Policy<PlanState, u32>) -> Result<PlanReport, SolveError> {
        let mut state = self.initial_state();
        let mut periods = Vec::with_capacity(self.horizon());
        while !self.is_terminal(&state) {
            let order = *policy
                .get(&state)
                .ok_or_else(|| SolveError::missing_action(&state))?;
            let end_stock = self.check_action(&state, order)?;
            let t = state.period;
            periods.push(PeriodReport {
                period: t,
                start_stock: state.stock,
                order,
                demand: self.config.demand[t],
                end_stock,
                production_cost: self.config.production_costs[t] * f64::from(order),
                holding_cost: self.config.holding_costs[t] * f64::from(end_stock),
            });
            state = PlanState {
                period: t + 1,
                stock: end_stock,
            };
        }
        let total_production_cost: f64 = periods.iter().map(|p| p.production_cost).sum();
        let total_holding_cost: f64 = periods.iter().map(|p| p.holding_cost).sum();
        Ok(PlanReport {
            periods,
            total_production_cost,
            total_holding_cost,
            total_cost: total_production_cost + total_holding_cost,
        })
    }
}

impl FiniteMdp for ProductionPlan {
    type State = PlanState;
    type Action = u32;

    fn states(&self) -> Vec<Self::State> {
        (0..=self.horizon())
            .flat_map(|period| {
                (0..=self.config.capacity).map(move |stock| PlanState { period, stock })
            })
            .collect()
    }

    fn contains(&self, state: &Self::State) -> bool {
        state.period <= self.horizon() && state.stock <= self.config.capacity
    }

    fn actions(&self, state: &Self::State) -> Result<Vec<Self::Action>, ModelError> {
        if !self.contains(state) {
            return Err(ModelError::invalid_state(state));
        }
        if self.is_terminal(state) {
            return Ok(Vec::new());
        }
        let min_order = self.config.demand[state.period].saturating_sub(state.stock);
        Ok((min_order..=self.config.capacity - state.stock).collect())
    }

    fn transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Successors<Self::State>, ModelError> {
        let end_stock = self.check_action(state, *action)?;
        Ok(Successors::deterministic(PlanState {
            period: state.period + 1,
            stock: end_stock,
        }))
    }

    fn reward(
        &self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<f64, ModelError> {
        self.check_action(state, *action)?;
        if !self.contains(next_state) {
            return Err(ModelError::invalid_state(next_state));
        }
        let t = state.period;
        Ok(-(self.config.production_costs[t] * f64::from(*action)
            + self.config.holding_costs[t] * f64::from(next_state.stock)))
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.period >= self.horizon()
    }

    fn discount_factor(&self) -> f64 {
        self.config.discount_factor
    }
}

impl Episodic for ProductionPlan {
    fn initial_state(&self) -> Self::State {
        PlanState {
            period: 0,
            stock: self.config.start_inventory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::solvers::{policy_iteration, value_iteration, SolverConfig};
    use rstest::{fixture, rstest};

    #[fixture]
    fn plan() -> ProductionPlan {
        PlanConfig::default().build_env(0).unwrap()
    }

    const fn state(period: usize, stock: u32) -> PlanState {
        PlanState { period, stock }
    }

    #[rstest]
    fn structure(plan: ProductionPlan) {
        testing::check_finite_mdp(&plan);
    }

    #[rstest]
    fn actions_avoid_shortage_and_overflow(plan: ProductionPlan) {
        assert_eq!(plan.actions(&state(0, 1)).unwrap(), (3..=11).collect::<Vec<_>>());
        assert_eq!(plan.actions(&state(0, 12)).unwrap(), vec![0]);
        assert!(plan.actions(&state(4, 3)).unwrap().is_empty());
    }

    #[rstest]
    fn reward_is_negative_cost(plan: ProductionPlan) {
        // Period 1: produce 6 onto 2 units, demand 5 leaves 3 at cost 6 * 6 + 1 * 3.
        let successors = plan.transition(&state(1, 2), &6).unwrap();
        assert_eq!(successors.probability(&state(2, 3)), 1.0);
        assert_eq!(plan.reward(&state(1, 2), &6, &state(2, 3)).unwrap(), -39.0);
    }

    #[rstest]
    fn invalid_queries(plan: ProductionPlan) {
        assert!(matches!(
            plan.transition(&state(1, 2), &2),
            Err(ModelError::InvalidAction { .. })
        ));
        assert!(matches!(
            plan.transition(&state(4, 0), &0),
            Err(ModelError::InvalidState { .. })
        ));
        assert!(matches!(
            plan.actions(&state(0, 13)),
            Err(ModelError::InvalidState { .. })
        ));
    }

    #[rstest]
    fn optimal_plan_builds_stock_before_expensive_period(plan: ProductionPlan) {
        let solution = value_iteration(&plan, &SolverConfig::default()).unwrap();
        let report = plan.report(&solution.policy).unwrap();
        assert_eq!(report.periods.len(), 4);

        // Producing period 2 demand in period 1 costs 6 + 1 per unit instead of 10.
        let orders: Vec<_> = report.periods.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![4, 11, 0, 5]);
        assert!((report.total_cost - 122.0).abs() < 1e-9);
        assert!(
            (report.total_cost + solution.values.get(&plan.initial_state()).unwrap()).abs()
                < 1e-9
        );
        assert!(
            (report.total_cost - report.total_production_cost - report.total_holding_cost).abs()
                < 1e-12
        );
    }

    #[rstest]
    fn policy_iteration_agrees(plan: ProductionPlan) {
        let config = SolverConfig::default();
        let vi = value_iteration(&plan, &config).unwrap();
        let pi = policy_iteration(&plan, &config).unwrap();
        assert!(vi.values.max_abs_diff(&pi.values) < 1e-6);
        assert_eq!(plan.report(&vi.policy), plan.report(&pi.policy));
    }

    #[rstest]
    fn report_requires_visited_actions(plan: ProductionPlan) {
        let policy: Policy<_, _> = [(state(0, 0), 4)].into_iter().collect();
        assert_eq!(
            plan.report(&policy),
            Err(SolveError::MissingAction {
                state: "PlanState { period: 1, stock: 0 }".into()
            })
        );
    }

    #[rstest]
    #[case(PlanConfig { holding_costs: vec![1.0], ..PlanConfig::default() },
           BuildEnvError::LengthMismatch { name: "holding_costs", expected: 4, actual: 1 })]
    #[case(PlanConfig { start_inventory: 13, ..PlanConfig::default() },
           BuildEnvError::StockAboveCapacity { stock: 13, capacity: 12 })]
    #[case(PlanConfig { demand: vec![4, 13, 6, 5], ..PlanConfig::default() },
           BuildEnvError::DemandAboveCapacity { period: 1, demand: 13, capacity: 12 })]
    fn invalid_config(#[case] config: PlanConfig, #[case] expected: BuildEnvError) {
        assert_eq!(config.build_env(0), Err(expected));
    }
}
