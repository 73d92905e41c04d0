//! Single-item inventory control
use super::builder::check_finite;
use super::{
    check_discount_factor, BuildEnvError, EnvBuilder, Episodic, FiniteMdp, ModelError,
    Successors, PROBABILITY_TOLERANCE,
};
use serde::{Deserialize, Serialize};

/// Configuration of an [`Inventory`] environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Maximum number of units held in stock.
    pub capacity: u32,
    /// Per-period demand distribution as `(demand, probability)` pairs.
    pub demand: Vec<(u32, f64)>,
    /// Cost per unit held at the end of a period.
    pub holding_cost: f64,
    /// Cost per unit ordered.
    pub unit_order_cost: f64,
    /// Cost charged once for any positive order.
    pub fixed_order_cost: f64,
    /// Revenue per unit sold.
    pub unit_price: f64,
    /// Stock level at the start of an episode.
    pub initial_stock: u32,
    pub discount_factor: f64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            demand: (0..5).map(|d| (d, 0.2)).collect(),
            holding_cost: 1.0,
            unit_order_cost: 2.0,
            fixed_order_cost: 4.0,
            unit_price: 5.0,
            initial_stock: 0,
            discount_factor: 0.95,
        }
    }
}

impl EnvBuilder<Inventory> for InventoryConfig {
    fn build_env(&self, _seed: u64) -> Result<Inventory, BuildEnvError> {
        if self.demand.is_empty() {
            return Err(BuildEnvError::EmptyDemand);
        }
        for &(demand, probability) in &self.demand {
            if !(0.0..=1.0).contains(&probability) {
                return Err(BuildEnvError::InvalidProbability {
                    demand,
                    probability,
                });
            }
        }
        let total: f64 = self.demand.iter().map(|(_, p)| p).sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(BuildEnvError::DemandNotNormalized { total });
        }
        check_finite("holding_cost", self.holding_cost)?;
        check_finite("unit_order_cost", self.unit_order_cost)?;
        check_finite("fixed_order_cost", self.fixed_order_cost)?;
        check_finite("unit_price", self.unit_price)?;
        check_discount_factor(self.discount_factor)?;
        if self.initial_stock > self.capacity {
            return Err(BuildEnvError::StockAboveCapacity {
                stock: self.initial_stock,
                capacity: self.capacity,
            });
        }
        Ok(Inventory {
            config: self.clone(),
        })
    }
}

/// Single-item inventory control with stochastic demand.
///
/// * The state is the stock level at the start of a period, `0 ..= capacity`.
/// * The action is the order quantity, at most `capacity - stock`.
///     Orders arrive immediately.
/// * Demand is drawn from a fixed distribution; unmet demand is lost.
/// * The reward is sales revenue minus ordering costs and the holding cost of
///     the stock left at the end of the period.
///
/// There are no terminal states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    config: InventoryConfig,
}

impl Inventory {
    pub const fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub const fn capacity(&self) -> u32 {
        self.config.capacity
    }

    /// Total cost of placing an order.
    pub fn order_cost(&self, quantity: u32) -> f64 {
        if quantity == 0 {
            0.0
        } else {
            self.config.fixed_order_cost + self.config.unit_order_cost * f64::from(quantity)
        }
    }

    fn check_action(&self, stock: u32, order: u32) -> Result<(), ModelError> {
        if !self.contains(&stock) {
            return Err(ModelError::invalid_state(&stock));
        }
        if order > self.config.capacity - stock {
            return Err(ModelError::invalid_action(&stock, &order));
        }
        Ok(())
    }
}

impl FiniteMdp for Inventory {
    type State = u32;
    type Action = u32;

    fn states(&self) -> Vec<Self::State> {
        (0..=self.config.capacity).collect()
    }

    fn contains(&self, state: &Self::State) -> bool {
        *state <= self.config.capacity
    }

    fn actions(&self, state: &Self::State) -> Result<Vec<Self::Action>, ModelError> {
        if !self.contains(state) {
            return Err(ModelError::invalid_state(state));
        }
        Ok((0..=self.config.capacity - state).collect())
    }

    fn transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Successors<Self::State>, ModelError> {
        self.check_action(*state, *action)?;
        let available = state + action;
        Ok(Successors::from_weighted(
            self.config
                .demand
                .iter()
                .map(|&(demand, probability)| (available.saturating_sub(demand), probability)),
        ))
    }

    fn reward(
        &self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<f64, ModelError> {
        self.check_action(*state, *action)?;
        if !self.contains(next_state) {
            return Err(ModelError::invalid_state(next_state));
        }
        let sold = f64::from(state + action) - f64::from(*next_state);
        Ok(self.config.unit_price * sold
            - self.order_cost(*action)
            - self.config.holding_cost * f64::from(*next_state))
    }

    fn is_terminal(&self, _: &Self::State) -> bool {
        false
    }

    fn discount_factor(&self) -> f64 {
        self.config.discount_factor
    }
}

impl Episodic for Inventory {
    fn initial_state(&self) -> Self::State {
        self.config.initial_stock
    }
}
