//! Environment and solver configuration from command-line options
use super::options::{InventoryOptions, KnapsackOptions, Options, PlanOptions};
use super::{Update, WithUpdate};
use crate::envs::{BuildEnvError, InventoryConfig, Item, KnapsackConfig, PlanConfig};
use crate::instances::{KnapsackInstanceConfig, PlanInstanceConfig};
use crate::solvers::{SolverConfig, SweepMode};

impl From<&InventoryOptions> for InventoryConfig {
    fn from(opts: &InventoryOptions) -> Self {
        Self::default().with_update(opts)
    }
}

impl Update<&InventoryOptions> for InventoryConfig {
    fn update(&mut self, opts: &InventoryOptions) {
        if let Some(capacity) = opts.capacity {
            self.capacity = capacity;
        }
        if let Some(ref probabilities) = opts.demand {
            self.demand = (0..).zip(probabilities.iter().copied()).collect();
        }
        if let Some(holding_cost) = opts.holding_cost {
            self.holding_cost = holding_cost;
        }
        if let Some(unit_order_cost) = opts.unit_order_cost {
            self.unit_order_cost = unit_order_cost;
        }
        if let Some(fixed_order_cost) = opts.fixed_order_cost {
            self.fixed_order_cost = fixed_order_cost;
        }
        if let Some(unit_price) = opts.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(initial_stock) = opts.initial_stock {
            self.initial_stock = initial_stock;
        }
    }
}

impl TryFrom<&KnapsackOptions> for KnapsackConfig {
    type Error = BuildEnvError;

    fn try_from(opts: &KnapsackOptions) -> Result<Self, Self::Error> {
        if let (Some(weights), Some(values)) = (&opts.weights, &opts.values) {
            if weights.len() != values.len() {
                return Err(BuildEnvError::LengthMismatch {
                    name: "values",
                    expected: weights.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(Self::default().with_update(opts))
    }
}

impl Update<&KnapsackOptions> for KnapsackConfig {
    fn update(&mut self, opts: &KnapsackOptions) {
        if let (Some(weights), Some(values)) = (&opts.weights, &opts.values) {
            self.items = weights
                .iter()
                .zip(values)
                .map(|(&weight, &value)| Item::new(weight, value))
                .collect();
        }
        if let Some(capacity) = opts.capacity {
            self.capacity = capacity;
        }
    }
}

impl From<&KnapsackOptions> for KnapsackInstanceConfig {
    fn from(opts: &KnapsackOptions) -> Self {
        Self::default().with_update(opts)
    }
}

impl Update<&KnapsackOptions> for KnapsackInstanceConfig {
    fn update(&mut self, opts: &KnapsackOptions) {
        if let Some(num_items) = opts.num_items {
            self.num_items = num_items;
        }
    }
}

impl From<&PlanOptions> for PlanConfig {
    fn from(opts: &PlanOptions) -> Self {
        Self::default().with_update(opts)
    }
}

impl Update<&PlanOptions> for PlanConfig {
    fn update(&mut self, opts: &PlanOptions) {
        if let Some(ref demand) = opts.demand {
            self.demand = demand.clone();
        }
        if let Some(ref production_costs) = opts.production_costs {
            self.production_costs = production_costs.clone();
        }
        if let Some(ref holding_costs) = opts.holding_costs {
            self.holding_costs = holding_costs.clone();
        }
        if let Some(capacity) = opts.capacity {
            self.capacity = capacity;
        }
        if let Some(start_inventory) = opts.start_inventory {
            self.start_inventory = start_inventory;
        }
    }
}

impl From<&PlanOptions> for PlanInstanceConfig {
    fn from(opts: &PlanOptions) -> Self {
        Self::default().with_update(opts)
    }
}

impl Update<&PlanOptions> for PlanInstanceConfig {
    fn update(&mut self, opts: &PlanOptions) {
        if let Some(num_periods) = opts.num_periods {
            self.num_periods = num_periods;
        }
        if let Some(capacity) = opts.capacity {
            self.capacity = capacity;
        }
    }
}

impl Update<&Options> for SolverConfig {
    fn update(&mut self, opts: &Options) {
        if let Some(discount_factor) = opts.discount_factor {
            self.discount_factor = Some(discount_factor);
        }
        if let Some(tolerance) = opts.tolerance {
            self.tolerance = tolerance;
        }
        if let Some(max_iterations) = opts.max_iterations {
            self.max_iterations = max_iterations;
        }
        if let Some(max_policy_iterations) = opts.max_policy_iterations {
            self.max_policy_iterations = max_policy_iterations;
        }
        if opts.in_place {
            self.sweep = SweepMode::InPlace;
        }
        if opts.history {
            self.record_history = true;
        }
    }
}
