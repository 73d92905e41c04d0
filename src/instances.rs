//! Seeded generators of random problem instances
use crate::envs::{
    check_range, BuildEnvError, EnvBuilder, Item, Knapsack, KnapsackConfig, PlanConfig,
    ProductionPlan,
};
use crate::Prng;
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Production cost category of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Season {
    Cheap,
    Medium,
    Expensive,
}

const SEASONS: [Season; 3] = [Season::Cheap, Season::Medium, Season::Expensive];

/// Generator of seasonal [`ProductionPlan`] instances.
///
/// Each period is cheap, medium or expensive to produce in.
/// Holding stock is cheap right before an expensive period and expensive during one,
/// which rewards building inventory ahead of expensive periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanInstanceConfig {
    pub num_periods: usize,
    pub cheap_cost: (f64, f64),
    pub medium_cost: (f64, f64),
    pub expensive_cost: (f64, f64),
    pub cheap_holding: (f64, f64),
    pub medium_holding: (f64, f64),
    pub expensive_holding: (f64, f64),
    /// Inclusive range of the base demand.
    pub base_demand: (u32, u32),
    /// Amplitude of the integer noise added to the base demand.
    pub demand_noise: u32,
    pub expensive_probability: f64,
    pub cheap_probability: f64,
    /// Start inventory is drawn uniformly from `0 ..= start_inventory_max`.
    pub start_inventory_max: u32,
    /// Force at least one expensive period with cheap neighbours.
    pub ensure_windows: bool,
    pub capacity: u32,
    pub discount_factor: f64,
}

impl Default for PlanInstanceConfig {
    fn default() -> Self {
        Self {
            num_periods: 12,
            cheap_cost: (4.0, 6.0),
            medium_cost: (6.0, 8.0),
            expensive_cost: (8.0, 12.0),
            cheap_holding: (1.0, 3.0),
            medium_holding: (3.0, 5.0),
            expensive_holding: (5.0, 8.0),
            base_demand: (4, 6),
            demand_noise: 1,
            expensive_probability: 0.25,
            cheap_probability: 0.35,
            start_inventory_max: 3,
            ensure_windows: true,
            capacity: 20,
            discount_factor: 1.0,
        }
    }
}

impl PlanInstanceConfig {
    /// Generate an instance. The same seed always gives the same instance.
    ///
    /// # Errors
    /// Invalid ranges or probabilities, or parameters that give an invalid plan.
    pub fn generate(&self, seed: u64) -> Result<ProductionPlan, BuildEnvError> {
        self.build_env(seed)
    }

    fn check(&self) -> Result<(), BuildEnvError> {
        for (name, (low, high)) in [
            ("cheap_cost", self.cheap_cost),
            ("medium_cost", self.medium_cost),
            ("expensive_cost", self.expensive_cost),
            ("cheap_holding", self.cheap_holding),
            ("medium_holding", self.medium_holding),
            ("expensive_holding", self.expensive_holding),
        ] {
            check_range(name, low, high)?;
        }
        let (low, high) = self.base_demand;
        check_range("base_demand", f64::from(low), f64::from(high))
    }

    fn seasons(&self, rng: &mut Prng) -> Result<Vec<Season>, BuildEnvError> {
        let medium_probability =
            (1.0 - self.expensive_probability - self.cheap_probability).max(0.0);
        let weights = WeightedIndex::new([
            self.cheap_probability,
            medium_probability,
            self.expensive_probability,
        ])?;
        let mut seasons: Vec<_> = (0..self.num_periods)
            .map(|_| SEASONS[weights.sample(rng)])
            .collect();

        if self.ensure_windows && !seasons.is_empty() {
            let found = seasons.iter().position(|&s| s == Season::Expensive);
            let expensive = match found {
                Some(t) => t,
                None => {
                    let t = rng.gen_range(0..seasons.len());
                    seasons[t] = Season::Expensive;
                    t
                }
            };
            for t in [expensive.wrapping_sub(1), expensive + 1] {
                if let Some(season) = seasons.get_mut(t) {
                    if *season == Season::Medium {
                        *season = Season::Cheap;
                    }
                }
            }
        }
        Ok(seasons)
    }
}

/// Uniform sample from `[low, high]` rounded to cents.
fn sample_cost(rng: &mut Prng, (low, high): (f64, f64)) -> f64 {
    (rng.gen_range(low..=high) * 100.0).round() / 100.0
}

impl EnvBuilder<ProductionPlan> for PlanInstanceConfig {
    fn build_env(&self, seed: u64) -> Result<ProductionPlan, BuildEnvError> {
        self.check()?;
        let mut rng = Prng::seed_from_u64(seed);
        let seasons = self.seasons(&mut rng)?;

        let production_costs = seasons
            .iter()
            .map(|season| {
                let range = match season {
                    Season::Cheap => self.cheap_cost,
                    Season::Medium => self.medium_cost,
                    Season::Expensive => self.expensive_cost,
                };
                sample_cost(&mut rng, range)
            })
            .collect();

        let holding_costs = (0..seasons.len())
            .map(|t| {
                let range = if seasons[t] == Season::Expensive {
                    self.expensive_holding
                } else if seasons.get(t + 1) == Some(&Season::Expensive) {
                    self.cheap_holding
                } else {
                    self.medium_holding
                };
                sample_cost(&mut rng, range)
            })
            .collect();

        let (low, high) = self.base_demand;
        let noise = i64::from(self.demand_noise);
        let demand = (0..seasons.len())
            .map(|_| {
                let base = i64::from(rng.gen_range(low..=high));
                let noisy = base + rng.gen_range(-noise..=noise);
                u32::try_from(noisy.max(0)).unwrap_or(u32::MAX)
            })
            .collect();

        let start_inventory = rng.gen_range(0..=self.start_inventory_max);
        debug!(
            "generated production plan with seasons {:?} and start inventory {}",
            seasons, start_inventory
        );

        PlanConfig {
            demand,
            production_costs,
            holding_costs,
            capacity: self.capacity,
            start_inventory,
            discount_factor: self.discount_factor,
        }
        .build_env(seed)
    }
}

/// Generator of random [`Knapsack`] instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnapsackInstanceConfig {
    pub num_items: usize,
    /// Inclusive range of item weights.
    pub weight_range: (u32, u32),
    /// Item values are drawn uniformly from this range and rounded to integers.
    pub value_range: (f64, f64),
    /// Capacity as a fraction of the total item weight.
    pub capacity_ratio: f64,
    pub discount_factor: f64,
}

impl Default for KnapsackInstanceConfig {
    fn default() -> Self {
        Self {
            num_items: 10,
            weight_range: (1, 10),
            value_range: (1.0, 15.0),
            capacity_ratio: 0.5,
            discount_factor: 1.0,
        }
    }
}

impl KnapsackInstanceConfig {
    /// Generate an instance. The same seed always gives the same instance.
    ///
    /// # Errors
    /// Invalid ranges or a negative capacity ratio.
    pub fn generate(&self, seed: u64) -> Result<Knapsack, BuildEnvError> {
        self.build_env(seed)
    }
}

impl EnvBuilder<Knapsack> for KnapsackInstanceConfig {
    fn build_env(&self, seed: u64) -> Result<Knapsack, BuildEnvError> {
        let (low, high) = self.weight_range;
        check_range("weight_range", f64::from(low), f64::from(high))?;
        check_range("value_range", self.value_range.0, self.value_range.1)?;
        check_range("capacity_ratio", 0.0, self.capacity_ratio)?;

        let mut rng = Prng::seed_from_u64(seed);
        let items: Vec<_> = (0..self.num_items)
            .map(|_| Item {
                weight: rng.gen_range(low..=high),
                value: rng
                    .gen_range(self.value_range.0..=self.value_range.1)
                    .round(),
            })
            .collect();
        let total_weight: f64 = items.iter().map(|item| f64::from(item.weight)).sum();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let capacity = (self.capacity_ratio * total_weight).floor() as u32;

        KnapsackConfig {
            items,
            capacity,
            discount_factor: self.discount_factor,
        }
        .build_env(seed)
    }
}
