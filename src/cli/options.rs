//! Command-line options
use clap::{ArgEnum, Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(
    name = "dpsolve",
    author,
    version,
    about = "Solve finite Markov decision processes with dynamic programming",
    after_help = "Solver options may be given before or after the environment name."
)]
pub struct Options {
    #[clap(subcommand)]
    pub environment: EnvCommand,

    /// Solution algorithm
    #[clap(short, long, arg_enum, global = true, default_value = "value-iteration")]
    pub algorithm: Algorithm,

    /// JSON file with solver configuration; command-line options take precedence
    #[clap(long, global = true, help_heading = Some("SOLVER OPTIONS"))]
    pub config: Option<PathBuf>,

    /// Discount factor; defaults to the environment discount factor
    #[clap(long, global = true, help_heading = Some("SOLVER OPTIONS"))]
    pub discount_factor: Option<f64>,

    /// Stop once no state value changes by more than this amount in a sweep
    #[clap(long, global = true, help_heading = Some("SOLVER OPTIONS"))]
    pub tolerance: Option<f64>,

    /// Maximum number of sweeps of a single value computation
    #[clap(long, global = true, help_heading = Some("SOLVER OPTIONS"))]
    pub max_iterations: Option<usize>,

    /// Maximum number of policy iteration rounds
    #[clap(long, global = true, help_heading = Some("SOLVER OPTIONS"))]
    pub max_policy_iterations: Option<usize>,

    /// Update values in place within each sweep
    #[clap(long, global = true, help_heading = Some("SOLVER OPTIONS"))]
    pub in_place: bool,

    /// Include the value function of every iteration in the output
    #[clap(long, global = true, help_heading = Some("SOLVER OPTIONS"))]
    pub history: bool,

    /// Random seed for instance generation and rollouts
    #[clap(long, global = true, default_value_t = 0)]
    pub seed: u64,

    /// Simulate the solved policy for at most this many steps
    #[clap(long, global = true)]
    pub rollout_steps: Option<usize>,
}

/// Solution algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ArgEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    ValueIteration,
    PolicyIteration,
}

/// Environment to solve
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum EnvCommand {
    /// Single-item inventory control with stochastic demand
    Inventory(InventoryOptions),
    /// Sequential 0/1 knapsack
    Knapsack(KnapsackOptions),
    /// Multi-period production planning
    Plan(PlanOptions),
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct InventoryOptions {
    /// Maximum stock level
    #[clap(long)]
    pub capacity: Option<u32>,

    /// Probabilities of a demand of 0, 1, 2, ... units per period
    #[clap(long, multiple_values = true)]
    pub demand: Option<Vec<f64>>,

    /// Cost per unit held at the end of a period
    #[clap(long)]
    pub holding_cost: Option<f64>,

    /// Cost per unit ordered
    #[clap(long)]
    pub unit_order_cost: Option<f64>,

    /// Cost of placing any order
    #[clap(long)]
    pub fixed_order_cost: Option<f64>,

    /// Revenue per unit sold
    #[clap(long)]
    pub unit_price: Option<f64>,

    /// Stock at the start of a rollout
    #[clap(long)]
    pub initial_stock: Option<u32>,
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct KnapsackOptions {
    /// Item weights
    #[clap(long, multiple_values = true, requires = "values")]
    pub weights: Option<Vec<u32>>,

    /// Item values, one per weight
    #[clap(long, multiple_values = true, requires = "weights")]
    pub values: Option<Vec<f64>>,

    /// Knapsack capacity
    #[clap(long)]
    pub capacity: Option<u32>,

    /// Generate a random instance from --seed
    #[clap(long, conflicts_with_all = &["weights", "values", "capacity"])]
    pub generate: bool,

    /// Number of items of a generated instance
    #[clap(long, requires = "generate")]
    pub num_items: Option<usize>,
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct PlanOptions {
    /// Demand of each period
    #[clap(long, multiple_values = true)]
    pub demand: Option<Vec<u32>>,

    /// Production cost per unit in each period
    #[clap(long, multiple_values = true)]
    pub production_costs: Option<Vec<f64>>,

    /// Holding cost per unit left at the end of each period
    #[clap(long, multiple_values = true)]
    pub holding_costs: Option<Vec<f64>>,

    /// Maximum stock level
    #[clap(long)]
    pub capacity: Option<u32>,

    /// Stock at the start of the first period
    #[clap(long)]
    pub start_inventory: Option<u32>,

    /// Generate a random seasonal instance from --seed
    #[clap(long, conflicts_with_all = &["demand", "production-costs", "holding-costs", "start-inventory"])]
    pub generate: bool,

    /// Number of periods of a generated instance
    #[clap(long, requires = "generate")]
    pub num_periods: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = Options::try_parse_from(["dpsolve", "knapsack"]).unwrap();
        assert_eq!(opts.algorithm, Algorithm::ValueIteration);
        assert_eq!(opts.environment, EnvCommand::Knapsack(KnapsackOptions::default()));
        assert_eq!(opts.seed, 0);
        assert!(!opts.in_place);
    }

    #[test]
    fn solver_options_after_environment() {
        let opts = Options::try_parse_from([
            "dpsolve",
            "inventory",
            "--capacity",
            "5",
            "--algorithm",
            "policy-iteration",
            "--tolerance",
            "1e-4",
            "--in-place",
        ])
        .unwrap();
        assert_eq!(opts.algorithm, Algorithm::PolicyIteration);
        assert_eq!(opts.tolerance, Some(1e-4));
        assert!(opts.in_place);
        match opts.environment {
            EnvCommand::Inventory(env) => assert_eq!(env.capacity, Some(5)),
            _ => panic!("expected inventory"),
        }
    }

    #[test]
    fn multiple_values() {
        let opts = Options::try_parse_from([
            "dpsolve",
            "knapsack",
            "--weights",
            "2",
            "3",
            "--values",
            "3",
            "4",
            "--capacity",
            "4",
        ])
        .unwrap();
        assert_eq!(
            opts.environment,
            EnvCommand::Knapsack(KnapsackOptions {
                weights: Some(vec![2, 3]),
                values: Some(vec![3.0, 4.0]),
                capacity: Some(4),
                ..KnapsackOptions::default()
            })
        );
    }

    #[test]
    fn generate_conflicts_with_explicit_items() {
        let result =
            Options::try_parse_from(["dpsolve", "knapsack", "--generate", "--capacity", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn environment_is_required() {
        assert!(Options::try_parse_from(["dpsolve"]).is_err());
    }
}
