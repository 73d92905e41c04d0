//! Command-line interface
mod env;
mod options;

pub use options::{Algorithm, EnvCommand, InventoryOptions, KnapsackOptions, Options, PlanOptions};

use crate::envs::{
    EnvBuilder, Episodic, FiniteMdp, Inventory, InventoryConfig, Knapsack, KnapsackConfig,
    PlanConfig, ProductionPlan,
};
use crate::instances::{KnapsackInstanceConfig, PlanInstanceConfig};
use crate::simulation::{rollout, Trajectory};
use crate::solvers::{
    policy_iteration, value_iteration, Convergence, Policy, SolveError, Solution, SolverConfig,
    ValueFunction,
};
use crate::DpError;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::fs;

/// Update a configuration in place from a source of settings.
pub trait Update<T> {
    fn update(&mut self, source: T);
}

/// Builder-style [`Update`].
pub trait WithUpdate<T> {
    #[must_use]
    fn with_update(self, source: T) -> Self;
}

impl<T, U: Update<T>> WithUpdate<T> for U {
    fn with_update(mut self, source: T) -> Self {
        self.update(source);
        self
    }
}

impl Algorithm {
    /// Solve an environment with this algorithm.
    ///
    /// # Errors
    /// Any error of the underlying solver.
    pub fn solve<E: FiniteMdp + ?Sized>(
        self,
        env: &E,
        config: &SolverConfig,
    ) -> Result<Solution<E::State, E::Action>, SolveError> {
        match self {
            Self::ValueIteration => value_iteration(env, config),
            Self::PolicyIteration => policy_iteration(env, config),
        }
    }
}

/// Solver configuration from the `--config` file (if any) updated by the command-line options.
///
/// # Errors
/// If the configuration file cannot be read or parsed.
pub fn solver_config(opts: &Options) -> Result<SolverConfig, DpError> {
    let config = match &opts.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => SolverConfig::default(),
    };
    Ok(config.with_update(opts))
}

/// Solver output for one state.
#[derive(Debug, Serialize)]
struct StateReport<'a, S, A> {
    state: &'a S,
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a A>,
}

#[derive(Serialize)]
#[serde(bound = "E: Serialize, E::State: Serialize, E::Action: Serialize, D: Serialize")]
struct Report<'a, E: Episodic, D> {
    environment: &'a E,
    algorithm: Algorithm,
    discount_factor: f64,
    iterations: usize,
    convergence: Convergence,
    states: Vec<StateReport<'a, E::State, E::Action>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rollout: Option<Trajectory<E::State, E::Action>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    history: Vec<ValueFunction<E::State>>,
}

/// Run the command described by `opts` and return its JSON report.
///
/// # Errors
/// Invalid options, environment parameters or solver failures.
pub fn run(opts: &Options) -> Result<Value, DpError> {
    let config = solver_config(opts)?;
    match &opts.environment {
        EnvCommand::Inventory(env_opts) => {
            let env: Inventory = InventoryConfig::from(env_opts).build_env(opts.seed)?;
            solve_and_report(&env, opts, &config, |_, _| Ok(None::<()>))
        }
        EnvCommand::Knapsack(env_opts) => {
            let env: Knapsack = if env_opts.generate {
                KnapsackInstanceConfig::from(env_opts).generate(opts.seed)?
            } else {
                KnapsackConfig::try_from(env_opts)?.build_env(opts.seed)?
            };
            solve_and_report(&env, opts, &config, |env, policy| {
                env.selection(policy).map(Some)
            })
        }
        EnvCommand::Plan(env_opts) => {
            let env: ProductionPlan = if env_opts.generate {
                PlanInstanceConfig::from(env_opts).generate(opts.seed)?
            } else {
                PlanConfig::from(env_opts).build_env(opts.seed)?
            };
            solve_and_report(&env, opts, &config, |env, policy| env.report(policy).map(Some))
        }
    }
}

fn solve_and_report<E, F, D>(
    env: &E,
    opts: &Options,
    config: &SolverConfig,
    summarize: F,
) -> Result<Value, DpError>
where
    E: Episodic + Serialize,
    E::State: Serialize,
    E::Action: Serialize,
    F: FnOnce(&E, &Policy<E::State, E::Action>) -> Result<Option<D>, SolveError>,
    D: Serialize,
{
    let discount_factor = config.resolve(env)?;
    let solution = opts.algorithm.solve(env, config)?;
    info!(
        "{:?} finished after {} iterations: {:?}",
        opts.algorithm, solution.iterations, solution.convergence
    );

    let states = solution
        .values
        .iter()
        .map(|(state, value)| StateReport {
            state,
            value,
            action: solution.policy.get(state),
        })
        .collect();
    let trajectory = match opts.rollout_steps {
        Some(max_steps) => Some(rollout(env, &solution.policy, max_steps, opts.seed)?),
        None => None,
    };
    let report = Report {
        environment: env,
        algorithm: opts.algorithm,
        discount_factor,
        iterations: solution.iterations,
        convergence: solution.convergence,
        states,
        summary: summarize(env, &solution.policy)?,
        rollout: trajectory,
        history: solution.history,
    };
    Ok(serde_json::to_value(&report)?)
}
