//! Solver configuration
use super::SolveError;
use crate::envs::FiniteMdp;
use serde::{Deserialize, Serialize};

/// How a sweep applies Bellman backups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepMode {
    /// Every backup of a sweep reads the values of the previous sweep.
    Synchronous,
    /// Backups read values already updated earlier in the same sweep (Gauss-Seidel).
    InPlace,
}

impl Default for SweepMode {
    fn default() -> Self {
        Self::Synchronous
    }
}

/// Configuration shared by the dynamic programming solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Discount factor. Uses the environment discount factor if `None`.
    pub discount_factor: Option<f64>,
    /// Sweeps stop once the largest change in any state value is below this threshold.
    pub tolerance: f64,
    /// Maximum number of sweeps of a single value computation.
    pub max_iterations: usize,
    /// Maximum number of policy iteration evaluate-improve rounds.
    pub max_policy_iterations: usize,
    pub sweep: SweepMode,
    /// Record a snapshot of the value function at each iteration.
    pub record_history: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            discount_factor: None,
            tolerance: 1e-6,
            max_iterations: 1000,
            max_policy_iterations: 1000,
            sweep: SweepMode::default(),
            record_history: false,
        }
    }
}

impl SolverConfig {
    pub const fn with_discount_factor(self, discount_factor: f64) -> Self {
        Self {
            discount_factor: Some(discount_factor),
            ..self
        }
    }

    pub const fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub const fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    pub const fn with_sweep(self, sweep: SweepMode) -> Self {
        Self { sweep, ..self }
    }

    pub const fn with_history(self, record_history: bool) -> Self {
        Self {
            record_history,
            ..self
        }
    }

    /// Validate the configuration for an environment and resolve its discount factor.
    ///
    /// # Errors
    /// [`SolveError::InvalidConfig`] if the discount factor is outside `[0, 1]`,
    /// the tolerance is not positive, or an iteration limit is zero.
    pub fn resolve<E: FiniteMdp + ?Sized>(&self, env: &E) -> Result<f64, SolveError> {
        let discount_factor = self
            .discount_factor
            .unwrap_or_else(|| env.discount_factor());
        if !(0.0..=1.0).contains(&discount_factor) {
            return Err(SolveError::InvalidConfig(format!(
                "discount factor {} is not in [0, 1]",
                discount_factor
            )));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(SolveError::InvalidConfig(format!(
                "tolerance {} must be positive",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(SolveError::InvalidConfig(
                "max_iterations must be positive".into(),
            ));
        }
        if self.max_policy_iterations == 0 {
            return Err(SolveError::InvalidConfig(
                "max_policy_iterations must be positive".into(),
            ));
        }
        Ok(discount_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::{EnvBuilder, KnapsackConfig};
    use rstest::rstest;

    #[test]
    fn resolve_uses_env_discount_factor() {
        let env = KnapsackConfig::default().build_env(0).unwrap();
        assert_eq!(SolverConfig::default().resolve(&env), Ok(1.0));
        assert_eq!(
            SolverConfig::default()
                .with_discount_factor(0.5)
                .resolve(&env),
            Ok(0.5)
        );
    }

    #[rstest]
    #[case(SolverConfig::default().with_discount_factor(1.1))]
    #[case(SolverConfig::default().with_tolerance(0.0))]
    #[case(SolverConfig::default().with_tolerance(f64::NAN))]
    #[case(SolverConfig::default().with_max_iterations(0))]
    #[case(SolverConfig { max_policy_iterations: 0, ..SolverConfig::default() })]
    fn resolve_rejects(#[case] config: SolverConfig) {
        let env = KnapsackConfig::default().build_env(0).unwrap();
        assert!(matches!(
            config.resolve(&env),
            Err(SolveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn deserialize_partial() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"tolerance": 1e-4, "sweep": "in-place"}"#).unwrap();
        assert_eq!(
            config,
            SolverConfig::default()
                .with_tolerance(1e-4)
                .with_sweep(SweepMode::InPlace)
        );
    }
}
