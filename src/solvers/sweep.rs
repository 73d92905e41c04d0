//! Repeated Bellman backups over all states
use super::{Convergence, SolverConfig, SweepMode};
use log::{debug, warn};
use ndarray::Array1;

/// Result of sweeping until convergence.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub values: Array1<f64>,
    pub convergence: Convergence,
    /// Values after each sweep, if requested.
    pub history: Vec<Array1<f64>>,
}

/// Apply `backup` to every non-terminal state until the values converge.
///
/// Values start at zero; terminal states stay at zero.
/// `backup(s, values)` computes the new value of state `s` from the current values.
///
/// Stops when the largest absolute change of a sweep is below `config.tolerance`,
/// or after `config.max_iterations` sweeps.
pub fn sweep_until_converged<F>(
    terminal: &[bool],
    config: &SolverConfig,
    name: &str,
    mut backup: F,
) -> SweepResult
where
    F: FnMut(usize, &Array1<f64>) -> f64,
{
    let num_states = terminal.len();
    let mut values = Array1::<f64>::zeros(num_states);
    let mut history = Vec::new();
    let mut max_delta = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        max_delta = match config.sweep {
            SweepMode::Synchronous => {
                let next = Array1::from_shape_fn(num_states, |s| {
                    if terminal[s] {
                        0.0
                    } else {
                        backup(s, &values)
                    }
                });
                let delta = max_abs_diff(&next, &values);
                values = next;
                delta
            }
            SweepMode::InPlace => {
                let mut delta: f64 = 0.0;
                for s in (0..num_states).filter(|&s| !terminal[s]) {
                    let value = backup(s, &values);
                    delta = delta.max((value - values[s]).abs());
                    values[s] = value;
                }
                delta
            }
        };
        if config.record_history {
            history.push(values.clone());
        }
        debug!("{} sweep {}: max delta {:e}", name, iteration, max_delta);

        if max_delta < config.tolerance {
            return SweepResult {
                values,
                convergence: Convergence::Converged {
                    iterations: iteration,
                    max_delta,
                },
                history,
            };
        }
    }

    warn!(
        "{} stopped after {} sweeps without converging (max delta {:e}, tolerance {:e})",
        name, config.max_iterations, max_delta, config.tolerance
    );
    SweepResult {
        values,
        convergence: Convergence::IterationLimit {
            iterations: config.max_iterations,
            max_delta,
        },
        history,
    }
}

fn max_abs_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    (a - b).fold(0.0, |max, x| f64::max(max, x.abs()))
}
