//! Simulating policies in an environment
use crate::envs::{Episodic, FiniteMdp, ModelError};
use crate::solvers::{Policy, SolveError};
use crate::Prng;
use log::debug;
use rand::SeedableRng;
use serde::Serialize;

/// A single environment transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step<S, A> {
    pub state: S,
    pub action: A,
    pub reward: f64,
    pub next_state: S,
}

/// The steps of one simulated episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory<S, A> {
    pub steps: Vec<Step<S, A>>,
    /// Whether the episode ended in a terminal state (as opposed to the step limit).
    pub terminated: bool,
}

impl<S, A> Trajectory<S, A> {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of all rewards.
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|step| step.reward).sum()
    }

    /// Sum of rewards discounted by their step index.
    pub fn discounted_return(&self, discount_factor: f64) -> f64 {
        self.steps
            .iter()
            .rev()
            .fold(0.0, |ret, step| step.reward + discount_factor * ret)
    }
}

/// Run a policy from the initial state of an environment.
///
/// Successor states are sampled with a generator seeded by `seed`.
/// The episode stops at a terminal state or after `max_steps` steps.
///
/// # Errors
/// * [`SolveError::MissingAction`] if the policy does not cover a visited state.
/// * [`SolveError::Model`] if a policy action is not admissible or a successor distribution
///     is malformed. Distributions are never renormalized.
pub fn rollout<E>(
    env: &E,
    policy: &Policy<E::State, E::Action>,
    max_steps: usize,
    seed: u64,
) -> Result<Trajectory<E::State, E::Action>, SolveError>
where
    E: Episodic + ?Sized,
{
    let mut rng = Prng::seed_from_u64(seed);
    let mut state = env.initial_state();
    let mut steps = Vec::new();

    while steps.len() < max_steps {
        if env.is_terminal(&state) {
            break;
        }
        let action = policy
            .get(&state)
            .ok_or_else(|| SolveError::missing_action(&state))?
            .clone();
        let successors = env.transition(&state, &action)?;
        successors.validate(&state, &action)?;
        let next_state = successors
            .sample(&mut rng)
            .ok_or_else(|| ModelError::MalformedTransition {
                state: format!("{:?}", state),
                action: format!("{:?}", action),
                total: successors.total_probability(),
            })?
            .clone();
        let reward = env.reward(&state, &action, &next_state)?;
        steps.push(Step {
            state,
            action,
            reward,
            next_state: next_state.clone(),
        });
        state = next_state;
    }

    let terminated = env.is_terminal(&state);
    debug!(
        "rollout of {} steps (terminated: {})",
        steps.len(),
        terminated
    );
    Ok(Trajectory { steps, terminated })
}
