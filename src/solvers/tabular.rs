//! Lookup-table snapshot of a finite environment
use super::{Policy, SolveError, StateIndex};
use crate::envs::{FiniteMdp, ModelError};
use ndarray::Array1;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// Action values closer than this are considered tied.
pub const TIE_TOLERANCE: f64 = 1e-9;

/// One successor of a state-action pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// Index of the successor state.
    pub next: usize,
    pub probability: f64,
    pub reward: f64,
}

/// A finite MDP with transitions and rewards stored in lookup tables.
///
/// States and actions are addressed by index:
/// state `s` is the `s`-th state of [`FiniteMdp::states`] and
/// action `a` of state `s` is the `a`-th element of [`FiniteMdp::actions`].
///
/// States without admissible actions are treated as terminal.
#[derive(Debug, Clone)]
pub struct TabularModel<S, A> {
    index: Rc<StateIndex<S>>,
    terminal: Vec<bool>,
    actions: Vec<Vec<A>>,
    /// `outcomes[s][a]` lists the successors of action `a` in state `s`.
    outcomes: Vec<Vec<SmallVec<[Outcome; 4]>>>,
}

impl<S, A> TabularModel<S, A>
where
    S: Clone + Eq + Hash + Debug,
    A: PartialEq + Debug,
{
    /// Tabulate an environment, validating every transition.
    ///
    /// # Errors
    /// * [`ModelError::MalformedTransition`] if a successor distribution is not normalized.
    /// * [`ModelError::InvalidProbability`] if a successor has a negative probability.
    /// * [`ModelError::InvalidState`] if a successor is outside the state space.
    /// * Any error raised by the environment while querying it.
    pub fn from_env<E>(env: &E) -> Result<Self, ModelError>
    where
        E: FiniteMdp<State = S, Action = A> + ?Sized,
    {
        let index = StateIndex::new(env.states());
        let num_states = index.len();
        let mut terminal = Vec::with_capacity(num_states);
        let mut actions = Vec::with_capacity(num_states);
        let mut outcomes = Vec::with_capacity(num_states);

        for state in index.states() {
            let state_actions = if env.is_terminal(state) {
                Vec::new()
            } else {
                env.actions(state)?
            };
            let mut state_outcomes = Vec::with_capacity(state_actions.len());
            for action in &state_actions {
                let successors = env.transition(state, action)?;
                successors.validate(state, action)?;
                let action_outcomes = successors
                    .iter()
                    .map(|(next_state, probability)| -> Result<Outcome, ModelError> {
                        let next = index
                            .position(next_state)
                            .ok_or_else(|| ModelError::invalid_state(next_state))?;
                        Ok(Outcome {
                            next,
                            probability: *probability,
                            reward: env.reward(state, action, next_state)?,
                        })
                    })
                    .collect::<Result<SmallVec<_>, _>>()?;
                state_outcomes.push(action_outcomes);
            }
            terminal.push(state_actions.is_empty());
            actions.push(state_actions);
            outcomes.push(state_outcomes);
        }

        Ok(Self {
            index: Rc::new(index),
            terminal,
            actions,
            outcomes,
        })
    }

    pub fn num_states(&self) -> usize {
        self.index.len()
    }

    pub const fn index(&self) -> &Rc<StateIndex<S>> {
        &self.index
    }

    pub fn state(&self, s: usize) -> &S {
        &self.index.states()[s]
    }

    pub fn is_terminal(&self, s: usize) -> bool {
        self.terminal[s]
    }

    pub fn actions(&self, s: usize) -> &[A] {
        &self.actions[s]
    }

    pub fn outcomes(&self, s: usize, a: usize) -> &[Outcome] {
        &self.outcomes[s][a]
    }

    /// Expected `reward + discount_factor * value(next)` of action `a` in state `s`.
    pub fn q_value(&self, s: usize, a: usize, values: &Array1<f64>, discount_factor: f64) -> f64 {
        self.outcomes[s][a]
            .iter()
            .map(|o| o.probability * (o.reward + discount_factor * values[o.next]))
            .sum()
    }

    /// Largest action value of state `s`; zero for terminal states.
    pub fn max_q_value(&self, s: usize, values: &Array1<f64>, discount_factor: f64) -> f64 {
        if self.terminal[s] {
            return 0.0;
        }
        (0..self.actions[s].len())
            .map(|a| self.q_value(s, a, values, discount_factor))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// The greedy action of state `s` and its value.
    ///
    /// Among actions within [`TIE_TOLERANCE`] of the best value, the lowest index wins.
    /// `None` for terminal states.
    pub fn greedy_action(
        &self,
        s: usize,
        values: &Array1<f64>,
        discount_factor: f64,
    ) -> Option<(usize, f64)> {
        if self.terminal[s] {
            return None;
        }
        let q_values: SmallVec<[f64; 16]> = (0..self.actions[s].len())
            .map(|a| self.q_value(s, a, values, discount_factor))
            .collect();
        let best = q_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        q_values
            .iter()
            .position(|&q| q >= best - TIE_TOLERANCE)
            .map(|a| (a, q_values[a]))
    }

    /// Greedy action indices for every state.
    pub fn greedy_actions(&self, values: &Array1<f64>, discount_factor: f64) -> Vec<Option<usize>> {
        (0..self.num_states())
            .map(|s| self.greedy_action(s, values, discount_factor).map(|(a, _)| a))
            .collect()
    }

    /// Convert a policy into per-state action indices.
    ///
    /// # Errors
    /// * [`SolveError::MissingAction`] if a non-terminal state has no action.
    /// * [`ModelError::InvalidAction`] if an action is not admissible in its state.
    pub fn action_indices(&self, policy: &Policy<S, A>) -> Result<Vec<Option<usize>>, SolveError> {
        (0..self.num_states())
            .map(|s| -> Result<Option<usize>, SolveError> {
                if self.terminal[s] {
                    return Ok(None);
                }
                let state = self.state(s);
                let action = policy
                    .get(state)
                    .ok_or_else(|| SolveError::missing_action(state))?;
                let a = self.actions[s]
                    .iter()
                    .position(|x| x == action)
                    .ok_or_else(|| ModelError::invalid_action(state, action))?;
                Ok(Some(a))
            })
            .collect()
    }

    /// Build a policy from per-state action indices.
    pub fn policy(&self, action_indices: &[Option<usize>]) -> Policy<S, A>
    where
        A: Clone,
    {
        action_indices
            .iter()
            .enumerate()
            .filter_map(|(s, a)| a.map(|a| (self.state(s).clone(), self.actions[s][a].clone())))
            .collect()
    }
}
