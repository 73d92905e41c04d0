//! Finite Markov decision process environments
mod builder;
mod inventory;
mod knapsack;
mod plan;
#[cfg(test)]
pub mod testing;

pub use builder::{check_discount_factor, BuildEnvError, EnvBuilder};
pub(crate) use builder::check_range;
pub use inventory::{Inventory, InventoryConfig};
pub use knapsack::{Item, Knapsack, KnapsackConfig, KnapsackState, Pick, Selection};
pub use plan::{PeriodReport, PlanConfig, PlanReport, PlanState, ProductionPlan};

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::Debug;
use std::hash::Hash;
use std::slice;
use thiserror::Error;

/// Tolerance on the total probability of a successor distribution.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A finite Markov decision process.
///
/// Describes the state space, the state-dependent action sets and the transition and reward
/// models. Implementations are immutable once constructed.
pub trait FiniteMdp {
    type State: Clone + Eq + Hash + Debug;
    type Action: Clone + PartialEq + Debug;

    /// All states of the environment, in a fixed order.
    ///
    /// Every call produces the full sequence again.
    fn states(&self) -> Vec<Self::State>;

    /// Whether `state` belongs to the state space.
    fn contains(&self, state: &Self::State) -> bool;

    /// The actions admissible in `state`, in a fixed order.
    ///
    /// Terminal states have no admissible actions.
    ///
    /// # Errors
    /// [`ModelError::InvalidState`] if `state` is not in the state space.
    fn actions(&self, state: &Self::State) -> Result<Vec<Self::Action>, ModelError>;

    /// Distribution of the successor state after taking `action` in `state`.
    ///
    /// # Errors
    /// [`ModelError::InvalidState`] or [`ModelError::InvalidAction`].
    fn transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Successors<Self::State>, ModelError>;

    /// Immediate reward of the transition `state -> next_state` under `action`.
    ///
    /// # Errors
    /// [`ModelError::InvalidState`] or [`ModelError::InvalidAction`].
    fn reward(
        &self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<f64, ModelError>;

    /// Whether `state` is terminal.
    ///
    /// Terminal states contribute zero future value.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// A discount factor applied to future rewards.
    ///
    /// A value between `0` and `1`, inclusive.
    fn discount_factor(&self) -> f64;
}

impl<E: FiniteMdp + ?Sized> FiniteMdp for &E {
    type State = E::State;
    type Action = E::Action;

    fn states(&self) -> Vec<Self::State> {
        E::states(self)
    }
    fn contains(&self, state: &Self::State) -> bool {
        E::contains(self, state)
    }
    fn actions(&self, state: &Self::State) -> Result<Vec<Self::Action>, ModelError> {
        E::actions(self, state)
    }
    fn transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Successors<Self::State>, ModelError> {
        E::transition(self, state, action)
    }
    fn reward(
        &self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<f64, ModelError> {
        E::reward(self, state, action, next_state)
    }
    fn is_terminal(&self, state: &Self::State) -> bool {
        E::is_terminal(self, state)
    }
    fn discount_factor(&self) -> f64 {
        E::discount_factor(self)
    }
}

impl<E: FiniteMdp + ?Sized> FiniteMdp for Box<E> {
    type State = E::State;
    type Action = E::Action;

    fn states(&self) -> Vec<Self::State> {
        E::states(self)
    }
    fn contains(&self, state: &Self::State) -> bool {
        E::contains(self, state)
    }
    fn actions(&self, state: &Self::State) -> Result<Vec<Self::Action>, ModelError> {
        E::actions(self, state)
    }
    fn transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Successors<Self::State>, ModelError> {
        E::transition(self, state, action)
    }
    fn reward(
        &self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<f64, ModelError> {
        E::reward(self, state, action, next_state)
    }
    fn is_terminal(&self, state: &Self::State) -> bool {
        E::is_terminal(self, state)
    }
    fn discount_factor(&self) -> f64 {
        E::discount_factor(self)
    }
}

/// An environment with a designated starting state.
pub trait Episodic: FiniteMdp {
    fn initial_state(&self) -> Self::State;
}

/// Error querying an environment model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("state {state} is not in the state space")]
    InvalidState { state: String },
    #[error("action {action} is not admissible in state {state}")]
    InvalidAction { state: String, action: String },
    #[error("successor probabilities of state {state} under action {action} sum to {total}")]
    MalformedTransition {
        state: String,
        action: String,
        total: f64,
    },
    #[error("invalid successor probability {probability} of state {state} under action {action}")]
    InvalidProbability {
        state: String,
        action: String,
        probability: f64,
    },
}

impl ModelError {
    pub fn invalid_state<S: Debug>(state: &S) -> Self {
        Self::InvalidState {
            state: format!("{:?}", state),
        }
    }

    pub fn invalid_action<S: Debug, A: Debug>(state: &S, action: &A) -> Self {
        Self::InvalidAction {
            state: format!("{:?}", state),
            action: format!("{:?}", action),
        }
    }
}

/// Distribution over successor states.
///
/// Each successor state appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Successors<S> {
    outcomes: SmallVec<[(S, f64); 4]>,
}

impl<S> Successors<S> {
    /// A distribution that always yields `state`.
    pub fn deterministic(state: S) -> Self {
        let mut outcomes = SmallVec::new();
        outcomes.push((state, 1.0));
        Self { outcomes }
    }

    /// Build from `(state, probability)` pairs, summing the probabilities of repeated states.
    ///
    /// Zero-probability outcomes are dropped. The result is not normalized.
    pub fn from_weighted<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: PartialEq,
    {
        let mut merged: SmallVec<[(S, f64); 4]> = SmallVec::new();
        for (state, probability) in outcomes {
            if probability == 0.0 {
                continue;
            }
            match merged.iter_mut().find(|(s, _)| *s == state) {
                Some((_, p)) => *p += probability,
                None => merged.push((state, probability)),
            }
        }
        Self { outcomes: merged }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Iterate over `(state, probability)` pairs.
    pub fn iter(&self) -> slice::Iter<(S, f64)> {
        self.outcomes.iter()
    }

    /// Sum of all outcome probabilities.
    pub fn total_probability(&self) -> f64 {
        self.outcomes.iter().map(|(_, p)| p).sum()
    }

    /// Whether the probabilities sum to 1 within [`PROBABILITY_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.total_probability() - 1.0).abs() <= PROBABILITY_TOLERANCE
    }

    /// Probability of transitioning to `state`.
    pub fn probability(&self, state: &S) -> f64
    where
        S: PartialEq,
    {
        self.outcomes
            .iter()
            .find(|(s, _)| s == state)
            .map_or(0.0, |(_, p)| *p)
    }

    /// Check that every probability is non-negative and that they sum to 1.
    ///
    /// # Errors
    /// [`ModelError::InvalidProbability`] or [`ModelError::MalformedTransition`],
    /// naming `state` and `action` as the origin of the distribution.
    pub fn validate<A: Debug>(&self, state: &S, action: &A) -> Result<(), ModelError>
    where
        S: Debug,
    {
        if let Some(&(_, probability)) = self.outcomes.iter().find(|(_, p)| !(*p >= 0.0)) {
            return Err(ModelError::InvalidProbability {
                state: format!("{:?}", state),
                action: format!("{:?}", action),
                probability,
            });
        }
        if !self.is_normalized() {
            return Err(ModelError::MalformedTransition {
                state: format!("{:?}", state),
                action: format!("{:?}", action),
                total: self.total_probability(),
            });
        }
        Ok(())
    }

    /// Sample a successor state.
    ///
    /// The probabilities are used as relative weights; see [`Successors::validate`].
    /// `None` if the distribution is empty or its weights are invalid.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&S> {
        let dist = WeightedIndex::new(self.outcomes.iter().map(|(_, p)| *p)).ok()?;
        Some(&self.outcomes[dist.sample(rng)].0)
    }
}

impl<S> IntoIterator for Successors<S> {
    type Item = (S, f64);
    type IntoIter = smallvec::IntoIter<[(S, f64); 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a, S> IntoIterator for &'a Successors<S> {
    type Item = &'a (S, f64);
    type IntoIter = slice::Iter<'a, (S, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
