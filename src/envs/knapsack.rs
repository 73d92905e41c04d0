//! Sequential 0/1 knapsack
use super::builder::check_finite;
use super::{
    check_discount_factor, BuildEnvError, EnvBuilder, Episodic, FiniteMdp, ModelError,
    Successors,
};
use crate::solvers::{Policy, SolveError};
use serde::{Deserialize, Serialize};

/// An item that can be put in the knapsack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub weight: u32,
    pub value: f64,
}

impl Item {
    pub const fn new(weight: u32, value: f64) -> Self {
        Self { weight, value }
    }
}

/// Configuration of a [`Knapsack`] environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnapsackConfig {
    pub items: Vec<Item>,
    pub capacity: u32,
    pub discount_factor: f64,
}

impl Default for KnapsackConfig {
    fn default() -> Self {
        Self {
            items: vec![Item::new(2, 3.0), Item::new(3, 4.0), Item::new(4, 5.0)],
            capacity: 5,
            discount_factor: 1.0,
        }
    }
}

impl EnvBuilder<Knapsack> for KnapsackConfig {
    fn build_env(&self, _seed: u64) -> Result<Knapsack, BuildEnvError> {
        for item in &self.items {
            check_finite("item value", item.value)?;
        }
        check_discount_factor(self.discount_factor)?;
        Ok(Knapsack {
            items: self.items.clone(),
            capacity: self.capacity,
            discount_factor: self.discount_factor,
        })
    }
}

/// Knapsack state: the next item to decide on and the remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KnapsackState {
    pub item: usize,
    pub remaining: u32,
}

/// Decision for the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pick {
    Skip,
    Take,
}

/// Items chosen by following a policy from the initial state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Indices of the chosen items in increasing order.
    pub items: Vec<usize>,
    pub weight: u32,
    pub value: f64,
}

/// The 0/1 knapsack problem as a sequence of decisions.
///
/// Items are considered in order. In each step the current item is either skipped or,
/// if it fits in the remaining capacity, taken for a reward equal to its value.
/// The episode ends after the last item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knapsack {
    items: Vec<Item>,
    capacity: u32,
    discount_factor: f64,
}

impl Knapsack {
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    fn check_action(&self, state: &KnapsackState, action: Pick) -> Result<&Item, ModelError> {
        if !self.contains(state) {
            return Err(ModelError::invalid_state(state));
        }
        // Terminal states have no admissible actions.
        match self.items.get(state.item) {
            Some(item) if action == Pick::Skip || item.weight <= state.remaining => Ok(item),
            _ => Err(ModelError::invalid_action(state, &action)),
        }
    }

    const fn next_state(state: &KnapsackState, item: &Item, action: Pick) -> KnapsackState {
        KnapsackState {
            item: state.item + 1,
            remaining: match action {
                Pick::Skip => state.remaining,
                Pick::Take => state.remaining - item.weight,
            },
        }
    }

    /// Follow a policy from the initial state and collect the chosen items.
    ///
    /// # Errors
    /// * [`SolveError::MissingAction`] if the policy does not cover a visited state.
    /// * [`SolveError::Model`] if the policy takes an item that does not fit.
    pub fn selection(&self, policy: &Policy<KnapsackState, Pick>) -> Result<Selection, SolveError> {
        let mut state = self.initial_state();
        let mut selection = Selection {
            items: Vec::new(),
            weight: 0,
            value: 0.0,
        };
        while !self.is_terminal(&state) {
            let action = *policy
                .get(&state)
                .ok_or_else(|| SolveError::missing_action(&state))?;
            let item = self.check_action(&state, action)?;
            if action == Pick::Take {
                selection.items.push(state.item);
                selection.weight += item.weight;
                selection.value += item.value;
            }
            state = Self::next_state(&state, item, action);
        }
        Ok(selection)
    }
}

impl FiniteMdp for Knapsack {
    type State = KnapsackState;
    type Action = Pick;

    fn states(&self) -> Vec<Self::State> {
        (0..=self.items.len())
            .flat_map(|item| {
                (0..=self.capacity).map(move |remaining| KnapsackState { item, remaining })
            })
            .collect()
    }

    fn contains(&self, state: &Self::State) -> bool {
        state.item <= self.items.len() && state.remaining <= self.capacity
    }

    fn actions(&self, state: &Self::State) -> Result<Vec<Self::Action>, ModelError> {
        if !self.contains(state) {
            return Err(ModelError::invalid_state(state));
        }
        Ok(match self.items.get(state.item) {
            None => Vec::new(),
            Some(item) if item.weight <= state.remaining => vec![Pick::Skip, Pick::Take],
            Some(_) => vec![Pick::Skip],
        })
    }

    fn transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Successors<Self::State>, ModelError> {
        let item = self.check_action(state, *action)?;
        Ok(Successors::deterministic(Self::next_state(state, item, *action)))
    }

    fn reward(
        &self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<f64, ModelError> {
        let item = self.check_action(state, *action)?;
        if !self.contains(next_state) {
            return Err(ModelError::invalid_state(next_state));
        }
        Ok(match action {
            Pick::Skip => 0.0,
            Pick::Take => item.value,
        })
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.item >= self.items.len()
    }

    fn discount_factor(&self) -> f64 {
        self.discount_factor
    }
}

impl Episodic for Knapsack {
    fn initial_state(&self) -> Self::State {
        KnapsackState {
            item: 0,
            remaining: self.capacity,
        }
    }
}
