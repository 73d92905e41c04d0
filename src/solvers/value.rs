//! Value functions and deterministic policies
use crate::envs::{FiniteMdp, ModelError};
use ndarray::Array1;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::hash::Hash;
use std::iter::FromIterator;
use std::rc::Rc;
use std::slice;

/// An ordered set of states with constant-time position lookup.
#[derive(Debug, Clone)]
pub struct StateIndex<S> {
    states: Vec<S>,
    positions: HashMap<S, usize>,
}

impl<S: Clone + Eq + Hash> StateIndex<S> {
    /// Index a sequence of states. Repeated states keep their first position.
    pub fn new(states: Vec<S>) -> Self {
        let mut positions = HashMap::with_capacity(states.len());
        for (i, state) in states.iter().enumerate() {
            positions.entry(state.clone()).or_insert(i);
        }
        Self { states, positions }
    }
}

impl<S: Eq + Hash> StateIndex<S> {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn position(&self, state: &S) -> Option<usize> {
        self.positions.get(state).copied()
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }
}

/// A state value function.
///
/// Cloning copies the values; the state ordering is shared.
#[derive(Debug, Clone)]
pub struct ValueFunction<S> {
    index: Rc<StateIndex<S>>,
    values: Array1<f64>,
}

impl<S: Eq + Hash> ValueFunction<S> {
    pub(crate) fn new(index: Rc<StateIndex<S>>, values: Array1<f64>) -> Self {
        assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    /// The value of `state`, or `None` if the state is not covered.
    pub fn get(&self, state: &S) -> Option<f64> {
        self.index.position(state).map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// States in the order of [`ValueFunction::values`].
    pub fn states(&self) -> &[S] {
        self.index.states()
    }

    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Iterate over `(state, value)` pairs in state order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> {
        self.index.states().iter().zip(self.values.iter().copied())
    }

    /// Largest absolute difference to another value function over the states of `self`.
    ///
    /// Infinite if `other` is missing any of those states.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.iter()
            .map(|(state, value)| {
                other
                    .get(state)
                    .map_or(f64::INFINITY, |other_value| (value - other_value).abs())
            })
            .fold(0.0, f64::max)
    }
}

/// Serialized as a sequence of `(state, value)` pairs.
impl<S: Serialize + Eq + Hash> Serialize for ValueFunction<S> {
    fn serialize<T: Serializer>(&self, serializer: T) -> Result<T::Ok, T::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// A deterministic policy; a map from states to actions.
///
/// Entries keep their insertion order.
#[derive(Debug, Clone)]
pub struct Policy<S, A> {
    entries: Vec<(S, A)>,
    positions: HashMap<S, usize>,
}

impl<S, A> Default for Policy<S, A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<S: Clone + Eq + Hash, A> Policy<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the action for a state, returning the previous one.
    pub fn insert(&mut self, state: S, action: A) -> Option<A> {
        if let Some(&i) = self.positions.get(&state) {
            Some(std::mem::replace(&mut self.entries[i].1, action))
        } else {
            self.positions.insert(state.clone(), self.entries.len());
            self.entries.push((state, action));
            None
        }
    }

    pub fn get(&self, state: &S) -> Option<&A> {
        self.positions.get(state).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(state, action)` pairs in insertion order.
    pub fn iter(&self) -> slice::Iter<(S, A)> {
        self.entries.iter()
    }

    /// Build a policy choosing among the admissible actions of each non-terminal state.
    ///
    /// `choose` receives the state and its (non-empty) admissible actions and returns the
    /// index of the chosen action. Indices past the end are clamped to the last action,
    /// so `usize::MAX` always picks the last one.
    ///
    /// # Errors
    /// Propagates environment model errors.
    pub fn from_fn<E, F>(env: &E, mut choose: F) -> Result<Self, ModelError>
    where
        E: FiniteMdp<State = S, Action = A> + ?Sized,
        F: FnMut(&S, &[A]) -> usize,
    {
        let mut policy = Self::new();
        for state in env.states() {
            if env.is_terminal(&state) {
                continue;
            }
            let mut actions = env.actions(&state)?;
            if actions.is_empty() {
                continue;
            }
            let i = choose(&state, &actions).min(actions.len() - 1);
            let action = actions.swap_remove(i);
            policy.insert(state, action);
        }
        Ok(policy)
    }

    /// The policy taking the first admissible action in every non-terminal state.
    ///
    /// # Errors
    /// Propagates environment model errors.
    pub fn first_admissible<E>(env: &E) -> Result<Self, ModelError>
    where
        E: FiniteMdp<State = S, Action = A> + ?Sized,
    {
        Self::from_fn(env, |_, _| 0)
    }
}

impl<S: Eq + Hash, A: PartialEq> PartialEq for Policy<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(state, action)| {
                other
                    .positions
                    .get(state)
                    .map_or(false, |&i| other.entries[i].1 == *action)
            })
    }
}

impl<S: Clone + Eq + Hash, A> FromIterator<(S, A)> for Policy<S, A> {
    fn from_iter<I: IntoIterator<Item = (S, A)>>(iter: I) -> Self {
        let mut policy = Self::new();
        for (state, action) in iter {
            policy.insert(state, action);
        }
        policy
    }
}

/// Serialized as a sequence of `(state, action)` pairs.
impl<S: Serialize, A: Serialize> Serialize for Policy<S, A> {
    fn serialize<T: Serializer>(&self, serializer: T) -> Result<T::Ok, T::Error> {
        serializer.collect_seq(&self.entries)
    }
}
