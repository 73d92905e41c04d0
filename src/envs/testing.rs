//! Environment testing utilities
use super::FiniteMdp;
use std::collections::HashSet;

/// Check that a finite environment satisfies its structural invariants.
///
/// * States are unique and contained in the space.
/// * Terminal states have no actions; non-terminal states have at least one.
/// * Every successor distribution is normalized over states in the space.
/// * Every reward is finite.
pub fn check_finite_mdp<E: FiniteMdp>(env: &E) {
    let discount_factor = env.discount_factor();
    assert!(discount_factor >= 0.0);
    assert!(discount_factor <= 1.0);

    let states = env.states();
    assert!(!states.is_empty());
    let unique: HashSet<_> = states.iter().collect();
    assert_eq!(unique.len(), states.len(), "repeated states");

    for state in &states {
        assert!(env.contains(state));
        let actions = env.actions(state).unwrap();
        if env.is_terminal(state) {
            assert!(actions.is_empty(), "terminal state {:?} has actions", state);
            continue;
        }
        assert!(!actions.is_empty(), "state {:?} has no actions", state);

        for action in &actions {
            let successors = env.transition(state, action).unwrap();
            assert!(
                successors.is_normalized(),
                "{:?} under {:?} sums to {}",
                state,
                action,
                successors.total_probability()
            );
            for (next_state, probability) in &successors {
                assert!(*probability > 0.0);
                assert!(env.contains(next_state));
                assert!(env.reward(state, action, next_state).unwrap().is_finite());
            }
        }
    }
}
