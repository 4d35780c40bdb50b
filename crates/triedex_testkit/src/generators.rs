//! Property-based test generators using proptest.
//!
//! Strategies produce data that maintains the engine's invariants: progress
//! states are canonical (`from <= to`, checkpoint only alongside a range
//! end) and keys are non-empty.

use proptest::prelude::*;
use triedex_core::ProgressState;

/// Strategy for canonical progress states.
pub fn progress_state_strategy() -> impl Strategy<Value = ProgressState> {
    (
        0u64..10_000,
        prop::option::of(1u64..10_000),
        prop::option::of(prop::collection::vec(any::<u8>(), 1..64)),
    )
        .prop_map(|(from, span, checkpoint)| {
            let to = span.map(|s| from + s);
            ProgressState {
                from,
                to,
                // A checkpoint is only meaningful alongside a range end.
                checkpoint: if to.is_some() { checkpoint } else { None },
            }
        })
}

/// Strategy for trie keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9/]{0,15}").expect("invalid regex")
}

/// Strategy for raw value payloads.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

/// Strategy for a write sequence over a small key set: `Some` is a put,
/// `None` is a delete.
pub fn write_sequence_strategy(
    max_writes: usize,
) -> impl Strategy<Value = Vec<(String, Option<Vec<u8>>)>> {
    prop::collection::vec(
        (
            prop::sample::select(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "take/x".to_string(),
                "take/y".to_string(),
            ]),
            prop::option::of(value_strategy()),
        ),
        0..max_writes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_states_are_canonical(state in progress_state_strategy()) {
            if let Some(to) = state.to {
                prop_assert!(state.from <= to);
            } else {
                prop_assert!(state.checkpoint.is_none());
            }
        }
    }
}
