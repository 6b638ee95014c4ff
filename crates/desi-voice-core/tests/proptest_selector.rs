// crates/desi-voice-core/tests/proptest_selector.rs
// ============================================================================
// Module: Selector Property Tests
// Description: Property coverage for selector determinism and rotation laws.
// ============================================================================
//! ## Overview
//! Drives randomized rotation histories through the selector and checks the
//! universal invariants: total determinism, no immediate repetition with two
//! or more candidates, and in-range selections. Canonical JSON idempotence is
//! checked over arbitrary nested values.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use desi_voice_core::ContractStore;
use desi_voice_core::EscalationState;
use desi_voice_core::Language;
use desi_voice_core::PoolKey;
use desi_voice_core::Section;
use desi_voice_core::SessionVoiceState;
use desi_voice_core::Skeleton;
use desi_voice_core::TurnStage;
use desi_voice_core::VariantUsage;
use desi_voice_core::canonical_json_string;
use desi_voice_core::runtime::selector::TurnContext;
use desi_voice_core::runtime::selector::select_variants;
use proptest::prelude::*;

// ============================================================================
// SECTION: Strategies
// ============================================================================

/// A bounded rotation history for the skeleton-A opener pool.
fn history_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0_u32..3, 0..12)
}

/// Seeds a session with an opener history, one usage per turn.
fn seeded_state(history: &[u32]) -> SessionVoiceState {
    let mut state = SessionVoiceState::new();
    let key = PoolKey::new(Skeleton::A, Language::En, Section::Opener);
    for (index, variant_id) in history.iter().enumerate() {
        state.rotation.record(
            key,
            VariantUsage {
                variant_id: *variant_id,
                turn_index: u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1),
            },
        );
    }
    state.emotional_turn_index = u32::try_from(history.len()).unwrap_or(u32::MAX);
    state
}

/// Context for the turn after the seeded history.
fn context_after(history: &[u32]) -> TurnContext {
    TurnContext {
        skeleton: Skeleton::A,
        language: Language::En,
        escalation_state: EscalationState::None,
        latched_theme: None,
        emotional_turn_index: u32::try_from(history.len()).unwrap_or(u32::MAX),
    }
}

// ============================================================================
// SECTION: Selector Properties
// ============================================================================

proptest! {
    #[test]
    fn selection_is_total_and_deterministic(history in history_strategy()) {
        let contract = ContractStore::builtin().expect("builtin contract");
        let state = seeded_state(&history);
        let ctx = context_after(&history);

        let mut stage_a = TurnStage::new();
        let mut stage_b = TurnStage::new();
        let first = select_variants(&contract, &ctx, &state, &mut stage_a).expect("first");
        let second = select_variants(&contract, &ctx, &state, &mut stage_b).expect("second");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn selection_never_repeats_the_previous_variant(history in history_strategy()) {
        let contract = ContractStore::builtin().expect("builtin contract");
        let state = seeded_state(&history);
        let ctx = context_after(&history);

        let mut stage = TurnStage::new();
        let outcome = select_variants(&contract, &ctx, &state, &mut stage).expect("selection");
        let opener = outcome.sections[&Section::Opener].variant_id;
        if let Some(last) = history.last() {
            prop_assert_ne!(opener, *last);
        }
    }

    #[test]
    fn selection_stays_in_pool_range(history in history_strategy()) {
        let contract = ContractStore::builtin().expect("builtin contract");
        let state = seeded_state(&history);
        let ctx = context_after(&history);

        let mut stage = TurnStage::new();
        let outcome = select_variants(&contract, &ctx, &state, &mut stage).expect("selection");
        for (section, selection) in &outcome.sections {
            let pool = contract.variants(Skeleton::A, Language::En, *section);
            prop_assert!((selection.variant_id as usize) < pool.len());
        }
    }
}

// ============================================================================
// SECTION: Canonical JSON Properties
// ============================================================================

/// Strategy over shallow JSON values without floats.
fn json_strategy() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[a-z]{0,8}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|map| {
                serde_json::Value::Object(map.into_iter().collect())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn canonicalization_is_idempotent(value in json_strategy()) {
        let once = canonical_json_string(&value).expect("canonicalize");
        let reparsed: serde_json::Value = serde_json::from_str(&once).expect("reparse");
        let twice = canonical_json_string(&reparsed).expect("canonicalize again");
        prop_assert_eq!(once, twice);
    }
}
