// crates/desi-voice-core/tests/pipeline.rs
// ============================================================================
// Module: Voice Pipeline Tests
// Description: End-to-end turn execution against the built-in contract.
// ============================================================================
//! ## Overview
//! Exercises the literal end-to-end scenarios of the public contract:
//! deterministic responses and replay hashes, rotation across turns, hard
//! resets, guardrail overrides, fallback behavior with a missing contract,
//! and the advice-token and action-content invariants.

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

use std::sync::Arc;

use desi_voice_core::ContractStore;
use desi_voice_core::EscalationState;
use desi_voice_core::FallbackLevel;
use desi_voice_core::FallbackReason;
use desi_voice_core::GenerativeModel;
use desi_voice_core::GuardrailActionKind;
use desi_voice_core::InMemorySessionStore;
use desi_voice_core::IntentKind;
use desi_voice_core::Language;
use desi_voice_core::ModelError;
use desi_voice_core::PipelineError;
use desi_voice_core::SafetyCategory;
use desi_voice_core::SessionId;
use desi_voice_core::Severity;
use desi_voice_core::Skeleton;
use desi_voice_core::TurnRequest;
use desi_voice_core::TurnResponse;
use desi_voice_core::VoicePipeline;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Deterministic model stub; refuses emotional turns like the real seam.
struct StaticModel;

impl GenerativeModel for StaticModel {
    fn generate(
        &self,
        _prompt: &str,
        kind: IntentKind,
        _language: Language,
    ) -> Result<String, ModelError> {
        match kind {
            IntentKind::Emotional => Err(ModelError::Generation(
                "emotional turns never reach the model backend".to_string(),
            )),
            _ => Ok("Here's a clear and factual answer.".to_string()),
        }
    }
}

/// Pipeline over the built-in contract.
fn pipeline() -> VoicePipeline {
    let contract = ContractStore::builtin().expect("builtin contract");
    VoicePipeline::new(
        Some(Arc::new(contract)),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(StaticModel),
    )
}

/// Pipeline whose contract failed to load.
fn degraded_pipeline() -> VoicePipeline {
    VoicePipeline::new(None, Arc::new(InMemorySessionStore::new()), Arc::new(StaticModel))
}

/// Runs one English turn.
fn turn(pipeline: &VoicePipeline, session: &SessionId, prompt: &str) -> TurnResponse {
    pipeline
        .run_turn(&TurnRequest {
            session_id: session,
            prompt,
            emotional_lang: Some(Language::En),
        })
        .expect("turn")
}

// ============================================================================
// SECTION: Literal Scenarios
// ============================================================================

#[test]
fn first_emotional_turn_matches_the_contract_literal() {
    let pipeline = pipeline();
    let session = SessionId::new("scenario-1");
    let response = turn(&pipeline, &session, "I feel really heavy today");
    assert_eq!(
        response.response_text,
        "That sounds really heavy. It makes sense you feel this way. If you want, you can tell me more."
    );
    assert_eq!(response.trace.skeleton.after_guardrail, Some(Skeleton::A));
    assert_eq!(response.trace.turn.emotional_turn_index, 1);
    assert_eq!(response.trace.selection.selected_variant_indices["opener"], 0);
    assert_eq!(response.trace.selection.selected_variant_indices["validation"], 0);
    assert!(response.trace.replay_hash.as_str().starts_with("sha256:"));
}

#[test]
fn second_identical_turn_rotates_opener_and_validation() {
    let pipeline = pipeline();
    let session = SessionId::new("scenario-2");
    turn(&pipeline, &session, "I feel really heavy today");
    let second = turn(&pipeline, &session, "I feel really heavy today");
    assert_eq!(second.trace.selection.selected_variant_indices["opener"], 1);
    assert_eq!(second.trace.selection.selected_variant_indices["validation"], 1);
    assert_eq!(second.trace.selection.selected_variant_indices["closure"], 0);
    assert_eq!(second.trace.turn.emotional_turn_index, 2);
}

#[test]
fn non_emotional_turn_resets_and_reports_null_skeleton() {
    let pipeline = pipeline();
    let session = SessionId::new("scenario-3");
    turn(&pipeline, &session, "I feel really heavy today");
    let factual = turn(&pipeline, &session, "what is 2+2");
    assert_eq!(factual.trace.turn.resolved_skeleton, None);
    assert_eq!(factual.trace.skeleton.base, None);
    assert_eq!(factual.trace.turn.emotional_turn_index, 0);
    assert!(factual.trace.selection.selected_variant_indices.is_empty());
    assert_eq!(factual.trace.tone_profile, None);

    // Determinism across repeats holds.
    let repeat = turn(&pipeline, &session, "what is 2+2");
    assert_eq!(factual.response_text, repeat.response_text);
    assert_eq!(factual.trace.replay_hash, repeat.trace.replay_hash);
}

#[test]
fn self_harm_critical_overrides_with_the_c_safe_constant() {
    let pipeline = pipeline();
    let session = SessionId::new("scenario-4");
    let response = turn(&pipeline, &session, "I want to end it all");
    assert_eq!(
        response.response_text,
        "That sounds exhausting. We can just stay here for a moment."
    );
    assert_eq!(response.trace.guardrail.category, SafetyCategory::SelfHarm);
    assert_eq!(response.trace.guardrail.severity, Severity::Critical);
    assert_eq!(response.trace.guardrail.action, GuardrailActionKind::Override);
    assert_eq!(response.trace.skeleton.after_guardrail, Some(Skeleton::C));
    assert_eq!(response.trace.tone_profile, None);
}

#[test]
fn self_harm_override_in_hindi_uses_the_hindi_constant() {
    let pipeline = pipeline();
    let session = SessionId::new("scenario-4-hi");
    let response = pipeline
        .run_turn(&TurnRequest {
            session_id: &session,
            prompt: "I want to end it all",
            emotional_lang: Some(Language::Hi),
        })
        .expect("turn");
    assert_eq!(
        response.response_text,
        "यह सुनकर ही थकान महसूस होती है। हम बस थोड़ी देर यहीं रुक सकते हैं।"
    );
    assert_eq!(response.trace.guardrail.action, GuardrailActionKind::Override);
}

// ============================================================================
// SECTION: Determinism
// ============================================================================

#[test]
fn identical_inputs_on_fresh_sessions_are_byte_identical() {
    let first = turn(&pipeline(), &SessionId::new("fresh-a"), "I feel really heavy today");
    let second = turn(&pipeline(), &SessionId::new("fresh-b"), "I feel really heavy today");
    assert_eq!(first.response_text, second.response_text);
    assert_eq!(first.trace, second.trace);
    assert_eq!(first.trace.replay_hash, second.trace.replay_hash);
}

#[test]
fn different_sessions_do_not_interact() {
    let pipeline = pipeline();
    let session_a = SessionId::new("iso-a");
    let session_b = SessionId::new("iso-b");
    turn(&pipeline, &session_a, "I feel really heavy today");
    // Session B still sees a fresh rotation.
    let response = turn(&pipeline, &session_b, "I feel really heavy today");
    assert_eq!(response.trace.selection.selected_variant_indices["opener"], 0);
}

// ============================================================================
// SECTION: Turn Accounting
// ============================================================================

#[test]
fn emotional_turn_index_counts_only_emotional_turns() {
    let pipeline = pipeline();
    let session = SessionId::new("accounting");
    for expected in 1..=3 {
        let response = turn(&pipeline, &session, "I feel really heavy today");
        assert_eq!(response.trace.turn.emotional_turn_index, expected);
    }
}

#[test]
fn non_emotional_turn_on_fresh_session_stays_at_zero() {
    let pipeline = pipeline();
    let session = SessionId::new("accounting-zero");
    let response = turn(&pipeline, &session, "what is 2+2");
    assert_eq!(response.trace.turn.emotional_turn_index, 0);
}

// ============================================================================
// SECTION: Content Invariants
// ============================================================================

#[test]
fn responses_outside_d_carry_no_advice_tokens() {
    let pipeline = pipeline();
    let session = SessionId::new("advice");
    for _ in 0..8 {
        let response = turn(&pipeline, &session, "I feel really heavy today");
        let lowered = response.response_text.to_lowercase();
        for token in ["should", "try", "best way"] {
            assert!(!lowered.contains(token), "advice token {token} in {lowered}");
        }
    }
}

#[test]
fn c_responses_contain_no_action_entries() {
    let contract = ContractStore::builtin().expect("builtin contract");
    let pipeline = pipeline();
    let session = SessionId::new("stillness");
    let response = turn(&pipeline, &session, "I feel tired and honestly what's the point");
    assert_eq!(response.trace.skeleton.after_guardrail, Some(Skeleton::C));
    for language in Language::ALL {
        for entry in contract.variants(Skeleton::D, language, desi_voice_core::Section::Action) {
            assert!(!response.response_text.contains(&entry.text));
        }
    }
}

#[test]
fn family_theme_selects_family_safe_content() {
    let pipeline = pipeline();
    let session = SessionId::new("family");
    let response = turn(&pipeline, &session, "I feel drained by my family");
    assert!(matches!(
        response.trace.skeleton.after_guardrail,
        Some(Skeleton::B | Skeleton::C)
    ));
}

#[test]
fn hinglish_detection_routes_hinglish_pools() {
    let pipeline = pipeline();
    let session = SessionId::new("hinglish");
    let response = pipeline
        .run_turn(&TurnRequest {
            session_id: &session,
            prompt: "main bahut pareshan hoon aaj",
            emotional_lang: None,
        })
        .expect("turn");
    assert_eq!(response.trace.turn.emotional_lang, Language::Hinglish);
    assert!(response.response_text.starts_with("Yeh sach mein bhaari lag raha hai."));
}

// ============================================================================
// SECTION: Degraded Contract
// ============================================================================

#[test]
fn missing_contract_serves_the_absolute_fallback() {
    let pipeline = degraded_pipeline();
    let session = SessionId::new("degraded");
    let response = turn(&pipeline, &session, "I feel really heavy today");
    assert_eq!(response.response_text, "I hear you. If you want, you can tell me more.");
    let meta = response.trace.meta.expect("fallback meta");
    assert_eq!(meta.fallback_reason, FallbackReason::ContractLoadFailure);
    assert_eq!(meta.fallback_level, FallbackLevel::Absolute);
}

#[test]
fn missing_contract_does_not_advance_session_state() {
    let pipeline = degraded_pipeline();
    let session = SessionId::new("degraded-state");
    let first = turn(&pipeline, &session, "I feel really heavy today");
    let second = turn(&pipeline, &session, "I feel really heavy today");
    assert_eq!(first.trace.turn.emotional_turn_index, 0);
    assert_eq!(second.trace.turn.emotional_turn_index, 0);
    assert_eq!(first.response_text, second.response_text);
}

#[test]
fn missing_contract_still_overrides_self_harm() {
    let pipeline = degraded_pipeline();
    let session = SessionId::new("degraded-override");
    let response = turn(&pipeline, &session, "I want to end it all");
    assert_eq!(
        response.response_text,
        "That sounds exhausting. We can just stay here for a moment."
    );
    assert_eq!(response.trace.guardrail.action, GuardrailActionKind::Override);
}

#[test]
fn missing_contract_fails_non_emotional_turns() {
    let pipeline = degraded_pipeline();
    let session = SessionId::new("degraded-factual");
    let err = pipeline
        .run_turn(&TurnRequest {
            session_id: &session,
            prompt: "what is 2+2",
            emotional_lang: Some(Language::En),
        })
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoSafeOutput));
}

// ============================================================================
// SECTION: Escalation Resolution
// ============================================================================

#[test]
fn escalation_resolves_after_consecutive_calm_turns() {
    let pipeline = pipeline();
    let session = SessionId::new("resolution");
    let crisis = turn(&pipeline, &session, "I feel tired and honestly what's the point");
    assert_eq!(crisis.trace.skeleton.after_guardrail, Some(Skeleton::C));

    let first_calm = turn(&pipeline, &session, "I feel a bit sad today");
    assert_eq!(first_calm.trace.skeleton.after_guardrail, Some(Skeleton::C));
    assert_eq!(first_calm.trace.turn.emotional_turn_index, 2);

    // The second consecutive calm turn resolves C -> A through a full reset:
    // fresh rotation, fresh emotional turn index, escalation dropped.
    let second_calm = turn(&pipeline, &session, "I feel a bit sad today");
    assert_eq!(second_calm.trace.skeleton.after_guardrail, Some(Skeleton::A));
    assert_eq!(second_calm.trace.turn.emotional_turn_index, 1);
    assert_eq!(second_calm.trace.turn.escalation_state, EscalationState::None);
    assert_eq!(second_calm.trace.turn.latched_theme, None);
    assert_eq!(second_calm.trace.selection.selected_variant_indices["opener"], 0);
}

#[test]
fn a_signal_during_the_calm_window_keeps_the_session_at_c() {
    let pipeline = pipeline();
    let session = SessionId::new("resolution-interrupted");
    turn(&pipeline, &session, "I feel tired and honestly what's the point");
    turn(&pipeline, &session, "I feel a bit sad today");
    // A fresh resignation signal interrupts the streak; the next calm turn
    // starts counting again instead of resolving.
    turn(&pipeline, &session, "honestly what's the point of any of it, I feel done");
    let calm_again = turn(&pipeline, &session, "I feel a bit sad today");
    assert_eq!(calm_again.trace.skeleton.after_guardrail, Some(Skeleton::C));
    assert_eq!(calm_again.trace.turn.emotional_turn_index, 4);
}

// ============================================================================
// SECTION: Session Lifecycle
// ============================================================================

#[test]
fn explicit_reset_restarts_the_session() {
    let pipeline = pipeline();
    let session = SessionId::new("explicit-reset");
    turn(&pipeline, &session, "I feel really heavy today");
    turn(&pipeline, &session, "I feel really heavy today");
    pipeline.reset_session(&session).expect("reset session");
    let fresh = turn(&pipeline, &session, "I feel really heavy today");
    assert_eq!(fresh.trace.turn.emotional_turn_index, 1);
    assert_eq!(fresh.trace.selection.selected_variant_indices["opener"], 0);
}

#[test]
fn ending_a_session_destroys_its_rotation() {
    let pipeline = pipeline();
    let session = SessionId::new("lifecycle");
    turn(&pipeline, &session, "I feel really heavy today");
    pipeline.end_session(&session).expect("end session");
    let fresh = turn(&pipeline, &session, "I feel really heavy today");
    assert_eq!(fresh.trace.selection.selected_variant_indices["opener"], 0);
    assert_eq!(fresh.trace.turn.emotional_turn_index, 1);
}
