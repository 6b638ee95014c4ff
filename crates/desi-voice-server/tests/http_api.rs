// crates/desi-voice-server/tests/http_api.rs
// ============================================================================
// Module: HTTP API Tests
// Description: Verifies the /generate and /version contract surface.
// ============================================================================
//! ## Overview
//! Exercises strict request validation, the sealed response shapes, the
//! version identity, determinism across repeated calls, and degraded-contract
//! behavior, all through the same processing path the handlers use.

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

use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use desi_voice_core::ContractStore;
use desi_voice_core::InMemorySessionStore;
use desi_voice_core::SessionId;
use desi_voice_core::VoicePipeline;
use desi_voice_server::NoopAuditSink;
use desi_voice_server::NoopMetrics;
use desi_voice_server::ScaffoldModel;
use desi_voice_server::ServerState;
use desi_voice_server::process_generate;
use desi_voice_server::session_from_headers;
use desi_voice_server::validate_generate_request;
use desi_voice_server::version_payload;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Handler state over the built-in contract.
fn state() -> ServerState {
    let contract = ContractStore::builtin().expect("builtin contract");
    let pipeline = Arc::new(VoicePipeline::new(
        Some(Arc::new(contract)),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(ScaffoldModel::new()),
    ));
    ServerState::new(pipeline, 64 * 1024, Arc::new(NoopMetrics), Arc::new(NoopAuditSink))
}

/// Handler state whose contract failed to load.
fn degraded_state() -> ServerState {
    let pipeline = Arc::new(VoicePipeline::new(
        None,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(ScaffoldModel::new()),
    ));
    ServerState::new(pipeline, 64 * 1024, Arc::new(NoopMetrics), Arc::new(NoopAuditSink))
}

/// Runs one request body against a state and session.
fn post(state: &ServerState, session: &str, body: &Value) -> (StatusCode, Value) {
    process_generate(state, &SessionId::new(session), body.to_string().as_bytes())
}

// ============================================================================
// SECTION: Version Surface
// ============================================================================

#[test]
fn version_payload_has_exactly_the_identity_fields() {
    let payload = version_payload();
    let object = payload.as_object().expect("object");
    assert_eq!(object.len(), 3);
    assert_eq!(object["engine_name"], "indian-desi-llm-inference-core");
    assert_eq!(object["engine_version"], "1.0.0");
    assert_eq!(object["release_stage"], "B20");
}

#[test]
fn version_payload_is_deterministic_across_calls() {
    let payloads: Vec<String> = (0..20).map(|_| version_payload().to_string()).collect();
    assert!(payloads.windows(2).all(|pair| pair[0] == pair[1]));
}

// ============================================================================
// SECTION: Request Validation
// ============================================================================

#[test]
fn empty_prompt_is_rejected() {
    let state = state();
    let (status, payload) = post(&state, "validation", &json!({ "prompt": "" }));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INVALID_INPUT");
    assert_eq!(payload["error"], "Prompt cannot be empty.");
}

#[test]
fn whitespace_prompt_is_rejected() {
    let err = validate_generate_request(json!({ "prompt": "   \n\t " }).to_string().as_bytes())
        .unwrap_err();
    assert_eq!(err, "Prompt cannot be empty.");
}

#[test]
fn missing_prompt_is_rejected() {
    let err = validate_generate_request(json!({}).to_string().as_bytes()).unwrap_err();
    assert_eq!(err, "Prompt must be a string.");
}

#[test]
fn oversized_prompt_is_rejected() {
    let prompt = "x".repeat(10_001);
    let err = validate_generate_request(json!({ "prompt": prompt }).to_string().as_bytes())
        .unwrap_err();
    assert_eq!(err, "Prompt exceeds maximum length.");
}

#[test]
fn prompt_at_the_limit_is_accepted() {
    let prompt = "x".repeat(10_000);
    let request = validate_generate_request(json!({ "prompt": prompt }).to_string().as_bytes())
        .expect("request");
    assert_eq!(request.prompt.chars().count(), 10_000);
}

#[test]
fn unexpected_fields_are_rejected() {
    let err = validate_generate_request(
        json!({ "prompt": "hello", "extra": true }).to_string().as_bytes(),
    )
    .unwrap_err();
    assert_eq!(err, "Unexpected fields in request.");
}

#[test]
fn unsupported_language_is_rejected() {
    let err = validate_generate_request(
        json!({ "prompt": "hello", "emotional_lang": "fr" }).to_string().as_bytes(),
    )
    .unwrap_err();
    assert_eq!(err, "Unsupported emotional_lang.");
}

#[test]
fn hinglish_is_not_a_public_language() {
    let err = validate_generate_request(
        json!({ "prompt": "hello", "emotional_lang": "hinglish" }).to_string().as_bytes(),
    )
    .unwrap_err();
    assert_eq!(err, "Unsupported emotional_lang.");
}

#[test]
fn non_string_language_is_rejected() {
    let err = validate_generate_request(
        json!({ "prompt": "hello", "emotional_lang": 42 }).to_string().as_bytes(),
    )
    .unwrap_err();
    assert_eq!(err, "Invalid emotional_lang.");
}

#[test]
fn malformed_body_is_rejected() {
    let state = state();
    let (status, payload) =
        process_generate(&state, &SessionId::new("validation"), b"not json at all");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INVALID_INPUT");
}

#[test]
fn oversized_body_is_rejected() {
    let contract = ContractStore::builtin().expect("builtin contract");
    let pipeline = Arc::new(VoicePipeline::new(
        Some(Arc::new(contract)),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(ScaffoldModel::new()),
    ));
    let state =
        ServerState::new(pipeline, 64, Arc::new(NoopMetrics), Arc::new(NoopAuditSink));
    let body = json!({ "prompt": "x".repeat(256) });
    let (status, payload) = post(&state, "validation", &body);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INVALID_INPUT");
}

// ============================================================================
// SECTION: Success Shape
// ============================================================================

#[test]
fn success_response_is_sealed_to_the_contract_fields() {
    let state = state();
    let (status, payload) =
        post(&state, "shape", &json!({ "prompt": "I feel really heavy today" }));
    assert_eq!(status, StatusCode::OK);
    let object = payload.as_object().expect("object");
    assert_eq!(object.len(), 2);
    assert!(object.contains_key("response_text"));
    assert!(object.contains_key("trace"));
    let replay = payload["trace"]["replay_hash"].as_str().expect("hash");
    assert!(replay.starts_with("sha256:"));
    assert_eq!(replay.len(), "sha256:".len() + 64);
}

#[test]
fn first_turn_matches_the_contract_literal() {
    let state = state();
    let (status, payload) =
        post(&state, "literal", &json!({ "prompt": "I feel really heavy today", "emotional_lang": "en" }));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload["response_text"],
        "That sounds really heavy. It makes sense you feel this way. If you want, you can tell me more."
    );
}

#[test]
fn identical_requests_on_fresh_states_are_byte_identical() {
    let body = json!({ "prompt": "I feel really heavy today", "emotional_lang": "en" });
    let (_, first) = post(&state(), "determinism", &body);
    let (_, second) = post(&state(), "determinism", &body);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn sessions_are_isolated_by_header_identity() {
    let state = state();
    let body = json!({ "prompt": "I feel really heavy today" });
    let (_, first) = post(&state, "header-a", &body);
    let (_, second) = post(&state, "header-b", &body);
    assert_eq!(first["trace"]["selection"]["selected_variant_indices"]["opener"], 0);
    assert_eq!(second["trace"]["selection"]["selected_variant_indices"]["opener"], 0);
}

#[test]
fn session_header_extraction_defaults_to_the_shared_session() {
    let empty = HeaderMap::new();
    assert_eq!(session_from_headers(&empty).as_str(), "default");

    let mut headers = HeaderMap::new();
    headers.insert("x-session-id", HeaderValue::from_static("caller-7"));
    assert_eq!(session_from_headers(&headers).as_str(), "caller-7");
}

// ============================================================================
// SECTION: Guardrail Surface
// ============================================================================

#[test]
fn self_harm_prompt_returns_the_override_constant() {
    let state = state();
    let (status, payload) =
        post(&state, "guardrail", &json!({ "prompt": "I want to end it all" }));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload["response_text"],
        "That sounds exhausting. We can just stay here for a moment."
    );
    assert_eq!(payload["trace"]["guardrail"]["action"], "override");
    assert_eq!(payload["trace"]["guardrail"]["category"], "self_harm");
    assert_eq!(payload["trace"]["guardrail"]["severity"], "critical");
}

// ============================================================================
// SECTION: Degraded Contract
// ============================================================================

#[test]
fn degraded_contract_serves_absolute_fallbacks() {
    let state = degraded_state();
    let (status, payload) =
        post(&state, "degraded", &json!({ "prompt": "I feel really heavy today" }));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["response_text"], "I hear you. If you want, you can tell me more.");
    assert_eq!(payload["trace"]["meta"]["fallback_level"], "absolute");
    assert_eq!(payload["trace"]["meta"]["fallback_reason"], "contract_load_failure");
}

#[test]
fn degraded_contract_fails_factual_turns_with_500() {
    let state = degraded_state();
    let (status, payload) = post(&state, "degraded", &json!({ "prompt": "what is 2+2" }));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload["error"], "Inference failed.");
    assert_eq!(payload["code"], "INFERENCE_FAILED");
}
