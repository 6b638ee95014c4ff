// crates/desi-voice-server/src/server.rs
// ============================================================================
// Module: HTTP Server
// Description: axum surface for the /generate and /version endpoints.
// Purpose: Expose the voice pipeline over HTTP contract v1.0.0.
// Dependencies: desi-voice-core, axum, tokio
// ============================================================================

//! ## Overview
//! The HTTP layer validates request bodies strictly, routes every turn
//! through the single pipeline entry point, and seals responses to exactly
//! the contract fields. Internal errors surface as a bare 500 with no stack
//! traces or internal state. Sessions are addressed by the `x-session-id`
//! header; absent headers share one default session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use desi_voice_core::ContractStore;
use desi_voice_core::ENGINE_NAME;
use desi_voice_core::ENGINE_RELEASE_STAGE;
use desi_voice_core::ENGINE_VERSION;
use desi_voice_core::InMemorySessionStore;
use desi_voice_core::Language;
use desi_voice_core::SessionId;
use desi_voice_core::TurnRequest;
use desi_voice_core::VoicePipeline;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::audit::VoiceAuditEvent;
use crate::audit::VoiceAuditSink;
use crate::config::AuditConfig;
use crate::config::ContractConfig;
use crate::config::VoiceServerConfig;
use crate::model::ScaffoldModel;
use crate::telemetry::NoopMetrics;
use crate::telemetry::RequestOutcome;
use crate::telemetry::VoiceMetrics;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum prompt length in characters.
const MAX_PROMPT_CHARS: usize = 10_000;
/// Request fields accepted by `/generate`.
const GENERATE_REQUEST_KEYS: [&str; 2] = ["prompt", "emotional_lang"];
/// Session header consulted for multi-turn callers.
const SESSION_HEADER: &str = "x-session-id";
/// Session id shared by callers without a session header.
const DEFAULT_SESSION: &str = "default";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration was rejected.
    #[error("server config invalid: {0}")]
    Config(String),
    /// Transport-level failure.
    #[error("server transport failed: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server State
// ============================================================================

/// Shared state for HTTP handlers.
pub struct ServerState {
    /// Voice pipeline shared across requests.
    pipeline: Arc<VoicePipeline>,
    /// Maximum accepted request body size.
    max_body_bytes: usize,
    /// Metrics sink.
    metrics: Arc<dyn VoiceMetrics>,
    /// Audit sink.
    audit: Arc<dyn VoiceAuditSink>,
}

impl ServerState {
    /// Creates handler state from its parts.
    #[must_use]
    pub fn new(
        pipeline: Arc<VoicePipeline>,
        max_body_bytes: usize,
        metrics: Arc<dyn VoiceMetrics>,
        audit: Arc<dyn VoiceAuditSink>,
    ) -> Self {
        Self {
            pipeline,
            max_body_bytes,
            metrics,
            audit,
        }
    }
}

// ============================================================================
// SECTION: Voice Server
// ============================================================================

/// HTTP server instance.
pub struct VoiceServer {
    /// Validated configuration.
    config: VoiceServerConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl VoiceServer {
    /// Builds a server from configuration, wiring the default session store,
    /// scaffold backend, and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or audit wiring fails. A
    /// contract load failure does not fail startup; the pipeline serves
    /// absolute fallbacks instead.
    pub fn from_config(config: VoiceServerConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let contract = load_contract(&config.contract);
        let pipeline = Arc::new(VoicePipeline::new(
            contract,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(ScaffoldModel::new()),
        ));
        let audit = build_audit_sink(&config.audit)?;
        let state = Arc::new(ServerState::new(
            pipeline,
            config.server.max_body_bytes,
            Arc::new(NoopMetrics),
            audit,
        ));
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the shared handler state.
    #[must_use]
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Serves requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr: SocketAddr = self
            .config
            .server
            .bind
            .parse()
            .map_err(|_| ServerError::Config("invalid bind address".to_string()))?;
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the axum router for the public surface.
#[must_use]
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/generate", post(handle_generate))
        .route("/version", get(handle_version))
        .with_state(state)
}

/// Loads the configured contract, downgrading failures to a missing store.
fn load_contract(config: &ContractConfig) -> Option<Arc<ContractStore>> {
    let result = match &config.path {
        Some(path) => ContractStore::from_path(path, &config.expected_version),
        None => ContractStore::builtin(),
    };
    match result {
        Ok(store) => Some(Arc::new(store)),
        Err(err) => {
            eprintln!("{{\"event\":\"contract_load_failed\",\"error\":\"{err}\"}}");
            None
        }
    }
}

/// Builds an audit sink from configuration.
fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn VoiceAuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    if let Some(path) = &config.path {
        let sink = FileAuditSink::new(path)
            .map_err(|err| ServerError::Config(format!("audit log open failed: {err}")))?;
        return Ok(Arc::new(sink));
    }
    Ok(Arc::new(StderrAuditSink))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `POST /generate`.
async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let session_id = session_from_headers(&headers);
    let (status, payload) = process_generate(&state, &session_id, &body);
    (status, axum::Json(payload))
}

/// Handles `GET /version`.
async fn handle_version() -> impl IntoResponse {
    axum::Json(version_payload())
}

/// Extracts the caller's session id, defaulting to the shared session.
#[must_use]
pub fn session_from_headers(headers: &HeaderMap) -> SessionId {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| SessionId::new(DEFAULT_SESSION), SessionId::new)
}

/// Static version payload; no dynamic fields.
#[must_use]
pub fn version_payload() -> Value {
    json!({
        "engine_name": ENGINE_NAME,
        "engine_version": ENGINE_VERSION,
        "release_stage": ENGINE_RELEASE_STAGE,
    })
}

// ============================================================================
// SECTION: Generate Processing
// ============================================================================

/// Validated `/generate` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Prompt text.
    pub prompt: String,
    /// Requested emotional language.
    pub emotional_lang: Language,
}

/// Processes one `/generate` body and returns the status and payload.
#[must_use]
pub fn process_generate(
    state: &ServerState,
    session_id: &SessionId,
    body: &[u8],
) -> (StatusCode, Value) {
    let (status, payload, outcome) = generate_response(state, session_id, body);
    state.metrics.record_request("/generate", outcome);
    let response_bytes = payload.to_string().len();
    state.audit.record(&VoiceAuditEvent::new(
        "/generate",
        outcome,
        status.as_u16(),
        body.len(),
        response_bytes,
    ));
    (status, payload)
}

/// Builds the `/generate` response triple.
fn generate_response(
    state: &ServerState,
    session_id: &SessionId,
    body: &[u8],
) -> (StatusCode, Value, RequestOutcome) {
    if body.len() > state.max_body_bytes {
        return invalid_input("Request body too large.");
    }
    let request = match validate_generate_request(body) {
        Ok(request) => request,
        Err(message) => return invalid_input(message),
    };

    let turn = TurnRequest {
        session_id,
        prompt: &request.prompt,
        emotional_lang: Some(request.emotional_lang),
    };
    match state.pipeline.run_turn(&turn) {
        Ok(response) => {
            let payload = json!({
                "response_text": response.response_text,
                "trace": response.trace,
            });
            (StatusCode::OK, payload, RequestOutcome::Success)
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Inference failed.", "code": "INFERENCE_FAILED" }),
            RequestOutcome::Failed,
        ),
    }
}

/// Builds a 400 response for invalid input.
fn invalid_input(message: &str) -> (StatusCode, Value, RequestOutcome) {
    (
        StatusCode::BAD_REQUEST,
        json!({ "error": message, "code": "INVALID_INPUT" }),
        RequestOutcome::InvalidInput,
    )
}

/// Validates the request body against the public contract.
///
/// # Errors
///
/// Returns the user-facing validation message on rejection.
pub fn validate_generate_request(body: &[u8]) -> Result<GenerateRequest, &'static str> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|_| "Invalid request body.")?;
    let object = payload.as_object().ok_or("Invalid request body.")?;

    if object.keys().any(|key| !GENERATE_REQUEST_KEYS.contains(&key.as_str())) {
        return Err("Unexpected fields in request.");
    }

    let prompt = object
        .get("prompt")
        .and_then(Value::as_str)
        .ok_or("Prompt must be a string.")?;
    if prompt.trim().is_empty() {
        return Err("Prompt cannot be empty.");
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err("Prompt exceeds maximum length.");
    }

    let emotional_lang = match object.get("emotional_lang") {
        None | Some(Value::Null) => Language::En,
        Some(Value::String(lang)) => match lang.as_str() {
            "en" => Language::En,
            "hi" => Language::Hi,
            _ => return Err("Unsupported emotional_lang."),
        },
        Some(_) => return Err("Invalid emotional_lang."),
    };

    Ok(GenerateRequest {
        prompt: prompt.to_string(),
        emotional_lang,
    })
}
