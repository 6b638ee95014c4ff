// crates/desi-voice-server/src/lib.rs
// ============================================================================
// Module: Desi Voice Server Library
// Description: HTTP surface, configuration, and observability wiring.
// Purpose: Expose the voice pipeline over the public contract.
// Dependencies: desi-voice-core, axum, tokio
// ============================================================================

//! ## Overview
//! `desi-voice-server` hosts the deterministic voice pipeline behind the
//! v1.0.0 HTTP contract: `POST /generate` and `GET /version`. Configuration
//! is fail-closed TOML; observability goes through audit-sink and metrics
//! traits so responses stay free of nondeterministic metadata.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod config;
pub mod model;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::VoiceAuditEvent;
pub use audit::VoiceAuditSink;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::VoiceServerConfig;
pub use model::ScaffoldModel;
pub use server::GenerateRequest;
pub use server::ServerError;
pub use server::ServerState;
pub use server::VoiceServer;
pub use server::process_generate;
pub use server::router;
pub use server::session_from_headers;
pub use server::validate_generate_request;
pub use server::version_payload;
pub use telemetry::NoopMetrics;
pub use telemetry::RequestOutcome;
pub use telemetry::VoiceMetrics;
