// crates/desi-voice-server/src/telemetry.rs
// ============================================================================
// Module: Request Telemetry
// Description: Metrics seam for HTTP request outcomes.
// Purpose: Let deployments plug in their metrics pipeline without redesign.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The server reports request outcomes through a trait so deployments can
//! route counters to their preferred pipeline. The default implementation
//! drops everything; nothing observable feeds back into responses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome classification for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request produced a 200 response.
    Success,
    /// Request was rejected as invalid input.
    InvalidInput,
    /// Request failed internally.
    Failed,
}

/// Metrics sink for request outcomes.
pub trait VoiceMetrics: Send + Sync {
    /// Records one request outcome for an endpoint.
    fn record_request(&self, endpoint: &'static str, outcome: RequestOutcome);
}

/// Metrics sink that drops every sample.
pub struct NoopMetrics;

impl VoiceMetrics for NoopMetrics {
    fn record_request(&self, _endpoint: &'static str, _outcome: RequestOutcome) {}
}
