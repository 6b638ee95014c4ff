// crates/desi-voice-server/src/audit.rs
// ============================================================================
// Module: Request Audit Logging
// Description: Structured audit events for HTTP request handling.
// Purpose: Emit JSON-line audit logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events capture request metadata only and never enter response
//! bodies, so the determinism contract of the public surface is untouched.
//! Sinks are intentionally lightweight: stderr, append-only file, or no-op.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::telemetry::RequestOutcome;

// ============================================================================
// SECTION: Event
// ============================================================================

/// One audited HTTP request.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Endpoint that handled the request.
    pub endpoint: &'static str,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl VoiceAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(
        endpoint: &'static str,
        outcome: RequestOutcome,
        status: u16,
        request_bytes: usize,
        response_bytes: usize,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "voice_request",
            timestamp_ms,
            endpoint,
            outcome,
            status,
            request_bytes,
            response_bytes,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for request events.
pub trait VoiceAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &VoiceAuditEvent);
}

/// Audit sink that drops every event.
pub struct NoopAuditSink;

impl VoiceAuditSink for NoopAuditSink {
    fn record(&self, _event: &VoiceAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl VoiceAuditSink for StderrAuditSink {
    fn record(&self, event: &VoiceAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl VoiceAuditSink for FileAuditSink {
    fn record(&self, event: &VoiceAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            if let Ok(mut file) = self.file.lock() {
                let _ = writeln!(file, "{payload}");
            }
        }
    }
}
