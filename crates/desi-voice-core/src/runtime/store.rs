// crates/desi-voice-core/src/runtime/store.rs
// ============================================================================
// Module: Session Store
// Description: In-memory session registry implementation.
// Purpose: Own per-session voice state behind a short-lived registry lock.
// Dependencies: crate::core::state, crate::interfaces
// ============================================================================

//! ## Overview
//! The in-memory store maps session ids to shared state handles. The registry
//! lock covers only lookup and create; the per-session lock returned to the
//! caller serializes whole turns, so requests for different sessions run in
//! parallel without interaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::state::SessionId;
use crate::core::state::SessionVoiceState;
use crate::interfaces::SessionStore;
use crate::interfaces::SharedSessionState;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory session registry.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    /// Session handles keyed by id.
    sessions: Mutex<HashMap<SessionId, SharedSessionState>>,
}

impl InMemorySessionStore {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, session_id: &SessionId) -> Result<SharedSessionState, StoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        let handle = sessions
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SessionVoiceState::new())));
        Ok(Arc::clone(handle))
    }

    fn end_session(&self, session_id: &SessionId) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        sessions.remove(session_id);
        Ok(())
    }
}
