// crates/desi-voice-core/src/interfaces/mod.rs
// ============================================================================
// Module: Core Interfaces
// Description: Seams between the voice core and external collaborators.
// Purpose: Keep the deterministic core backend-agnostic.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The core integrates with the outside world through explicit interfaces
//! rather than concrete backends: a session store owning per-session state and
//! a generative model seam for non-emotional turns. The emotional path never
//! touches the generative model; that is a routing invariant, not a runtime
//! check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

use crate::core::intent::IntentKind;
use crate::core::skeleton::Language;
use crate::core::state::SessionId;
use crate::core::state::SessionVoiceState;

// ============================================================================
// SECTION: Session Store
// ============================================================================

/// Shared handle to one session's state; the turn holds the lock for the
/// whole pipeline pass.
pub type SharedSessionState = Arc<Mutex<SessionVoiceState>>;

/// Errors raised by session stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's internal lock was poisoned.
    #[error("session store lock poisoned")]
    Poisoned,
}

/// Registry of per-session voice state.
pub trait SessionStore: Send + Sync {
    /// Returns the state for a session, creating it on first contact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the registry is unusable.
    fn get_or_create(&self, session_id: &SessionId) -> Result<SharedSessionState, StoreError>;

    /// Destroys a session's state when the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the registry is unusable.
    fn end_session(&self, session_id: &SessionId) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Generative Model
// ============================================================================

/// Errors raised by generative model backends.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The backend is not available.
    #[error("model backend unavailable: {0}")]
    Unavailable(String),
    /// Generation failed.
    #[error("model generation failed: {0}")]
    Generation(String),
}

/// Seam to the generative model used for non-emotional turns.
pub trait GenerativeModel: Send + Sync {
    /// Produces a response for a non-emotional turn.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the backend cannot produce output.
    fn generate(
        &self,
        prompt: &str,
        kind: IntentKind,
        language: Language,
    ) -> Result<String, ModelError>;
}
