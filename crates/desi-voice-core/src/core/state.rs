// crates/desi-voice-core/src/core/state.rs
// ============================================================================
// Module: Session Voice State
// Description: Rotation memory, session state, and staged turn writes.
// Purpose: Capture deterministic per-session evolution with atomic commits.
// Dependencies: crate::core::{contract, skeleton}, serde, thiserror
// ============================================================================

//! ## Overview
//! All pipeline mutability lives here. Rotation memory is an append-only log
//! of variant usage per pool, logically windowed on read. A turn never writes
//! the session directly: writes are staged in a [`TurnStage`] and applied as
//! one commit when the turn succeeds, so partial failures and abandoned
//! requests leave the session untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::contract::PoolKey;
use crate::core::skeleton::EmotionalTheme;
use crate::core::skeleton::EscalationState;
use crate::core::skeleton::Language;
use crate::core::skeleton::Skeleton;

// ============================================================================
// SECTION: Session Identifier
// ============================================================================

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by session-state reads and transitions.
#[derive(Debug, Error)]
pub enum StateError {
    /// Rotation memory holds entries ahead of the session clock.
    #[error("rotation memory inconsistent for pool {pool}")]
    CorruptRotation {
        /// Affected pool.
        pool: PoolKey,
    },
    /// A skeleton transition violates the escalation ladder.
    #[error("illegal skeleton transition {from} -> {to}")]
    InvalidTransition {
        /// Previous skeleton.
        from: Skeleton,
        /// Requested skeleton.
        to: Skeleton,
    },
}

// ============================================================================
// SECTION: Rotation Memory
// ============================================================================

/// One committed use of a variant within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantUsage {
    /// Variant that was emitted.
    pub variant_id: u32,
    /// One-based emotional turn the variant was emitted on.
    pub turn_index: u32,
}

/// Append-only usage log per pool, windowed on read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationMemory {
    /// Full usage history per pool.
    pools: BTreeMap<PoolKey, Vec<VariantUsage>>,
}

impl RotationMemory {
    /// Creates empty rotation memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the full usage history for a pool.
    #[must_use]
    pub fn history(&self, key: &PoolKey) -> &[VariantUsage] {
        self.pools.get(key).map_or(&[], Vec::as_slice)
    }

    /// Returns the last `window_size` usages for a pool.
    #[must_use]
    pub fn window(&self, key: &PoolKey, window_size: usize) -> &[VariantUsage] {
        let history = self.history(key);
        let start = history.len().saturating_sub(window_size);
        &history[start..]
    }

    /// Appends a usage record to a pool.
    pub fn record(&mut self, key: PoolKey, usage: VariantUsage) {
        self.pools.entry(key).or_default().push(usage);
    }

    /// Clears a single pool.
    pub fn clear_pool(&mut self, key: &PoolKey) {
        self.pools.remove(key);
    }

    /// Clears every pool matched by the predicate.
    pub fn clear_where(&mut self, predicate: impl Fn(&PoolKey) -> bool) {
        self.pools.retain(|key, _| !predicate(key));
    }

    /// Clears all pools.
    pub fn clear_all(&mut self) {
        self.pools.clear();
    }
}

// ============================================================================
// SECTION: Session Voice State
// ============================================================================

/// Per-session mutable state, owned exclusively by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionVoiceState {
    /// Rotation memory for every pool touched this session.
    pub rotation: RotationMemory,
    /// Escalation ladder state.
    pub escalation_state: EscalationState,
    /// Latched contextual theme.
    pub latched_theme: Option<EmotionalTheme>,
    /// Count of committed emotional turns.
    pub emotional_turn_index: u32,
    /// Skeleton emitted on the previous emotional turn.
    pub last_skeleton: Option<Skeleton>,
    /// Language emitted on the previous emotional turn.
    pub last_language: Option<Language>,
    /// Consecutive calm emotional turns committed under skeleton C.
    pub calm_streak: u32,
}

impl SessionVoiceState {
    /// Creates the state for a freshly contacted session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rotation: RotationMemory::new(),
            escalation_state: EscalationState::None,
            latched_theme: None,
            emotional_turn_index: 0,
            last_skeleton: None,
            last_language: None,
            calm_streak: 0,
        }
    }

    /// Hard reset: clears rotation memory and every emotional field.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SessionVoiceState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Pool Resets
// ============================================================================

/// Scope of a partial rotation-memory reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolReset {
    /// Clear every pool of the skeleton.
    Skeleton(Skeleton),
    /// Clear every pool of the language.
    Language(Language),
    /// Clear exactly one pool.
    Pool(PoolKey),
}

impl PoolReset {
    /// Returns true when the reset covers the pool.
    #[must_use]
    pub fn matches(&self, key: &PoolKey) -> bool {
        match self {
            Self::Skeleton(skeleton) => key.skeleton == *skeleton,
            Self::Language(language) => key.language == *language,
            Self::Pool(pool) => key == pool,
        }
    }
}

// ============================================================================
// SECTION: Turn Stage
// ============================================================================

/// Staged writes for one turn, applied atomically on success.
#[derive(Debug, Clone, Default)]
pub struct TurnStage {
    /// Hard reset staged before any other write.
    hard_reset: bool,
    /// Partial pool resets staged for this turn.
    resets: Vec<PoolReset>,
    /// Usage appends staged by the selector.
    appends: Vec<(PoolKey, VariantUsage)>,
    /// New escalation state, when changed.
    escalation_state: Option<EscalationState>,
    /// New latched theme, when changed.
    latched_theme: Option<Option<EmotionalTheme>>,
    /// New last-emitted skeleton, when changed.
    last_skeleton: Option<Option<Skeleton>>,
    /// New last-emitted language, when changed.
    last_language: Option<Language>,
    /// New calm-streak count, when changed.
    calm_streak: Option<u32>,
    /// Whether this turn increments the emotional turn index.
    increment_turn: bool,
}

impl TurnStage {
    /// Creates an empty stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a hard reset.
    pub fn stage_hard_reset(&mut self) {
        self.hard_reset = true;
    }

    /// Stages a partial pool reset.
    pub fn stage_reset(&mut self, reset: PoolReset) {
        self.resets.push(reset);
    }

    /// Stages a usage append for a pool.
    pub fn record(&mut self, key: PoolKey, usage: VariantUsage) {
        self.appends.push((key, usage));
    }

    /// Stages the post-turn emotional fields.
    pub fn stage_turn_fields(
        &mut self,
        escalation_state: EscalationState,
        latched_theme: Option<EmotionalTheme>,
        last_skeleton: Option<Skeleton>,
        last_language: Language,
        calm_streak: u32,
    ) {
        self.escalation_state = Some(escalation_state);
        self.latched_theme = Some(latched_theme);
        self.last_skeleton = Some(last_skeleton);
        self.last_language = Some(last_language);
        self.calm_streak = Some(calm_streak);
        self.increment_turn = true;
    }

    /// Discards staged usage appends while keeping resets and field writes.
    pub fn discard_appends(&mut self) {
        self.appends.clear();
    }

    /// Returns the staged view of a pool window: resets applied, staged
    /// appends visible, then windowed to the last `window_size` entries.
    #[must_use]
    pub fn window(
        &self,
        state: &SessionVoiceState,
        key: &PoolKey,
        window_size: usize,
    ) -> Vec<VariantUsage> {
        let mut history: Vec<VariantUsage> = if self.pool_is_reset(key) {
            Vec::new()
        } else {
            state.rotation.history(key).to_vec()
        };
        for (staged_key, usage) in &self.appends {
            if staged_key == key {
                history.push(*usage);
            }
        }
        let start = history.len().saturating_sub(window_size);
        history.split_off(start)
    }

    /// Returns true when a staged reset covers the pool.
    #[must_use]
    pub fn pool_is_reset(&self, key: &PoolKey) -> bool {
        self.hard_reset || self.resets.iter().any(|reset| reset.matches(key))
    }

    /// Applies every staged write to the session state as one commit.
    pub fn commit(self, state: &mut SessionVoiceState) {
        if self.hard_reset {
            state.reset();
        }
        for reset in &self.resets {
            state.rotation.clear_where(|key| reset.matches(key));
        }
        for (key, usage) in self.appends {
            state.rotation.record(key, usage);
        }
        if let Some(escalation_state) = self.escalation_state {
            state.escalation_state = escalation_state;
        }
        if let Some(latched_theme) = self.latched_theme {
            state.latched_theme = latched_theme;
        }
        if let Some(last_skeleton) = self.last_skeleton {
            state.last_skeleton = last_skeleton;
        }
        if let Some(last_language) = self.last_language {
            state.last_language = Some(last_language);
        }
        if let Some(calm_streak) = self.calm_streak {
            state.calm_streak = calm_streak;
        }
        if self.increment_turn {
            state.emotional_turn_index = state.emotional_turn_index.saturating_add(1);
        }
    }
}
