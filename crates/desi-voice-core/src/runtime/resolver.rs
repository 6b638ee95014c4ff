// crates/desi-voice-core/src/runtime/resolver.rs
// ============================================================================
// Module: Skeleton Resolver
// Description: Skeleton and language resolution with escalation and latching.
// Purpose: Make the last semantic decision of the turn.
// Dependencies: crate::core::{intent, skeleton, state}
// ============================================================================

//! ## Overview
//! The resolver maps the classifier verdict and the previous session state to
//! the skeleton, language, escalation state, and latched theme for this turn,
//! plus the reset operations the transition requires. Downstream stages do
//! not re-read user text. The escalation ladder A -> B -> C is monotonic
//! within a session; the only way down is the hard-reset path. Escalation
//! fully resolves when [`CALM_TURNS_TO_RESOLVE`] consecutive calm emotional
//! turns arrive under C: the session hard-resets and the turn runs as A with
//! a fresh emotional turn index.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::intent::Intent;
use crate::core::intent::SafetyCategory;
use crate::core::skeleton::EmotionalTheme;
use crate::core::skeleton::EscalationState;
use crate::core::skeleton::Language;
use crate::core::skeleton::Skeleton;
use crate::core::state::PoolReset;
use crate::core::state::SessionVoiceState;
use crate::core::state::StateError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Consecutive calm emotional turns under C before escalation fully resolves.
///
/// A turn is calm when the classifier carries no stillness, guilt, overwhelm,
/// action, safety, or theme signal. The counter is a pure function of intent
/// transitions; it never reads user text directly.
pub const CALM_TURNS_TO_RESOLVE: u32 = 2;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolver output for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Skeleton for this turn; `None` on non-emotional turns.
    pub skeleton: Option<Skeleton>,
    /// Emotional language for this turn.
    pub language: Language,
    /// Escalation state after resolution.
    pub escalation_state: EscalationState,
    /// Latched theme after resolution.
    pub latched_theme: Option<EmotionalTheme>,
    /// Skeleton emitted on the previous emotional turn.
    pub previous_skeleton: Option<Skeleton>,
    /// Committed emotional turns before this one, as observed by the selector.
    pub prior_turn_count: u32,
    /// Whether the turn starts with a hard session reset.
    pub hard_reset: bool,
    /// Partial pool resets required by this transition.
    pub resets: Vec<PoolReset>,
    /// Calm-streak count to commit after this turn.
    pub calm_streak: u32,
}

// ============================================================================
// SECTION: Resolution Rules
// ============================================================================

/// Resolves the skeleton, language, and session transition for one turn.
#[must_use]
pub fn resolve_skeleton(
    intent: &Intent,
    state: &SessionVoiceState,
    requested_lang: Option<Language>,
) -> Resolution {
    let language = requested_lang.unwrap_or(intent.detected_language);

    if !intent.kind.is_emotional() {
        // Intent transitioned emotional -> non-emotional: full reset.
        let hard_reset = state.last_skeleton.is_some();
        return Resolution {
            skeleton: None,
            language,
            escalation_state: EscalationState::None,
            latched_theme: None,
            previous_skeleton: state.last_skeleton,
            prior_turn_count: 0,
            hard_reset,
            resets: Vec::new(),
            calm_streak: 0,
        };
    }

    let forces_stillness =
        intent.safety_category == SafetyCategory::SelfHarm || intent.signals.resignation;
    let base = base_skeleton(intent, forces_stillness);

    // Escalation fully resolves: enough consecutive calm turns under C walk
    // the session back to A through the full reset path.
    let calm = base == Skeleton::A && intent.theme.is_none();
    if state.last_skeleton == Some(Skeleton::C)
        && calm
        && state.calm_streak.saturating_add(1) >= CALM_TURNS_TO_RESOLVE
    {
        return Resolution {
            skeleton: Some(Skeleton::A),
            language,
            escalation_state: EscalationState::None,
            latched_theme: None,
            previous_skeleton: None,
            prior_turn_count: 0,
            hard_reset: true,
            resets: Vec::new(),
            calm_streak: 0,
        };
    }

    let latched_theme = intent.theme.or(state.latched_theme);
    let base = apply_family_constraint(base, latched_theme);

    let previous = state.last_skeleton;
    let floor = previous.map_or(0, Skeleton::ladder_rank);
    let resolved = if base.ladder_rank() < floor {
        ladder_skeleton(floor)
    } else {
        base
    };

    let escalated_up = previous.is_some_and(|prev| resolved.ladder_rank() > prev.ladder_rank());
    let escalation_state = if forces_stillness
        || latched_theme == Some(EmotionalTheme::Resignation)
        || state.escalation_state == EscalationState::Latched
    {
        EscalationState::Latched
    } else if escalated_up {
        EscalationState::Escalating
    } else {
        state.escalation_state
    };

    let mut resets = Vec::new();
    if escalated_up {
        resets.push(PoolReset::Skeleton(resolved));
    }
    if latched_theme.is_some() && latched_theme != state.latched_theme {
        resets.extend(theme_resets(latched_theme));
    }
    if state.last_language.is_some_and(|last| last != language) {
        resets.push(PoolReset::Language(language));
    }

    let calm_streak = if resolved == Skeleton::C && calm {
        state.calm_streak.saturating_add(1)
    } else {
        0
    };

    Resolution {
        skeleton: Some(resolved),
        language,
        escalation_state,
        latched_theme,
        previous_skeleton: previous,
        prior_turn_count: state.emotional_turn_index,
        hard_reset: false,
        resets,
        calm_streak,
    }
}

/// Checks that an emotional transition respects the monotonic ladder.
///
/// # Errors
///
/// Returns [`StateError::InvalidTransition`] when the resolved skeleton moves
/// down the ladder without a hard reset.
pub fn validate_transition(previous: Option<Skeleton>, resolved: Skeleton) -> Result<(), StateError> {
    if let Some(previous) = previous {
        if resolved.ladder_rank() < previous.ladder_rank() {
            return Err(StateError::InvalidTransition {
                from: previous,
                to: resolved,
            });
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Picks the base skeleton from the classifier signals.
fn base_skeleton(intent: &Intent, forces_stillness: bool) -> Skeleton {
    if forces_stillness || intent.signals.guilt {
        Skeleton::C
    } else if intent.signals.wants_action {
        Skeleton::D
    } else if intent.signals.overwhelm {
        Skeleton::B
    } else {
        Skeleton::A
    }
}

/// The family theme never resolves to A or D.
fn apply_family_constraint(base: Skeleton, latched_theme: Option<EmotionalTheme>) -> Skeleton {
    if latched_theme == Some(EmotionalTheme::Family)
        && matches!(base, Skeleton::A | Skeleton::D)
    {
        Skeleton::B
    } else {
        base
    }
}

/// Maps a ladder rank back to its skeleton.
fn ladder_skeleton(rank: u8) -> Skeleton {
    match rank {
        0 => Skeleton::A,
        1 => Skeleton::B,
        _ => Skeleton::C,
    }
}

/// Pools cleared when a theme latches or changes.
fn theme_resets(theme: Option<EmotionalTheme>) -> Vec<PoolReset> {
    match theme {
        Some(EmotionalTheme::Family) => {
            vec![PoolReset::Skeleton(Skeleton::B), PoolReset::Skeleton(Skeleton::C)]
        }
        Some(EmotionalTheme::Resignation) => vec![PoolReset::Skeleton(Skeleton::C)],
        Some(EmotionalTheme::Other) | None => Vec::new(),
    }
}
