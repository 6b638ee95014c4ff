// crates/desi-voice-core/src/core/trace.rs
// ============================================================================
// Module: Decision Trace
// Description: Structured turn trace and canonical replay hashing.
// Purpose: Record every deterministic decision and derive the replay hash.
// Dependencies: crate::core::{hashing, intent, skeleton, tone}, serde
// ============================================================================

//! ## Overview
//! The decision trace is assembled once per request and immutable afterwards.
//! The replay hash covers exactly the documented input set (prompt, emotional
//! language, guardrail category and severity, skeleton, tone profile, and the
//! selection pairs); every other trace field is observability-only and cannot
//! move the hash.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::hashing::HashError;
use crate::core::hashing::ReplayHash;
use crate::core::hashing::replay_hash;
use crate::core::identity::GUARDRAIL_SCHEMA_VERSION;
use crate::core::identity::GUARDRAIL_STRATEGY_VERSION;
use crate::core::intent::IntentKind;
use crate::core::intent::SafetyCategory;
use crate::core::intent::Severity;
use crate::core::intent::TurnSignals;
use crate::core::skeleton::EmotionalTheme;
use crate::core::skeleton::EscalationState;
use crate::core::skeleton::Language;
use crate::core::skeleton::Section;
use crate::core::skeleton::Skeleton;
use crate::core::tone::ToneProfile;

// ============================================================================
// SECTION: Trace Components
// ============================================================================

/// Turn-level trace fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnTrace {
    /// Committed emotional turn count after this turn.
    pub emotional_turn_index: u32,
    /// Classified intent kind.
    pub intent: IntentKind,
    /// Emotional language of the turn.
    pub emotional_lang: Language,
    /// Skeleton emitted on the previous emotional turn.
    pub previous_skeleton: Option<Skeleton>,
    /// Skeleton resolved for this turn; `null` on non-emotional turns.
    pub resolved_skeleton: Option<Skeleton>,
    /// Transition in `from->to` form; absent on non-emotional turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skeleton_transition: Option<String>,
    /// Escalation state after resolution.
    pub escalation_state: EscalationState,
    /// Latched theme after resolution.
    pub latched_theme: Option<EmotionalTheme>,
    /// Raw emotional signals.
    pub signals: TurnSignals,
}

/// Guardrail action recorded in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailActionKind {
    /// No guardrail action taken.
    None,
    /// Response text was replaced by a contract-backed override.
    Override,
}

/// Guardrail trace fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardrailTrace {
    /// Classifier schema version.
    pub classifier_version: &'static str,
    /// Strategy version.
    pub strategy_version: &'static str,
    /// Classified safety category.
    pub category: SafetyCategory,
    /// Severity of the category.
    pub severity: Severity,
    /// Action applied to the response.
    pub action: GuardrailActionKind,
}

impl GuardrailTrace {
    /// Creates a guardrail trace with the pinned component versions.
    #[must_use]
    pub fn new(category: SafetyCategory, severity: Severity, action: GuardrailActionKind) -> Self {
        Self {
            classifier_version: GUARDRAIL_SCHEMA_VERSION,
            strategy_version: GUARDRAIL_STRATEGY_VERSION,
            category,
            severity,
            action,
        }
    }
}

/// Skeleton trace fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkeletonTrace {
    /// Skeleton before guardrail escalation.
    pub base: Option<Skeleton>,
    /// Skeleton after guardrail escalation.
    pub after_guardrail: Option<Skeleton>,
}

/// Selection trace fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionTrace {
    /// Candidates that survived constraint filtering, summed over sections.
    pub eligible_count: u32,
    /// Chosen variant id per section.
    pub selected_variant_indices: BTreeMap<String, u32>,
}

impl SelectionTrace {
    /// Creates an empty selection trace for turns without selection.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            eligible_count: 0,
            selected_variant_indices: BTreeMap::new(),
        }
    }

    /// Creates a selection trace from section-keyed ids.
    #[must_use]
    pub fn from_sections(eligible_count: u32, sections: &BTreeMap<Section, u32>) -> Self {
        Self {
            eligible_count,
            selected_variant_indices: sections
                .iter()
                .map(|(section, id)| (section.as_str().to_string(), *id))
                .collect(),
        }
    }
}

/// Fallback level recorded in the trace meta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLevel {
    /// Variant 0 of the same skeleton and language.
    SkeletonLocal,
    /// Same skeleton and section in English.
    EnglishSafe,
    /// Hard-coded immutable per-skeleton string.
    Absolute,
}

/// Fallback reason recorded in the trace meta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Contract failed to load or is unavailable.
    ContractLoadFailure,
    /// Selection produced no usable candidate.
    SelectionExhausted,
    /// Rotation memory was inconsistent and the pool was reset.
    RotationMemoryReset,
    /// Assembly produced no usable text.
    AssemblyFailure,
}

/// Trace meta emitted on fallback paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FallbackMeta {
    /// Why the fallback fired.
    pub fallback_reason: FallbackReason,
    /// Which level produced the response.
    pub fallback_level: FallbackLevel,
}

// ============================================================================
// SECTION: Decision Trace
// ============================================================================

/// Immutable per-request decision trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionTrace {
    /// Turn-level fields.
    pub turn: TurnTrace,
    /// Guardrail fields.
    pub guardrail: GuardrailTrace,
    /// Skeleton fields.
    pub skeleton: SkeletonTrace,
    /// Derived tone profile; absent when the guardrail overrode the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone_profile: Option<ToneProfile>,
    /// Selection fields.
    pub selection: SelectionTrace,
    /// Fallback meta; present only on fallback paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<FallbackMeta>,
    /// Canonical replay hash over the documented input set.
    pub replay_hash: ReplayHash,
}

// ============================================================================
// SECTION: Replay Input
// ============================================================================

/// Guardrail subset feeding the replay hash.
#[derive(Debug, Serialize)]
struct ReplayGuardrail {
    /// Classified safety category.
    category: SafetyCategory,
    /// Severity of the category.
    severity: Severity,
}

/// Exact replay-hash input set; nothing else may feed the digest.
#[derive(Debug, Serialize)]
struct ReplayInput<'a> {
    /// Raw prompt text.
    prompt: &'a str,
    /// Emotional language of the turn.
    emotional_lang: Language,
    /// Guardrail category and severity.
    guardrail: ReplayGuardrail,
    /// Resolved skeleton after guardrail escalation.
    skeleton: Option<Skeleton>,
    /// Derived tone profile.
    tone_profile: Option<ToneProfile>,
    /// Ordered section-to-variant pairs.
    selection: &'a BTreeMap<String, u32>,
}

/// Builds the decision trace, deriving the replay hash from the canonical
/// serialization of the documented input set.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
#[allow(clippy::too_many_arguments, reason = "the trace captures full turn context")]
pub fn build_decision_trace(
    prompt: &str,
    turn: TurnTrace,
    guardrail: GuardrailTrace,
    skeleton: SkeletonTrace,
    tone_profile: Option<ToneProfile>,
    selection: SelectionTrace,
    meta: Option<FallbackMeta>,
) -> Result<DecisionTrace, HashError> {
    let input = ReplayInput {
        prompt,
        emotional_lang: turn.emotional_lang,
        guardrail: ReplayGuardrail {
            category: guardrail.category,
            severity: guardrail.severity,
        },
        skeleton: skeleton.after_guardrail,
        tone_profile,
        selection: &selection.selected_variant_indices,
    };
    let hash = replay_hash(&input)?;
    Ok(DecisionTrace {
        turn,
        guardrail,
        skeleton,
        tone_profile,
        selection,
        meta,
        replay_hash: hash,
    })
}
