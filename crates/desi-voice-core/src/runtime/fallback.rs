// crates/desi-voice-core/src/runtime/fallback.rs
// ============================================================================
// Module: Fallback Engine
// Description: Three-level deterministic safe-output hierarchy.
// Purpose: Produce a safe response on any internal failure, without retries.
// Dependencies: crate::core::{contract, skeleton, state, trace}
// ============================================================================

//! ## Overview
//! Fallbacks are tried in a fixed order: skeleton-local (variant 0 of the
//! same pools), English-safe (same skeleton in English), then the absolute
//! per-skeleton constants compiled into the binary. The first two stage
//! rotation updates and count as emotional turns; the absolute level touches
//! no state. The same error on the same state always produces the same
//! fallback string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::contract::ContractStore;
use crate::core::contract::PoolKey;
use crate::core::skeleton::Language;
use crate::core::skeleton::Section;
use crate::core::skeleton::Skeleton;
use crate::core::state::TurnStage;
use crate::core::state::VariantUsage;
use crate::core::trace::FallbackLevel;
use crate::core::trace::FallbackReason;
use crate::runtime::VoiceError;

// ============================================================================
// SECTION: Absolute Constants
// ============================================================================

/// Absolute fallback string for skeleton A.
const ABSOLUTE_A: &str = "I hear you. If you want, you can tell me more.";
/// Absolute fallback string for skeleton B.
const ABSOLUTE_B: &str = "That sounds like a lot to carry. I'm here with you.";
/// Absolute fallback string for skeleton C.
const ABSOLUTE_C: &str = "That sounds exhausting. We can just stay here for a moment.";
/// Absolute fallback string for skeleton D.
const ABSOLUTE_D: &str = "Let's keep this very small. That's enough for now.";

/// Returns the immutable absolute fallback string for a skeleton.
#[must_use]
pub const fn absolute_fallback(skeleton: Skeleton) -> &'static str {
    match skeleton {
        Skeleton::A => ABSOLUTE_A,
        Skeleton::B => ABSOLUTE_B,
        Skeleton::C => ABSOLUTE_C,
        Skeleton::D => ABSOLUTE_D,
    }
}

// ============================================================================
// SECTION: Error Routing
// ============================================================================

/// Maps a taxonomy error to its trace reason.
#[must_use]
pub fn fallback_reason(error: &VoiceError) -> FallbackReason {
    match error {
        VoiceError::Contract(_) => FallbackReason::ContractLoadFailure,
        VoiceError::Selection(_) => FallbackReason::SelectionExhausted,
        VoiceError::State(_) => FallbackReason::RotationMemoryReset,
        VoiceError::Assembly(_) => FallbackReason::AssemblyFailure,
    }
}

/// Maps a taxonomy error to the first fallback level to attempt.
#[must_use]
pub fn fallback_entry_level(error: &VoiceError) -> FallbackLevel {
    match error {
        VoiceError::Contract(_) | VoiceError::Assembly(_) => FallbackLevel::Absolute,
        VoiceError::Selection(_) | VoiceError::State(_) => FallbackLevel::SkeletonLocal,
    }
}

// ============================================================================
// SECTION: Fallback Outcome
// ============================================================================

/// Result of running the fallback hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome {
    /// Safe response text.
    pub text: String,
    /// Level that produced the response.
    pub level: FallbackLevel,
    /// Variant ids emitted per section; empty at the absolute level.
    pub sections: BTreeMap<Section, u32>,
    /// Whether the turn commits staged state writes.
    pub commits: bool,
}

/// Runs the hierarchy from the entry level down to the absolute constants.
#[must_use]
pub fn run_fallback(
    contract: Option<&ContractStore>,
    skeleton: Skeleton,
    language: Language,
    entry_level: FallbackLevel,
    prior_turn_count: u32,
    stage: &mut TurnStage,
) -> FallbackOutcome {
    // Appends staged by the failed path must not survive into the fallback.
    stage.discard_appends();
    if let Some(contract) = contract {
        if entry_level == FallbackLevel::SkeletonLocal {
            if let Some(outcome) =
                first_variant_outcome(contract, skeleton, language, prior_turn_count, stage)
            {
                return outcome;
            }
            if language != Language::En {
                if let Some(mut outcome) =
                    first_variant_outcome(contract, skeleton, Language::En, prior_turn_count, stage)
                {
                    outcome.level = FallbackLevel::EnglishSafe;
                    return outcome;
                }
            }
        }
    }

    // Absolute level: no rotation update, no turn increment.
    FallbackOutcome {
        text: absolute_fallback(skeleton).to_string(),
        level: FallbackLevel::Absolute,
        sections: BTreeMap::new(),
        commits: false,
    }
}

/// Builds the variant-0 response for a skeleton and language, staging usage
/// only when every section resolves.
fn first_variant_outcome(
    contract: &ContractStore,
    skeleton: Skeleton,
    language: Language,
    prior_turn_count: u32,
    stage: &mut TurnStage,
) -> Option<FallbackOutcome> {
    let policy = skeleton.policy();
    let mut parts = Vec::with_capacity(policy.sections.len());
    let mut sections = BTreeMap::new();
    for &section in policy.sections {
        let pool = contract.variants(skeleton, language, section);
        let entry = pool.first()?;
        parts.push(entry.text.as_str());
        sections.insert(section, entry.variant_id);
    }
    for (&section, &variant_id) in &sections {
        stage.record(
            PoolKey::new(skeleton, language, section),
            VariantUsage {
                variant_id,
                turn_index: prior_turn_count.saturating_add(1),
            },
        );
    }
    Some(FallbackOutcome {
        text: parts.join(" "),
        level: FallbackLevel::SkeletonLocal,
        sections,
        commits: true,
    })
}
