// crates/desi-voice-core/src/runtime/selector.rs
// ============================================================================
// Module: Variant Selector
// Description: Five-phase deterministic variant selection per section.
// Purpose: Pick one contract variant per section using rotation memory.
// Dependencies: crate::core::{contract, skeleton, state}
// ============================================================================

//! ## Overview
//! Selection is a total function of the turn context, the contract, and the
//! staged rotation view. Each phase only reduces or orders the candidate set:
//! eligibility, hard constraints, usage scoring, tie-break, commit. The only
//! side effect is the staged usage append; nothing here reads user text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::contract::ContractStore;
use crate::core::contract::PoolKey;
use crate::core::contract::VariantEntry;
use crate::core::contract::VariantTag;
use crate::core::skeleton::EmotionalTheme;
use crate::core::skeleton::EscalationState;
use crate::core::skeleton::Language;
use crate::core::skeleton::Section;
use crate::core::skeleton::Skeleton;
use crate::core::state::SessionVoiceState;
use crate::core::state::StateError;
use crate::core::state::TurnStage;
use crate::core::state::VariantUsage;

// ============================================================================
// SECTION: Turn Context
// ============================================================================

/// Immutable snapshot handed from the resolver to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnContext {
    /// Skeleton for this turn.
    pub skeleton: Skeleton,
    /// Language for this turn.
    pub language: Language,
    /// Escalation state after resolution.
    pub escalation_state: EscalationState,
    /// Latched theme after resolution.
    pub latched_theme: Option<EmotionalTheme>,
    /// Committed emotional turns before this one.
    pub emotional_turn_index: u32,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by variant selection.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The contract holds no pool for the requested key.
    #[error("no variants found for {pool}")]
    EmptyPool {
        /// Affected pool in `skeleton/language/section` form.
        pool: String,
    },
    /// Rotation memory references a variant the pool does not hold.
    #[error("variant {variant_id} out of range for {pool}")]
    InvalidVariant {
        /// Affected pool in `skeleton/language/section` form.
        pool: String,
        /// Out-of-range variant id.
        variant_id: u32,
    },
}

// ============================================================================
// SECTION: Selection Outcome
// ============================================================================

/// One selected variant for a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSelection {
    /// Stable variant id within the pool.
    pub variant_id: u32,
    /// Approved fragment text.
    pub text: String,
}

/// Selector output for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// Chosen variant per section.
    pub sections: BTreeMap<Section, SectionSelection>,
    /// Candidates that survived hard constraints, summed over sections.
    pub eligible_count: u32,
    /// Whether any section fell back to variant 0 on an exhausted pool.
    pub exhausted: bool,
}

impl SelectionOutcome {
    /// Returns the section-to-id map for trace assembly.
    #[must_use]
    pub fn variant_ids(&self) -> BTreeMap<Section, u32> {
        self.sections
            .iter()
            .map(|(section, selection)| (*section, selection.variant_id))
            .collect()
    }
}

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Selects one variant per required section of the skeleton.
///
/// # Errors
///
/// Returns [`SelectionError`] when a pool is missing or references are
/// invalid, and [`StateError`] when the rotation window is inconsistent with
/// the session clock.
pub fn select_variants(
    contract: &ContractStore,
    ctx: &TurnContext,
    state: &SessionVoiceState,
    stage: &mut TurnStage,
) -> Result<SelectionOutcome, SelectError> {
    let policy = ctx.skeleton.policy();
    let mut sections = BTreeMap::new();
    let mut eligible_count: u32 = 0;
    let mut exhausted = false;

    for &section in policy.sections {
        let pool = contract.variants(ctx.skeleton, ctx.language, section);
        let key = PoolKey::new(ctx.skeleton, ctx.language, section);
        let location = pool_location(&key);
        if pool.is_empty() {
            return Err(SelectionError::EmptyPool {
                pool: location,
            }
            .into());
        }

        let window = stage.window(state, &key, policy.window_size);
        validate_window(&window, ctx.emotional_turn_index, &key)?;

        let chosen = if section == Section::Closure && policy.single_closure {
            // The single legal closure entry is returned immediately.
            eligible_count = eligible_count.saturating_add(1);
            pool[0].variant_id
        } else {
            let candidates = eligible_entries(pool, ctx);
            let candidates = apply_hard_constraints(candidates, pool, ctx, &window);
            if candidates.is_empty() {
                exhausted_choice(pool, ctx, &window, &location, &mut exhausted)?
            } else {
                eligible_count =
                    eligible_count.saturating_add(u32::try_from(candidates.len()).unwrap_or(u32::MAX));
                score_and_break_ties(&candidates, ctx, &window, policy.window_size)
            }
        };

        stage.record(
            key,
            VariantUsage {
                variant_id: chosen,
                turn_index: ctx.emotional_turn_index.saturating_add(1),
            },
        );
        let index = usize::try_from(chosen).unwrap_or(usize::MAX);
        let entry = pool.get(index).ok_or_else(|| SelectionError::InvalidVariant {
            pool: location,
            variant_id: chosen,
        })?;
        sections.insert(
            section,
            SectionSelection {
                variant_id: chosen,
                text: entry.text.clone(),
            },
        );
    }

    Ok(SelectionOutcome {
        sections,
        eligible_count,
        exhausted,
    })
}

/// Combined selector error covering selection (E2) and state (E3) causes.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Selection failure.
    #[error(transparent)]
    Selection(#[from] SelectionError),
    /// Rotation-state failure.
    #[error(transparent)]
    State(#[from] StateError),
}

// ============================================================================
// SECTION: Phase 1 - Eligibility
// ============================================================================

/// Reduces the pool to entries eligible under the skeleton policy.
fn eligible_entries<'a>(pool: &'a [VariantEntry], ctx: &TurnContext) -> Vec<&'a VariantEntry> {
    let policy = ctx.skeleton.policy();
    pool.iter()
        .filter(|entry| {
            if policy.drop_unapproved_expansion
                && entry.has_tag(VariantTag::AddedViaExpansion)
                && !entry.has_tag(VariantTag::ExpansionApproved)
            {
                return false;
            }
            true
        })
        .collect()
}

// ============================================================================
// SECTION: Phase 2 - Hard Constraints
// ============================================================================

/// Applies repetition, escalation, and theme constraints.
fn apply_hard_constraints<'a>(
    candidates: Vec<&'a VariantEntry>,
    pool: &[VariantEntry],
    ctx: &TurnContext,
    window: &[VariantUsage],
) -> Vec<&'a VariantEntry> {
    let mut filtered = candidates;

    // No immediate repetition, provided alternatives remain.
    if let Some(last) = window.last() {
        if filtered.len() > 1 {
            filtered.retain(|entry| entry.variant_id != last.variant_id);
        }
    }

    if ctx.escalation_state == EscalationState::Latched {
        filtered.retain(|entry| !entry.has_tag(VariantTag::Light));
    }

    if ctx.skeleton == Skeleton::C {
        if let Some(previous) = window.last().and_then(|usage| {
            pool.get(usize::try_from(usage.variant_id).unwrap_or(usize::MAX))
        }) {
            if !previous.has_tag(VariantTag::HighActivity) {
                filtered.retain(|entry| !entry.has_tag(VariantTag::HighActivity));
            }
        }
    }

    if ctx.latched_theme == Some(EmotionalTheme::Family) {
        filtered.retain(|entry| entry.has_tag(VariantTag::FamilySafe));
    }

    filtered
}

/// Stable choice when hard constraints empty the candidate set: C restores
/// the last-used variant, every other skeleton falls back to variant 0.
fn exhausted_choice(
    pool: &[VariantEntry],
    ctx: &TurnContext,
    window: &[VariantUsage],
    location: &str,
    exhausted: &mut bool,
) -> Result<u32, SelectionError> {
    if ctx.skeleton.policy().allow_repeat_when_exhausted {
        if let Some(last) = window.last() {
            if usize::try_from(last.variant_id).is_ok_and(|index| index < pool.len()) {
                return Ok(last.variant_id);
            }
            return Err(SelectionError::InvalidVariant {
                pool: location.to_string(),
                variant_id: last.variant_id,
            });
        }
    }
    *exhausted = true;
    Ok(0)
}

// ============================================================================
// SECTION: Phases 3 and 4 - Scoring and Tie-Break
// ============================================================================

/// Scores the candidates and resolves ties deterministically.
fn score_and_break_ties(
    candidates: &[&VariantEntry],
    ctx: &TurnContext,
    window: &[VariantUsage],
    window_size: usize,
) -> u32 {
    let policy = ctx.skeleton.policy();
    let skip_scoring = policy.skip_scoring_on_first_turn && ctx.emotional_turn_index == 0;

    let scored: Vec<(&VariantEntry, i64)> = candidates
        .iter()
        .map(|entry| {
            let score = if skip_scoring {
                0
            } else {
                score_candidate(
                    entry.variant_id,
                    window,
                    window_size,
                    policy.overuse_percent,
                    policy.halve_penalties,
                )
            };
            (*entry, score)
        })
        .collect();

    let best_score = scored.iter().map(|(_, score)| *score).max().unwrap_or(0);
    let top: Vec<&VariantEntry> = scored
        .iter()
        .filter(|(_, score)| *score == best_score)
        .map(|(entry, _)| *entry)
        .collect();

    tie_break(&top, window)
}

/// Scores one candidate against the rolling window.
fn score_candidate(
    variant_id: u32,
    window: &[VariantUsage],
    window_size: usize,
    overuse_percent: u32,
    halve_penalties: bool,
) -> i64 {
    let mut score: i64 = 0;
    let window_len = window.len();
    for (position, usage) in window.iter().enumerate() {
        if usage.variant_id != variant_id {
            continue;
        }
        // Distance 1 is the most recent entry.
        let distance = window_len - position;
        let mut penalty = i64::try_from(window_size - distance + 1).unwrap_or(i64::MAX);
        if halve_penalties {
            penalty /= 2;
        }
        score -= penalty;
    }

    let usage_count = usage_count(window, variant_id);
    let window_len = u64::try_from(window_len).unwrap_or(u64::MAX);
    if window_len > 0 && u64::from(usage_count) * 100 > u64::from(overuse_percent) * window_len {
        let mut penalty = i64::try_from(window_size).unwrap_or(i64::MAX).saturating_mul(2);
        if halve_penalties {
            penalty /= 2;
        }
        score -= penalty;
    }

    score
}

/// Resolves maximum-score ties: least recently used, then lowest usage count,
/// then lowest variant id.
fn tie_break(candidates: &[&VariantEntry], window: &[VariantUsage]) -> u32 {
    candidates
        .iter()
        .min_by_key(|entry| {
            let last_seen = last_seen_turn(window, entry.variant_id).map_or(-1, i64::from);
            (last_seen, usage_count(window, entry.variant_id), entry.variant_id)
        })
        .map_or(0, |entry| entry.variant_id)
}

/// Counts occurrences of a variant in the window.
fn usage_count(window: &[VariantUsage], variant_id: u32) -> u32 {
    let count = window.iter().filter(|usage| usage.variant_id == variant_id).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Returns the turn of the most recent use, when any.
fn last_seen_turn(window: &[VariantUsage], variant_id: u32) -> Option<u32> {
    window
        .iter()
        .rev()
        .find(|usage| usage.variant_id == variant_id)
        .map(|usage| usage.turn_index)
}

// ============================================================================
// SECTION: Window Validation
// ============================================================================

/// Rejects windows holding entries ahead of the session clock.
fn validate_window(
    window: &[VariantUsage],
    prior_turn_count: u32,
    key: &PoolKey,
) -> Result<(), StateError> {
    for usage in window {
        if usage.turn_index > prior_turn_count.saturating_add(1) {
            return Err(StateError::CorruptRotation {
                pool: *key,
            });
        }
    }
    Ok(())
}

/// Formats a pool key for error messages.
fn pool_location(key: &PoolKey) -> String {
    format!("{}/{}/{}", key.skeleton, key.language, key.section)
}
