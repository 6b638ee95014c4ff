// crates/desi-voice-core/src/runtime/guardrail.rs
// ============================================================================
// Module: Guardrail Engine
// Description: Deterministic, contract-backed safety overrides.
// Purpose: Escalate skeletons and replace text for safety-critical categories.
// Dependencies: crate::core::{contract, intent, skeleton}
// ============================================================================

//! ## Overview
//! The guardrail engine is evaluated after assembly. Escalation is a pure
//! mapping from category and severity to a skeleton; overrides replace the
//! response with the first entry of the contract's guardrail pool for the
//! category. Overrides never introduce strings absent from the contract or
//! the absolute fallback set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::contract::ContractStore;
use crate::core::contract::GuardrailCategory;
use crate::core::intent::SafetyCategory;
use crate::core::intent::Severity;
use crate::core::skeleton::Language;
use crate::core::skeleton::Skeleton;
use crate::runtime::fallback::absolute_fallback;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Guardrail verdict for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailDecision {
    /// Classified safety category.
    pub category: SafetyCategory,
    /// Severity of the category.
    pub severity: Severity,
    /// Replacement text when the strategy overrides the response.
    pub override_text: Option<String>,
}

impl GuardrailDecision {
    /// Returns true when the response text is replaced.
    #[must_use]
    pub fn overrides(&self) -> bool {
        self.override_text.is_some()
    }
}

// ============================================================================
// SECTION: Escalation Mapping
// ============================================================================

/// Categories that force skeleton A regardless of severity.
const FORCE_A_CATEGORIES: [SafetyCategory; 5] = [
    SafetyCategory::AbuseHarassment,
    SafetyCategory::Extremism,
    SafetyCategory::SystemProbe,
    SafetyCategory::DataExtractionAttempt,
    SafetyCategory::JailbreakAttempt,
];

/// Deterministic, side-effect-free skeleton escalation mapping.
#[must_use]
pub fn escalate_skeleton(
    category: SafetyCategory,
    severity: Severity,
    current: Skeleton,
) -> Skeleton {
    match category {
        SafetyCategory::None | SafetyCategory::SexualContent => current,
        SafetyCategory::SelfHarm => Skeleton::C,
        SafetyCategory::ManipulationAttempt => {
            if severity >= Severity::High {
                Skeleton::A
            } else {
                current
            }
        }
        _ if FORCE_A_CATEGORIES.contains(&category) => Skeleton::A,
        _ => current,
    }
}

// ============================================================================
// SECTION: Override Strategy
// ============================================================================

/// Minimum severity at which each category replaces the response text.
fn override_threshold(category: SafetyCategory) -> Option<Severity> {
    match category {
        SafetyCategory::None => None,
        SafetyCategory::SelfHarm
        | SafetyCategory::Extremism
        | SafetyCategory::ManipulationAttempt
        | SafetyCategory::DataExtractionAttempt => Some(Severity::High),
        SafetyCategory::AbuseHarassment
        | SafetyCategory::SexualContent
        | SafetyCategory::SystemProbe => Some(Severity::Medium),
        SafetyCategory::JailbreakAttempt => Some(Severity::Low),
    }
}

/// Contract guardrail pool addressing for a safety category.
fn contract_category(category: SafetyCategory) -> Option<(Skeleton, GuardrailCategory)> {
    match category {
        SafetyCategory::None => None,
        SafetyCategory::SelfHarm => Some((Skeleton::C, GuardrailCategory::SelfHarm)),
        SafetyCategory::AbuseHarassment => Some((Skeleton::A, GuardrailCategory::Abuse)),
        SafetyCategory::SexualContent => Some((Skeleton::A, GuardrailCategory::Sexual)),
        SafetyCategory::Extremism => Some((Skeleton::A, GuardrailCategory::Extremism)),
        SafetyCategory::ManipulationAttempt => Some((Skeleton::A, GuardrailCategory::Manipulation)),
        SafetyCategory::JailbreakAttempt => Some((Skeleton::A, GuardrailCategory::Jailbreak)),
        SafetyCategory::SystemProbe => Some((Skeleton::A, GuardrailCategory::SystemProbe)),
        SafetyCategory::DataExtractionAttempt => {
            Some((Skeleton::A, GuardrailCategory::DataExtraction))
        }
    }
}

/// Evaluates the override strategy for one turn.
///
/// The replacement is always `variants[0]` of the guardrail pool for the
/// requested language, falling back to the English pool, then to the absolute
/// string of the pool's skeleton.
#[must_use]
pub fn evaluate_guardrail(
    contract: Option<&ContractStore>,
    category: SafetyCategory,
    severity: Severity,
    language: Language,
) -> GuardrailDecision {
    let override_text = override_threshold(category)
        .filter(|threshold| severity >= *threshold)
        .and_then(|_| contract_category(category))
        .map(|(skeleton, pool_category)| {
            override_text_for(contract, skeleton, pool_category, language)
        });

    GuardrailDecision {
        category,
        severity,
        override_text,
    }
}

/// Looks up the override text, first element wins.
fn override_text_for(
    contract: Option<&ContractStore>,
    skeleton: Skeleton,
    category: GuardrailCategory,
    language: Language,
) -> String {
    if let Some(contract) = contract {
        let pool = contract.guardrail_variants(skeleton, language, category);
        if let Some(entry) = pool.first() {
            return entry.text.clone();
        }
        let english = contract.guardrail_variants(skeleton, Language::En, category);
        if let Some(entry) = english.first() {
            return entry.text.clone();
        }
    }
    absolute_fallback(skeleton).to_string()
}
