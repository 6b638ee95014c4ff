// crates/desi-voice-core/src/core/tone.rs
// ============================================================================
// Module: Tone Calibration
// Description: Tone profile vocabulary and its derivation table.
// Purpose: Derive the trace tone profile from skeleton, severity, and category.
// Dependencies: crate::core::{intent, skeleton}, serde
// ============================================================================

//! ## Overview
//! Tone profiles are a closed vocabulary derived by a fixed table from the
//! resolved skeleton, the safety severity, and the safety category. The
//! derivation has no runtime-variable source; identical inputs always produce
//! the identical profile. Skeleton D carries no tone profile.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::intent::SafetyCategory;
use crate::core::intent::Severity;
use crate::core::skeleton::Skeleton;

// ============================================================================
// SECTION: Tone Profile
// ============================================================================

/// Closed tone profile vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneProfile {
    /// Neutral, formal register.
    NeutralFormal,
    /// Warm and engaged.
    WarmEngaged,
    /// Soft empathy.
    EmpatheticSoft,
    /// High-intensity empathy.
    EmpatheticHighIntensity,
    /// Crisis-support empathy.
    EmpatheticCrisisSupport,
    /// Grounded calm.
    GroundedCalm,
    /// Grounded calm, strong form.
    GroundedCalmStrong,
    /// Firm boundary.
    FirmBoundary,
    /// Firm boundary, strict form.
    FirmBoundaryStrict,
    /// Measured neutral.
    MeasuredNeutral,
    /// Low-intensity support.
    SupportiveLowIntensity,
}

// ============================================================================
// SECTION: Derivation
// ============================================================================

/// Derives the tone profile for a turn, or `None` when the combination
/// carries no profile (skeleton D, or a severity outside the table).
#[must_use]
pub fn derive_tone(
    skeleton: Skeleton,
    severity: Severity,
    category: SafetyCategory,
) -> Option<ToneProfile> {
    match category {
        SafetyCategory::None => safe_tone(skeleton, severity),
        SafetyCategory::SelfHarm => Some(self_harm_tone(severity)),
        SafetyCategory::AbuseHarassment | SafetyCategory::ManipulationAttempt => {
            Some(grounded_tone(severity))
        }
        SafetyCategory::Extremism => Some(extremism_tone(severity)),
        SafetyCategory::JailbreakAttempt | SafetyCategory::DataExtractionAttempt => {
            Some(boundary_tone(severity))
        }
        SafetyCategory::SystemProbe => Some(ToneProfile::MeasuredNeutral),
        SafetyCategory::SexualContent => Some(boundary_tone(severity)),
    }
}

/// Tone for turns without a safety category.
fn safe_tone(skeleton: Skeleton, severity: Severity) -> Option<ToneProfile> {
    match (skeleton, severity) {
        (Skeleton::A, Severity::None | Severity::Low) => Some(ToneProfile::NeutralFormal),
        (Skeleton::A, Severity::Medium) => Some(ToneProfile::WarmEngaged),
        (Skeleton::B, _) => Some(ToneProfile::WarmEngaged),
        (Skeleton::C, _) => Some(ToneProfile::EmpatheticSoft),
        (Skeleton::A | Skeleton::D, _) => None,
    }
}

/// Tone ladder for self-harm severities.
fn self_harm_tone(severity: Severity) -> ToneProfile {
    match severity {
        Severity::None | Severity::Low | Severity::Medium => ToneProfile::EmpatheticSoft,
        Severity::High => ToneProfile::EmpatheticHighIntensity,
        Severity::Critical => ToneProfile::EmpatheticCrisisSupport,
    }
}

/// Tone ladder for abuse and manipulation.
fn grounded_tone(severity: Severity) -> ToneProfile {
    match severity {
        Severity::None | Severity::Low | Severity::Medium => ToneProfile::GroundedCalm,
        Severity::High | Severity::Critical => ToneProfile::GroundedCalmStrong,
    }
}

/// Tone ladder for extremism.
fn extremism_tone(severity: Severity) -> ToneProfile {
    match severity {
        Severity::None | Severity::Low | Severity::Medium => ToneProfile::MeasuredNeutral,
        Severity::High | Severity::Critical => ToneProfile::FirmBoundaryStrict,
    }
}

/// Tone ladder for jailbreak, data-extraction, and sexual-content boundaries.
fn boundary_tone(severity: Severity) -> ToneProfile {
    match severity {
        Severity::None | Severity::Low | Severity::Medium => ToneProfile::FirmBoundary,
        Severity::High | Severity::Critical => ToneProfile::FirmBoundaryStrict,
    }
}
