// crates/desi-voice-core/src/core/skeleton.rs
// ============================================================================
// Module: Skeleton Model
// Description: Emotional skeletons, languages, sections, and per-tag policy.
// Purpose: Provide the closed vocabulary the voice pipeline dispatches on.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Skeletons, languages, and sections are closed enumerations with stable wire
//! forms. Per-skeleton behavior (legal sections, rotation window size, scoring
//! adjustments) lives in the [`SkeletonPolicy`] table keyed by the skeleton
//! tag rather than in conditional chains spread across the pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Skeleton
// ============================================================================

/// Emotional response skeleton governing tone and permitted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skeleton {
    /// Gentle acknowledgment.
    A,
    /// Grounded presence.
    B,
    /// Shared stillness (safety-critical).
    C,
    /// Micro-action; the only skeleton permitted to emit directive content.
    D,
}

impl Skeleton {
    /// All skeletons in tag order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Returns the stable string form of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Returns the escalation-ladder rank (A < B < C); D sits outside the
    /// ladder and ranks with A.
    #[must_use]
    pub const fn ladder_rank(self) -> u8 {
        match self {
            Self::A | Self::D => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    /// Returns the behavior table entry for this skeleton.
    #[must_use]
    pub const fn policy(self) -> &'static SkeletonPolicy {
        match self {
            Self::A => &POLICY_A,
            Self::B => &POLICY_B,
            Self::C => &POLICY_C,
            Self::D => &POLICY_D,
        }
    }
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Language
// ============================================================================

/// Languages the contract carries variants for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// English.
    En,
    /// Romanized Hindi-English blend; internal callers only.
    Hinglish,
    /// Hindi.
    Hi,
}

impl Language {
    /// All languages in tag order.
    pub const ALL: [Self; 3] = [Self::En, Self::Hinglish, Self::Hi];

    /// Returns the stable string form of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hinglish => "hinglish",
            Self::Hi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Section
// ============================================================================

/// Named slot of a skeleton filled by exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Opening acknowledgment.
    Opener,
    /// Validation of the feeling; absent under D.
    Validation,
    /// Closing line; always present.
    Closure,
    /// Directive content; legal only under D.
    Action,
}

impl Section {
    /// Returns the stable string form of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opener => "opener",
            Self::Validation => "validation",
            Self::Closure => "closure",
            Self::Action => "action",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Escalation State
// ============================================================================

/// Session escalation state for the A -> B -> C ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    /// No escalation in progress.
    None,
    /// Skeleton has moved up the ladder this session.
    Escalating,
    /// Escalation is latched; lighter variants are filtered out.
    Latched,
}

// ============================================================================
// SECTION: Emotional Theme
// ============================================================================

/// Sticky contextual theme constraining skeleton choice and eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTheme {
    /// Family strain; forces skeleton B or C, never A or D.
    Family,
    /// Resignation or futility; forces skeleton C and latches escalation.
    Resignation,
    /// Recognized but unconstrained theme.
    Other,
}

// ============================================================================
// SECTION: Skeleton Policy
// ============================================================================

/// Per-skeleton behavior table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonPolicy {
    /// Sections assembled for this skeleton, in emission order.
    pub sections: &'static [Section],
    /// Rotation window size for every pool of this skeleton.
    pub window_size: usize,
    /// Closure pool must hold exactly one entry.
    pub single_closure: bool,
    /// Skip usage scoring on the first emotional turn of the session.
    pub skip_scoring_on_first_turn: bool,
    /// Halve all scoring penalty magnitudes, flooring toward zero.
    pub halve_penalties: bool,
    /// Overuse penalty threshold as a percentage of window entries.
    pub overuse_percent: u32,
    /// Allow immediate repetition when filtering would empty the pool.
    pub allow_repeat_when_exhausted: bool,
    /// Drop expansion entries unless they are explicitly approved.
    pub drop_unapproved_expansion: bool,
}

/// Section order for skeletons A, B, and C.
const STANDARD_SECTIONS: [Section; 3] = [Section::Opener, Section::Validation, Section::Closure];
/// Section order for skeleton D.
const ACTION_SECTIONS: [Section; 3] = [Section::Opener, Section::Action, Section::Closure];

/// Policy for skeleton A.
const POLICY_A: SkeletonPolicy = SkeletonPolicy {
    sections: &STANDARD_SECTIONS,
    window_size: 6,
    single_closure: true,
    skip_scoring_on_first_turn: true,
    halve_penalties: false,
    overuse_percent: 50,
    allow_repeat_when_exhausted: false,
    drop_unapproved_expansion: false,
};

/// Policy for skeleton B.
const POLICY_B: SkeletonPolicy = SkeletonPolicy {
    sections: &STANDARD_SECTIONS,
    window_size: 8,
    single_closure: false,
    skip_scoring_on_first_turn: false,
    halve_penalties: false,
    overuse_percent: 50,
    allow_repeat_when_exhausted: false,
    drop_unapproved_expansion: false,
};

/// Policy for skeleton C.
const POLICY_C: SkeletonPolicy = SkeletonPolicy {
    sections: &STANDARD_SECTIONS,
    window_size: 3,
    single_closure: true,
    skip_scoring_on_first_turn: false,
    halve_penalties: true,
    overuse_percent: 80,
    allow_repeat_when_exhausted: true,
    drop_unapproved_expansion: true,
};

/// Policy for skeleton D.
const POLICY_D: SkeletonPolicy = SkeletonPolicy {
    sections: &ACTION_SECTIONS,
    window_size: 4,
    single_closure: true,
    skip_scoring_on_first_turn: false,
    halve_penalties: false,
    overuse_percent: 50,
    allow_repeat_when_exhausted: false,
    drop_unapproved_expansion: false,
};
