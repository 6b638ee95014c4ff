// crates/desi-voice-core/src/core/intent.rs
// ============================================================================
// Module: Intent Model
// Description: Intent kinds, safety categories, severities, and turn signals.
// Purpose: Carry the classifier verdict through the pipeline as plain data.
// Dependencies: crate::core::skeleton, serde
// ============================================================================

//! ## Overview
//! The intent is the only semantic reading of user text the pipeline performs.
//! Downstream stages consume this snapshot and never re-read the prompt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::skeleton::EmotionalTheme;
use crate::core::skeleton::Language;

// ============================================================================
// SECTION: Intent Kind
// ============================================================================

/// Top-level classification of a user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Emotional support request; routed through the voice pipeline.
    Emotional,
    /// Factual question.
    Factual,
    /// Explanation request.
    Explanatory,
    /// General conversation.
    Conversational,
    /// Request the engine declines on safety grounds.
    Refusal,
}

impl IntentKind {
    /// Returns true when the turn runs the emotional voice path.
    #[must_use]
    pub const fn is_emotional(self) -> bool {
        matches!(self, Self::Emotional)
    }
}

// ============================================================================
// SECTION: Safety Classification
// ============================================================================

/// Safety-critical categories recognized by the risk classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCategory {
    /// No safety category matched.
    None,
    /// Self-harm risk.
    SelfHarm,
    /// Abuse or harassment directed at the engine.
    AbuseHarassment,
    /// Explicit sexual content.
    SexualContent,
    /// Extremist advocacy or operations.
    Extremism,
    /// Attempted manipulation of safety boundaries.
    ManipulationAttempt,
    /// Jailbreak attempt.
    JailbreakAttempt,
    /// Probe for internal architecture details.
    SystemProbe,
    /// Attempted extraction of training data or memory.
    DataExtractionAttempt,
}

/// Severity attached to a safety category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No severity; category is `none`.
    None,
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

// ============================================================================
// SECTION: Turn Signals
// ============================================================================

/// Boolean emotional signals extracted from the prompt lexicon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSignals {
    /// Overwhelm markers matched.
    pub overwhelm: bool,
    /// Resignation or futility markers matched.
    pub resignation: bool,
    /// Guilt markers matched.
    pub guilt: bool,
    /// The user asked for one small concrete step.
    pub wants_action: bool,
}

// ============================================================================
// SECTION: Intent
// ============================================================================

/// Escalation signal derived from the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationSignal {
    /// Overwhelm pushes the session up the ladder.
    Overwhelm,
}

/// Full classifier verdict for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    /// Top-level intent kind.
    pub kind: IntentKind,
    /// Detected emotional theme, when any.
    pub theme: Option<EmotionalTheme>,
    /// Escalation signal, when any.
    pub escalation_signal: Option<EscalationSignal>,
    /// Safety category; `None` when nothing matched.
    pub safety_category: SafetyCategory,
    /// Severity of the safety category.
    pub severity: Severity,
    /// Language detected from the prompt text.
    pub detected_language: Language,
    /// Raw emotional signals feeding the resolver.
    pub signals: TurnSignals,
}
