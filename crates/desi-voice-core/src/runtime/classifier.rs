// crates/desi-voice-core/src/runtime/classifier.rs
// ============================================================================
// Module: Intent Classifier
// Description: Rule-based intent, theme, signal, and risk classification.
// Purpose: Produce the single semantic reading of user text per turn.
// Dependencies: crate::core::{intent, skeleton}
// ============================================================================

//! ## Overview
//! Classification is a pure function of the raw prompt and the static lexicon
//! below. It touches no session state, no contract, and no rotation memory.
//! Risk anchors are checked before intent triggers; self-harm anchors push
//! severity to at least high.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::intent::EscalationSignal;
use crate::core::intent::Intent;
use crate::core::intent::IntentKind;
use crate::core::intent::SafetyCategory;
use crate::core::intent::Severity;
use crate::core::intent::TurnSignals;
use crate::core::skeleton::EmotionalTheme;
use crate::core::skeleton::Language;

// ============================================================================
// SECTION: Risk Lexicon
// ============================================================================

/// Explicit self-harm anchors; classified critical.
const SELF_HARM_EXPLICIT_PHRASES: [&str; 7] = [
    "kill myself",
    "suicide",
    "end my life",
    "end it all",
    "want to die",
    "don't want to live",
    "dont want to live",
];

/// Passive-despair anchors; classified high.
const SELF_HARM_PASSIVE_PHRASES: [&str; 5] = [
    "life is pointless",
    "life feels pointless",
    "nothing matters",
    "no point in living",
    "no point living",
];

/// Benign phrases that defuse an explicit-anchor match.
const NON_SELF_HARM_DIE_PHRASES: [&str; 2] = ["die laughing", "die of laughter"];

/// Jailbreak anchors.
const JAILBREAK_PHRASES: [&str; 5] = [
    "ignore previous instructions",
    "act as system prompt",
    "disregard rules",
    "you are now in developer mode",
    "bypass your safety",
];

/// Internal-architecture probe anchors.
const SYSTEM_PROBE_PHRASES: [&str; 5] = [
    "internal architecture",
    "system prompt",
    "hidden instructions",
    "how are you implemented",
    "your internal rules",
];

/// Data-extraction anchors.
const DATA_EXTRACTION_PHRASES: [&str; 4] = [
    "show your training data",
    "what data were you trained on",
    "export your memory",
    "dump your database",
];

/// Operational extremism anchors; classified critical.
const EXTREMISM_OPERATIONAL_PHRASES: [&str; 3] = [
    "how to join isis",
    "plan a terror attack",
    "carry out an attack for",
];

/// Advocacy extremism anchors; classified high.
const EXTREMISM_ADVOCACY_PHRASES: [&str; 3] = ["join isis", "support violent jihad", "support isis"];

/// Graphic sexual-content anchors; classified critical.
const SEXUAL_GRAPHIC_PHRASES: [&str; 2] = ["graphic sexual", "graphic porn"];

/// Explicit sexual-content anchors; classified high.
const SEXUAL_EXPLICIT_PHRASES: [&str; 4] =
    ["explicit sex", "describe sex", "pornographic", "sexual act"];

/// Abusive threat anchors; classified high.
const ABUSE_THREAT_PHRASES: [&str; 3] = ["i will kill you", "i will hurt you", "i'll kill you"];

/// Hostility anchors; classified medium.
const ABUSE_HOSTILITY_PHRASES: [&str; 3] =
    ["you are an idiot", "you are stupid", "you are worthless"];

/// Boundary-manipulation anchors; classified medium.
const MANIPULATION_PHRASES: [&str; 5] = [
    "pretend you're allowed",
    "pretend you are allowed",
    "hypothetically ignore rules",
    "just between us",
    "this is just a test",
];

// ============================================================================
// SECTION: Intent Lexicon
// ============================================================================

/// Emotional triggers.
const EMOTIONAL_TRIGGERS: [&str; 16] = [
    "feeling",
    "feel",
    "stress",
    "sad",
    "lonely",
    "anxious",
    "tired",
    "heavy",
    "breakup",
    "depressed",
    "overwhelmed",
    "exhausted",
    "drained",
    "hopeless",
    "pareshan",
    "udaas",
];

/// Explanation triggers.
const EXPLANATORY_TRIGGERS: [&str; 9] = [
    "explain",
    "samjhao",
    "samjha",
    "kaise",
    "kyon",
    "why",
    "how",
    "meaning",
    "difference between",
];

/// Factual triggers.
const FACTUAL_TRIGGERS: [&str; 8] = [
    "who is",
    "what is",
    "when did",
    "capital of",
    "प्रधानमंत्री",
    "राजधानी",
    "कौन है",
    "क्या है",
];

/// Family-theme markers.
const FAMILY_THEME_PHRASES: [&str; 11] = [
    "my family",
    "my parents",
    "my mother",
    "my father",
    "my mom",
    "my dad",
    "in-laws",
    "meri family",
    "mere parents",
    "ghar waale",
    "परिवार",
];

/// Resignation and futility markers.
const RESIGNATION_PHRASES: [&str; 7] = [
    "what's the point",
    "whats the point",
    "nothing will change",
    "no use anymore",
    "i give up",
    "kya faida",
    "कोई फायदा नहीं",
];

/// Overwhelm markers.
const OVERWHELM_PHRASES: [&str; 6] = [
    "overwhelmed",
    "too much",
    "can't keep up",
    "cant keep up",
    "drowning in",
    "bahut zyada ho gaya",
];

/// Guilt markers.
const GUILT_PHRASES: [&str; 5] =
    ["my fault", "i ruined", "i let everyone down", "guilty", "meri galti"];

/// Micro-action request markers.
const WANTS_ACTION_PHRASES: [&str; 5] = [
    "what can i do",
    "one small thing",
    "small step",
    "help me start",
    "kuch chhota batao",
];

/// Romanized markers that flag Hinglish prompts.
const HINGLISH_MARKERS: [&str; 10] =
    ["hai", "nahin", "nahi", "bahut", "kya", "yeh", "mein", "mujhe", "bhaari", "thak"];

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Lowercases and collapses whitespace for phrase matching.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true when any phrase occurs in the normalized text.
fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase))
}

// ============================================================================
// SECTION: Language Detection
// ============================================================================

/// Detects the prompt language from script and romanized markers.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|ch| ('\u{0900}'..='\u{097f}').contains(&ch)) {
        return Language::Hi;
    }
    let normalized = normalize_text(text);
    let words: Vec<&str> = normalized.split(' ').collect();
    if HINGLISH_MARKERS.iter().any(|marker| words.contains(marker)) {
        return Language::Hinglish;
    }
    Language::En
}

// ============================================================================
// SECTION: Risk Classification
// ============================================================================

/// Classifies the safety category and severity, checked in fixed priority
/// order. Returns `(None, None)` when no anchor matches.
#[must_use]
pub fn classify_risk(normalized: &str) -> (SafetyCategory, Severity) {
    let explicit_self_harm = contains_any(normalized, &SELF_HARM_EXPLICIT_PHRASES);
    let benign_die_phrase = contains_any(normalized, &NON_SELF_HARM_DIE_PHRASES);
    if explicit_self_harm && !benign_die_phrase {
        return (SafetyCategory::SelfHarm, Severity::Critical);
    }
    if contains_any(normalized, &SELF_HARM_PASSIVE_PHRASES) {
        return (SafetyCategory::SelfHarm, Severity::High);
    }
    if contains_any(normalized, &JAILBREAK_PHRASES) {
        return (SafetyCategory::JailbreakAttempt, Severity::High);
    }
    if contains_any(normalized, &SYSTEM_PROBE_PHRASES) {
        return (SafetyCategory::SystemProbe, Severity::Medium);
    }
    if contains_any(normalized, &DATA_EXTRACTION_PHRASES) {
        return (SafetyCategory::DataExtractionAttempt, Severity::High);
    }
    if contains_any(normalized, &EXTREMISM_OPERATIONAL_PHRASES) {
        return (SafetyCategory::Extremism, Severity::Critical);
    }
    if contains_any(normalized, &EXTREMISM_ADVOCACY_PHRASES) {
        return (SafetyCategory::Extremism, Severity::High);
    }
    if contains_any(normalized, &SEXUAL_GRAPHIC_PHRASES) {
        return (SafetyCategory::SexualContent, Severity::Critical);
    }
    if contains_any(normalized, &SEXUAL_EXPLICIT_PHRASES) {
        return (SafetyCategory::SexualContent, Severity::High);
    }
    if contains_any(normalized, &ABUSE_THREAT_PHRASES) {
        return (SafetyCategory::AbuseHarassment, Severity::High);
    }
    if contains_any(normalized, &ABUSE_HOSTILITY_PHRASES) {
        return (SafetyCategory::AbuseHarassment, Severity::Medium);
    }
    if contains_any(normalized, &MANIPULATION_PHRASES) {
        return (SafetyCategory::ManipulationAttempt, Severity::Medium);
    }
    (SafetyCategory::None, Severity::None)
}

// ============================================================================
// SECTION: Intent Classification
// ============================================================================

/// Classifies one utterance into the full intent verdict.
#[must_use]
pub fn classify_intent(text: &str) -> Intent {
    let normalized = normalize_text(text);
    let detected_language = detect_language(text);
    let (safety_category, severity) = classify_risk(&normalized);

    let signals = TurnSignals {
        overwhelm: contains_any(&normalized, &OVERWHELM_PHRASES),
        resignation: contains_any(&normalized, &RESIGNATION_PHRASES),
        guilt: contains_any(&normalized, &GUILT_PHRASES),
        wants_action: contains_any(&normalized, &WANTS_ACTION_PHRASES),
    };

    let kind = classify_kind(&normalized, safety_category, &signals);

    let theme = if kind.is_emotional() {
        detect_theme(&normalized, &signals)
    } else {
        None
    };

    let escalation_signal = if kind.is_emotional() && signals.overwhelm {
        Some(EscalationSignal::Overwhelm)
    } else {
        None
    };

    Intent {
        kind,
        theme,
        escalation_signal,
        safety_category,
        severity,
        detected_language,
        signals,
    }
}

/// Resolves the intent kind, risk first, then lexicon triggers.
fn classify_kind(
    normalized: &str,
    safety_category: SafetyCategory,
    signals: &TurnSignals,
) -> IntentKind {
    match safety_category {
        SafetyCategory::SelfHarm => return IntentKind::Emotional,
        SafetyCategory::None => {}
        _ => return IntentKind::Refusal,
    }
    if signals.overwhelm || signals.resignation || signals.guilt {
        return IntentKind::Emotional;
    }
    if contains_any(normalized, &EMOTIONAL_TRIGGERS) {
        return IntentKind::Emotional;
    }
    if contains_any(normalized, &EXPLANATORY_TRIGGERS) {
        return IntentKind::Explanatory;
    }
    if contains_any(normalized, &FACTUAL_TRIGGERS) {
        return IntentKind::Factual;
    }
    IntentKind::Conversational
}

/// Detects the latched theme for an emotional turn.
fn detect_theme(normalized: &str, signals: &TurnSignals) -> Option<EmotionalTheme> {
    if contains_any(normalized, &FAMILY_THEME_PHRASES) {
        return Some(EmotionalTheme::Family);
    }
    if signals.resignation {
        return Some(EmotionalTheme::Resignation);
    }
    None
}

#[cfg(test)]
mod tests;
