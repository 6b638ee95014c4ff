// crates/desi-voice-server/src/model.rs
// ============================================================================
// Module: Scaffold Model Backend
// Description: Deterministic generative-model stand-in for non-emotional turns.
// Purpose: Keep non-emotional responses byte-stable without a model runtime.
// Dependencies: desi-voice-core
// ============================================================================

//! ## Overview
//! The scaffold backend answers non-emotional turns with fixed per-intent,
//! per-language strings. It refuses emotional turns outright: the emotional
//! path must never reach the model seam, and a violation should surface as a
//! loud failure rather than silent text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use desi_voice_core::GenerativeModel;
use desi_voice_core::IntentKind;
use desi_voice_core::Language;
use desi_voice_core::ModelError;

// ============================================================================
// SECTION: Scaffold Model
// ============================================================================

/// Deterministic scaffold backend.
#[derive(Debug, Default)]
pub struct ScaffoldModel;

impl ScaffoldModel {
    /// Creates the scaffold backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl GenerativeModel for ScaffoldModel {
    fn generate(
        &self,
        _prompt: &str,
        kind: IntentKind,
        language: Language,
    ) -> Result<String, ModelError> {
        let text = match kind {
            IntentKind::Emotional => {
                return Err(ModelError::Generation(
                    "emotional turns never reach the model backend".to_string(),
                ));
            }
            IntentKind::Factual => factual_scaffold(language),
            IntentKind::Explanatory => explanatory_scaffold(language),
            IntentKind::Conversational => conversational_scaffold(language),
            IntentKind::Refusal => refusal_scaffold(language),
        };
        Ok(text.to_string())
    }
}

// ============================================================================
// SECTION: Scaffold Tables
// ============================================================================

/// Factual scaffold per language.
const fn factual_scaffold(language: Language) -> &'static str {
    match language {
        Language::En => "Here's a clear and factual answer.",
        Language::Hinglish => "Yeh ek seedha aur tathyatmak jawab hai.",
        Language::Hi => "यह एक संक्षिप्त और तथ्यात्मक उत्तर है।",
    }
}

/// Explanatory scaffold per language.
const fn explanatory_scaffold(language: Language) -> &'static str {
    match language {
        Language::En => "Let me explain this simply.",
        Language::Hinglish => "Ise aasaan shabdon mein samajhte hain.",
        Language::Hi => "इसे सरल शब्दों में समझते हैं।",
    }
}

/// Conversational scaffold per language.
const fn conversational_scaffold(language: Language) -> &'static str {
    match language {
        Language::En => "Here's what I think.",
        Language::Hinglish => "Mere hisaab se yeh kehna theek hoga.",
        Language::Hi => "मेरे हिसाब से यह कहना ठीक होगा।",
    }
}

/// Refusal scaffold per language.
const fn refusal_scaffold(language: Language) -> &'static str {
    match language {
        Language::En => "I can't help with that, but I'm here for anything else.",
        Language::Hinglish => "Main is mein madad nahin kar sakta, lekin baaki ke liye yahaan hoon.",
        Language::Hi => "मैं इसमें मदद नहीं कर सकता, लेकिन बाकी चीज़ों के लिए यहाँ हूँ।",
    }
}
