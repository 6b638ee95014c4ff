// crates/desi-voice-core/src/lib.rs
// ============================================================================
// Module: Desi Voice Core Library
// Description: Public API surface for the deterministic voice pipeline.
// Purpose: Expose core types, interfaces, and the runtime engine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! `desi-voice-core` is the runtime core of the multilingual emotional
//! assistant: a deterministic path from classified intent to emitted response
//! text and trace, assembled only from a frozen catalogue of pre-approved
//! fragments. Identical inputs against identical session state produce
//! byte-identical output, traces, and replay hashes. The generative model is
//! reachable only through an explicit interface and never on the emotional
//! path.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::contract::ContractError;
pub use core::contract::ContractStore;
pub use core::contract::GuardrailCategory;
pub use core::contract::PoolKey;
pub use core::contract::VariantEntry;
pub use core::contract::VariantTag;
pub use core::hashing::HashError;
pub use core::hashing::ReplayHash;
pub use core::hashing::canonical_json_bytes;
pub use core::hashing::canonical_json_string;
pub use core::hashing::replay_hash;
pub use core::identity::CONTRACT_VERSION;
pub use core::identity::ENGINE_NAME;
pub use core::identity::ENGINE_RELEASE_STAGE;
pub use core::identity::ENGINE_VERSION;
pub use core::intent::Intent;
pub use core::intent::IntentKind;
pub use core::intent::SafetyCategory;
pub use core::intent::Severity;
pub use core::intent::TurnSignals;
pub use core::skeleton::EmotionalTheme;
pub use core::skeleton::EscalationState;
pub use core::skeleton::Language;
pub use core::skeleton::Section;
pub use core::skeleton::Skeleton;
pub use core::skeleton::SkeletonPolicy;
pub use core::state::RotationMemory;
pub use core::state::SessionId;
pub use core::state::SessionVoiceState;
pub use core::state::TurnStage;
pub use core::state::VariantUsage;
pub use core::tone::ToneProfile;
pub use core::tone::derive_tone;
pub use core::trace::DecisionTrace;
pub use core::trace::FallbackLevel;
pub use core::trace::FallbackMeta;
pub use core::trace::FallbackReason;
pub use core::trace::GuardrailActionKind;
pub use interfaces::GenerativeModel;
pub use interfaces::ModelError;
pub use interfaces::SessionStore;
pub use interfaces::SharedSessionState;
pub use interfaces::StoreError;
pub use runtime::VoiceError;
pub use runtime::classifier::classify_intent;
pub use runtime::classifier::detect_language;
pub use runtime::engine::PipelineError;
pub use runtime::engine::TurnRequest;
pub use runtime::engine::TurnResponse;
pub use runtime::engine::VoicePipeline;
pub use runtime::fallback::absolute_fallback;
pub use runtime::store::InMemorySessionStore;
