// crates/desi-voice-core/src/core/identity.rs
// ============================================================================
// Module: Engine Identity
// Description: Frozen identity constants for the running engine.
// Purpose: Pin the name, version, release stage, and contract version.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Identity values are compile-time constants. The `/version` surface and the
//! contract-version lock both read from here, so a release changes them in
//! exactly one place.

/// Engine name reported by the version surface.
pub const ENGINE_NAME: &str = "indian-desi-llm-inference-core";
/// Engine version reported by the version surface.
pub const ENGINE_VERSION: &str = "1.0.0";
/// Release stage reported by the version surface.
pub const ENGINE_RELEASE_STAGE: &str = "B20";
/// Contract version the running engine requires at load.
pub const CONTRACT_VERSION: &str = "1.0.0";
/// Guardrail classifier schema version recorded in traces.
pub const GUARDRAIL_SCHEMA_VERSION: &str = "14.1";
/// Guardrail strategy version recorded in traces.
pub const GUARDRAIL_STRATEGY_VERSION: &str = "14.2";
