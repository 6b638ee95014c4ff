// crates/desi-voice-core/src/runtime/mod.rs
// ============================================================================
// Module: Voice Runtime
// Description: Pipeline stages and the closed internal error taxonomy.
// Purpose: Group the deterministic turn path behind a single entry point.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The runtime is a strict DAG: classifier, resolver, selector, assembler,
//! guardrail, fallback, all orchestrated by the engine. The taxonomy below is
//! closed; every internal failure is one of four kinds, each with a fixed
//! fallback route.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assembler;
pub mod classifier;
pub mod engine;
pub mod fallback;
pub mod guardrail;
pub mod resolver;
pub mod selector;
pub mod store;

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::contract::ContractError;
use crate::core::state::StateError;
use crate::runtime::assembler::AssemblyError;
use crate::runtime::selector::SelectError;
use crate::runtime::selector::SelectionError;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Closed internal error taxonomy of the voice pipeline.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// Contract missing, unparsable, or structurally invalid.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// Selection produced no usable candidate or an invalid reference.
    #[error(transparent)]
    Selection(#[from] SelectionError),
    /// Session state corrupt or transition illegal.
    #[error(transparent)]
    State(#[from] StateError),
    /// Assembly produced no usable text.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl From<SelectError> for VoiceError {
    fn from(error: SelectError) -> Self {
        match error {
            SelectError::Selection(inner) => Self::Selection(inner),
            SelectError::State(inner) => Self::State(inner),
        }
    }
}
