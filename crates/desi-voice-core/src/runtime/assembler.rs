// crates/desi-voice-core/src/runtime/assembler.rs
// ============================================================================
// Module: Response Assembler
// Description: Mechanical concatenation of selected section variants.
// Purpose: Produce the final response text in fixed per-skeleton order.
// Dependencies: crate::core::skeleton, crate::runtime::selector
// ============================================================================

//! ## Overview
//! Assembly joins the selected variants in the skeleton's fixed section order
//! with a single separating space. No rewriting, no punctuation insertion, no
//! reordering, no omission.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::skeleton::Section;
use crate::core::skeleton::Skeleton;
use crate::runtime::selector::SectionSelection;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised during response assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A required section has no selected variant.
    #[error("missing text for section {section}")]
    MissingSection {
        /// Section without a selection.
        section: Section,
    },
    /// The assembled response is empty.
    #[error("assembled response is empty")]
    EmptyResponse,
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Assembles the final response from the selected variants.
///
/// # Errors
///
/// Returns [`AssemblyError`] when a section is missing or the result is empty.
pub fn assemble_response(
    skeleton: Skeleton,
    sections: &BTreeMap<Section, SectionSelection>,
) -> Result<String, AssemblyError> {
    let mut parts = Vec::with_capacity(skeleton.policy().sections.len());
    for &section in skeleton.policy().sections {
        let selection = sections.get(&section).ok_or(AssemblyError::MissingSection {
            section,
        })?;
        parts.push(selection.text.as_str());
    }
    let response = parts.join(" ");
    if response.trim().is_empty() {
        return Err(AssemblyError::EmptyResponse);
    }
    Ok(response)
}
