// crates/desi-voice-core/src/core/contract.rs
// ============================================================================
// Module: Voice Contract Store
// Description: Frozen variant catalogue parsing, validation, and indexing.
// Purpose: Serve pre-approved sentence fragments as an immutable store.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The contract store loads the frozen voice contract document once at process
//! start and exposes it as an immutable indexed structure. Validation is
//! fail-closed: a document that violates any structural invariant never serves
//! a single variant. The store never serves partial contracts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identity::CONTRACT_VERSION;
use crate::core::skeleton::Language;
use crate::core::skeleton::Section;
use crate::core::skeleton::Skeleton;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Built-in contract document compiled into the binary.
const BUILTIN_CONTRACT_JSON: &str = include_str!("builtin_contract.json");

/// Advice tokens that must not appear in any pool outside skeleton D.
pub const ADVICE_TOKENS: [&str; 3] = ["should", "try", "best way"];

/// Maximum entries in an opener pool.
const MAX_OPENER_ENTRIES: usize = 3;
/// Maximum entries in a validation pool.
const MAX_VALIDATION_ENTRIES: usize = 4;

/// Guardrail override pools required under `A.en` so that every boundary
/// category can produce contract-backed text.
const REQUIRED_BOUNDARY_POOLS: [GuardrailCategory; 7] = [
    GuardrailCategory::Abuse,
    GuardrailCategory::Sexual,
    GuardrailCategory::Extremism,
    GuardrailCategory::Manipulation,
    GuardrailCategory::Jailbreak,
    GuardrailCategory::SystemProbe,
    GuardrailCategory::DataExtraction,
];

// ============================================================================
// SECTION: Variant Model
// ============================================================================

/// Closed tag vocabulary for contract variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantTag {
    /// Safe to emit while the family theme is latched.
    FamilySafe,
    /// Entry was added through catalogue expansion.
    AddedViaExpansion,
    /// Expansion entry explicitly approved for skeleton C.
    ExpansionApproved,
    /// Lighter register; filtered while escalation is latched.
    Light,
    /// Higher lexical activity; filtered under C after a quieter turn.
    HighActivity,
}

/// A single pre-approved fragment addressed by its stable index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantEntry {
    /// Stable zero-based index into the pool's ordered list.
    pub variant_id: u32,
    /// Approved fragment text.
    pub text: String,
    /// Tags constraining eligibility.
    pub tags: BTreeSet<VariantTag>,
}

impl VariantEntry {
    /// Returns true when the entry carries the tag.
    #[must_use]
    pub fn has_tag(&self, tag: VariantTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Addressing triple for one rotation pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    /// Skeleton the pool belongs to.
    pub skeleton: Skeleton,
    /// Language of the pool.
    pub language: Language,
    /// Section the pool fills.
    pub section: Section,
}

impl PoolKey {
    /// Creates a pool key.
    #[must_use]
    pub const fn new(skeleton: Skeleton, language: Language, section: Section) -> Self {
        Self {
            skeleton,
            language,
            section,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.skeleton, self.language, self.section)
    }
}

/// Guardrail override categories carried by the contract document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailCategory {
    /// Self-harm risk.
    SelfHarm,
    /// Abuse or harassment.
    Abuse,
    /// Explicit sexual content.
    Sexual,
    /// Extremist advocacy or operations.
    Extremism,
    /// Safety-boundary manipulation.
    Manipulation,
    /// Jailbreak attempt.
    Jailbreak,
    /// Internal-architecture probing.
    SystemProbe,
    /// Training-data or memory extraction.
    DataExtraction,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating the contract document.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Contract file could not be read.
    #[error("contract file unreadable: {0}")]
    Read(String),
    /// Contract document could not be parsed.
    #[error("contract parse failed: {0}")]
    Parse(String),
    /// Contract version does not match the engine's expected version.
    #[error("contract version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version the running engine requires.
        expected: String,
        /// Version declared by the document.
        found: String,
    },
    /// Contract document violates a structural invariant.
    #[error("contract invalid: {0}")]
    Validation(String),
}

// ============================================================================
// SECTION: Raw Document
// ============================================================================

/// Raw variant payload: bare string or tagged object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawVariant {
    /// Bare fragment text.
    Text(String),
    /// Fragment with eligibility tags.
    Tagged {
        /// Fragment text.
        text: String,
        /// Eligibility tags.
        #[serde(default)]
        tags: Vec<VariantTag>,
    },
}

impl RawVariant {
    /// Converts the raw payload into an indexed entry.
    fn into_entry(self, variant_id: u32) -> VariantEntry {
        match self {
            Self::Text(text) => VariantEntry {
                variant_id,
                text,
                tags: BTreeSet::new(),
            },
            Self::Tagged {
                text,
                tags,
            } => VariantEntry {
                variant_id,
                text,
                tags: tags.into_iter().collect(),
            },
        }
    }
}

/// Raw per-language block of the contract document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLanguageBlock {
    /// Opener pool.
    opener: Option<Vec<RawVariant>>,
    /// Validation pool.
    validation: Option<Vec<RawVariant>>,
    /// Closure pool.
    closure: Option<Vec<RawVariant>>,
    /// Action pool; legal only under D.
    action: Option<Vec<RawVariant>>,
    /// Guardrail override pools by category.
    guardrail: Option<BTreeMap<GuardrailCategory, Vec<RawVariant>>>,
}

/// Raw contract document as parsed from JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawContract {
    /// Version identifier of the document.
    contract_version: String,
    /// Skeleton blocks keyed by tag.
    skeletons: BTreeMap<Skeleton, BTreeMap<Language, RawLanguageBlock>>,
}

// ============================================================================
// SECTION: Contract Store
// ============================================================================

/// Immutable indexed view over the validated contract document.
#[derive(Debug, Clone)]
pub struct ContractStore {
    /// Declared contract version.
    version: String,
    /// Section pools keyed by (skeleton, language, section).
    pools: BTreeMap<PoolKey, Vec<VariantEntry>>,
    /// Guardrail override pools keyed by (skeleton, language, category).
    guardrail: BTreeMap<(Skeleton, Language, GuardrailCategory), Vec<VariantEntry>>,
}

/// Empty pool returned for absent keys.
const EMPTY_POOL: &[VariantEntry] = &[];

impl ContractStore {
    /// Loads the built-in contract compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the embedded document fails validation;
    /// this indicates a build defect and should fail the process.
    pub fn builtin() -> Result<Self, ContractError> {
        Self::from_json_str(BUILTIN_CONTRACT_JSON, CONTRACT_VERSION)
    }

    /// Loads and validates a contract document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the file is unreadable, unparsable, or
    /// fails validation.
    pub fn from_path(path: &Path, expected_version: &str) -> Result<Self, ContractError> {
        let raw = fs::read_to_string(path).map_err(|err| ContractError::Read(err.to_string()))?;
        Self::from_json_str(&raw, expected_version)
    }

    /// Parses and validates a contract document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when parsing or validation fails.
    pub fn from_json_str(json: &str, expected_version: &str) -> Result<Self, ContractError> {
        let raw: RawContract =
            serde_json::from_str(json).map_err(|err| ContractError::Parse(err.to_string()))?;
        Self::from_raw(raw, expected_version)
    }

    /// Returns the declared contract version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the ordered pool for the key, or an empty slice when absent.
    #[must_use]
    pub fn variants(&self, skeleton: Skeleton, language: Language, section: Section) -> &[VariantEntry] {
        self.pools
            .get(&PoolKey::new(skeleton, language, section))
            .map_or(EMPTY_POOL, Vec::as_slice)
    }

    /// Returns true when a non-empty pool exists for the key.
    #[must_use]
    pub fn has(&self, skeleton: Skeleton, language: Language, section: Section) -> bool {
        !self.variants(skeleton, language, section).is_empty()
    }

    /// Returns the guardrail override pool for the key, or an empty slice.
    #[must_use]
    pub fn guardrail_variants(
        &self,
        skeleton: Skeleton,
        language: Language,
        category: GuardrailCategory,
    ) -> &[VariantEntry] {
        self.guardrail
            .get(&(skeleton, language, category))
            .map_or(EMPTY_POOL, Vec::as_slice)
    }

    /// Indexes and validates a raw document.
    fn from_raw(raw: RawContract, expected_version: &str) -> Result<Self, ContractError> {
        if raw.contract_version != expected_version {
            return Err(ContractError::VersionMismatch {
                expected: expected_version.to_string(),
                found: raw.contract_version,
            });
        }

        let mut pools: BTreeMap<PoolKey, Vec<VariantEntry>> = BTreeMap::new();
        let mut guardrail: BTreeMap<(Skeleton, Language, GuardrailCategory), Vec<VariantEntry>> =
            BTreeMap::new();

        for (skeleton, languages) in raw.skeletons {
            for (language, block) in languages {
                index_language_block(skeleton, language, block, &mut pools, &mut guardrail)?;
            }
        }

        let store = Self {
            version: raw.contract_version,
            pools,
            guardrail,
        };
        store.validate()?;
        Ok(store)
    }

    /// Validates every structural invariant of the indexed contract.
    fn validate(&self) -> Result<(), ContractError> {
        for skeleton in Skeleton::ALL {
            self.validate_required_keys(skeleton)?;
        }
        for (key, pool) in &self.pools {
            validate_pool_shape(*key, pool)?;
            if key.skeleton != Skeleton::D {
                validate_no_advice_tokens(pool, &format!("{}/{}/{}", key.skeleton, key.language, key.section))?;
            }
        }
        for ((skeleton, language, category), pool) in &self.guardrail {
            if pool.is_empty() {
                return Err(ContractError::Validation(format!(
                    "guardrail pool {skeleton}/{language}/{category:?} is empty"
                )));
            }
            if *skeleton != Skeleton::D {
                validate_no_advice_tokens(
                    pool,
                    &format!("{skeleton}/{language}/guardrail"),
                )?;
            }
        }
        self.validate_required_guardrails()
    }

    /// Requires at least `(skeleton, en, opener)` and `(skeleton, en, closure)`.
    fn validate_required_keys(&self, skeleton: Skeleton) -> Result<(), ContractError> {
        if !self.has(skeleton, Language::En, Section::Opener) {
            return Err(ContractError::Validation(format!(
                "skeleton {skeleton} is missing the en opener pool"
            )));
        }
        if !self.has(skeleton, Language::En, Section::Closure) {
            return Err(ContractError::Validation(format!(
                "skeleton {skeleton} is missing the en closure pool"
            )));
        }
        Ok(())
    }

    /// Requires the guardrail pools every override strategy depends on.
    fn validate_required_guardrails(&self) -> Result<(), ContractError> {
        if self
            .guardrail_variants(Skeleton::C, Language::En, GuardrailCategory::SelfHarm)
            .is_empty()
        {
            return Err(ContractError::Validation(
                "skeleton C must carry en.guardrail.self_harm".to_string(),
            ));
        }
        for category in REQUIRED_BOUNDARY_POOLS {
            if self.guardrail_variants(Skeleton::A, Language::En, category).is_empty() {
                return Err(ContractError::Validation(format!(
                    "skeleton A must carry en.guardrail.{category:?} overrides"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Indexes one raw language block into the pool maps.
fn index_language_block(
    skeleton: Skeleton,
    language: Language,
    block: RawLanguageBlock,
    pools: &mut BTreeMap<PoolKey, Vec<VariantEntry>>,
    guardrail: &mut BTreeMap<(Skeleton, Language, GuardrailCategory), Vec<VariantEntry>>,
) -> Result<(), ContractError> {
    let sections = [
        (Section::Opener, block.opener),
        (Section::Validation, block.validation),
        (Section::Closure, block.closure),
        (Section::Action, block.action),
    ];
    for (section, raw_pool) in sections {
        let Some(raw_pool) = raw_pool else {
            continue;
        };
        let entries = index_pool(raw_pool, &format!("{skeleton}/{language}/{section}"))?;
        pools.insert(PoolKey::new(skeleton, language, section), entries);
    }
    if let Some(raw_guardrail) = block.guardrail {
        for (category, raw_pool) in raw_guardrail {
            let entries =
                index_pool(raw_pool, &format!("{skeleton}/{language}/guardrail"))?;
            guardrail.insert((skeleton, language, category), entries);
        }
    }
    Ok(())
}

/// Converts a raw pool into indexed entries, rejecting empty text.
fn index_pool(raw_pool: Vec<RawVariant>, location: &str) -> Result<Vec<VariantEntry>, ContractError> {
    let mut entries = Vec::with_capacity(raw_pool.len());
    for (index, raw) in raw_pool.into_iter().enumerate() {
        let variant_id = u32::try_from(index)
            .map_err(|_| ContractError::Validation(format!("pool {location} is too large")))?;
        let entry = raw.into_entry(variant_id);
        if entry.text.trim().is_empty() {
            return Err(ContractError::Validation(format!(
                "variant {variant_id} in {location} has empty text"
            )));
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Validates section legality, cardinality limits, and non-emptiness.
fn validate_pool_shape(key: PoolKey, pool: &[VariantEntry]) -> Result<(), ContractError> {
    let location = format!("{}/{}/{}", key.skeleton, key.language, key.section);
    if pool.is_empty() {
        return Err(ContractError::Validation(format!("pool {location} is empty")));
    }
    match key.section {
        Section::Action => {
            if key.skeleton != Skeleton::D {
                return Err(ContractError::Validation(format!(
                    "action entries are legal only under D, found {location}"
                )));
            }
        }
        Section::Validation => {
            if key.skeleton == Skeleton::D {
                return Err(ContractError::Validation(format!(
                    "validation is absent under D, found {location}"
                )));
            }
            if pool.len() > MAX_VALIDATION_ENTRIES {
                return Err(ContractError::Validation(format!(
                    "pool {location} exceeds {MAX_VALIDATION_ENTRIES} entries"
                )));
            }
        }
        Section::Opener => {
            if pool.len() > MAX_OPENER_ENTRIES {
                return Err(ContractError::Validation(format!(
                    "pool {location} exceeds {MAX_OPENER_ENTRIES} entries"
                )));
            }
            if key.skeleton == Skeleton::D && pool.len() != 1 {
                return Err(ContractError::Validation(format!(
                    "the D opener is fixed; pool {location} must hold exactly one entry"
                )));
            }
        }
        Section::Closure => {
            if key.skeleton.policy().single_closure && pool.len() != 1 {
                return Err(ContractError::Validation(format!(
                    "pool {location} must hold exactly one entry"
                )));
            }
        }
    }
    Ok(())
}

/// Rejects advice tokens in pools outside skeleton D.
fn validate_no_advice_tokens(pool: &[VariantEntry], location: &str) -> Result<(), ContractError> {
    for entry in pool {
        let lowered = entry.text.to_lowercase();
        for token in ADVICE_TOKENS {
            if lowered.contains(token) {
                return Err(ContractError::Validation(format!(
                    "advice token \"{token}\" in variant {} of {location}",
                    entry.variant_id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
