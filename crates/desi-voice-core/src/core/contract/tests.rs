// crates/desi-voice-core/src/core/contract/tests.rs
// ============================================================================
// Module: Contract Store Unit Tests
// Description: Unit coverage for contract load validation.
// Purpose: Ensure the store fails closed on every structural violation.
// Dependencies: desi-voice-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises the load-time invariants: version lock, cardinality limits,
//! section legality, advice-token scanning, and required guardrail pools.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::core::contract::ContractError;
use crate::core::contract::ContractStore;
use crate::core::contract::GuardrailCategory;
use crate::core::skeleton::Language;
use crate::core::skeleton::Section;
use crate::core::skeleton::Skeleton;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Minimal document passing every load-time invariant.
fn minimal_document() -> Value {
    json!({
        "contract_version": "1.0.0",
        "skeletons": {
            "A": {
                "en": {
                    "opener": ["a opener zero", "a opener one"],
                    "validation": ["a validation zero", "a validation one"],
                    "closure": ["a closure"],
                    "guardrail": {
                        "abuse": ["a boundary line"],
                        "sexual": ["a boundary line"],
                        "extremism": ["a boundary line"],
                        "manipulation": ["a boundary line"],
                        "jailbreak": ["a boundary line"],
                        "system_probe": ["a boundary line"],
                        "data_extraction": ["a boundary line"]
                    }
                }
            },
            "B": {
                "en": {
                    "opener": ["b opener zero", "b opener one"],
                    "validation": ["b validation zero", "b validation one"],
                    "closure": ["b closure zero", "b closure one"]
                }
            },
            "C": {
                "en": {
                    "opener": ["c opener zero", "c opener one"],
                    "validation": ["c validation zero", "c validation one"],
                    "closure": ["c closure"],
                    "guardrail": { "self_harm": ["c safe line"] }
                }
            },
            "D": {
                "en": {
                    "opener": ["d opener"],
                    "action": ["d action zero", "d action one"],
                    "closure": ["d closure"]
                }
            }
        }
    })
}

/// Loads a document value with the default expected version.
fn load(document: &Value) -> Result<ContractStore, ContractError> {
    ContractStore::from_json_str(&document.to_string(), "1.0.0")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn builtin_contract_loads() -> Result<(), Box<dyn std::error::Error>> {
    let store = ContractStore::builtin()?;
    assert_eq!(store.version(), "1.0.0");
    assert!(store.has(Skeleton::A, Language::En, Section::Opener));
    assert!(store.has(Skeleton::D, Language::Hi, Section::Action));
    Ok(())
}

#[test]
fn minimal_document_loads() -> Result<(), Box<dyn std::error::Error>> {
    let store = load(&minimal_document())?;
    assert_eq!(store.variants(Skeleton::A, Language::En, Section::Opener).len(), 2);
    assert!(store.variants(Skeleton::A, Language::Hi, Section::Opener).is_empty());
    assert!(!store.has(Skeleton::A, Language::Hi, Section::Opener));
    Ok(())
}

#[test]
fn version_mismatch_is_a_hard_failure() {
    let err = ContractStore::from_json_str(&minimal_document().to_string(), "2.0.0").unwrap_err();
    assert!(matches!(err, ContractError::VersionMismatch { .. }));
}

#[test]
fn advice_token_outside_d_is_rejected() {
    let mut document = minimal_document();
    document["skeletons"]["A"]["en"]["validation"][0] = json!("you should rest");
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn advice_token_inside_d_is_allowed() -> Result<(), Box<dyn std::error::Error>> {
    let mut document = minimal_document();
    document["skeletons"]["D"]["en"]["action"][0] = json!("try one sip of water");
    load(&document)?;
    Ok(())
}

#[test]
fn action_pool_outside_d_is_rejected() {
    let mut document = minimal_document();
    document["skeletons"]["B"]["en"]["action"] = json!(["stand up"]);
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn validation_pool_under_d_is_rejected() {
    let mut document = minimal_document();
    document["skeletons"]["D"]["en"]["validation"] = json!(["that makes sense"]);
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn single_closure_cardinality_is_enforced() {
    let mut document = minimal_document();
    document["skeletons"]["A"]["en"]["closure"] = json!(["one", "two"]);
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn b_closure_may_hold_two_entries() -> Result<(), Box<dyn std::error::Error>> {
    let store = load(&minimal_document())?;
    assert_eq!(store.variants(Skeleton::B, Language::En, Section::Closure).len(), 2);
    Ok(())
}

#[test]
fn opener_pool_is_capped_at_three() {
    let mut document = minimal_document();
    document["skeletons"]["A"]["en"]["opener"] = json!(["one", "two", "three", "four"]);
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn missing_en_closure_is_rejected() {
    let mut document = minimal_document();
    document["skeletons"]["B"]["en"]
        .as_object_mut()
        .expect("language block")
        .remove("closure");
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn missing_self_harm_guardrail_is_rejected() {
    let mut document = minimal_document();
    document["skeletons"]["C"]["en"]
        .as_object_mut()
        .expect("language block")
        .remove("guardrail");
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn unknown_tag_is_a_parse_failure() {
    let mut document = minimal_document();
    document["skeletons"]["A"]["en"]["opener"][0] =
        json!({ "text": "tagged", "tags": ["made_up_tag"] });
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Parse(_)));
}

#[test]
fn empty_variant_text_is_rejected() {
    let mut document = minimal_document();
    document["skeletons"]["A"]["en"]["opener"][0] = json!("   ");
    let err = load(&document).unwrap_err();
    assert!(matches!(err, ContractError::Validation(_)));
}

#[test]
fn contract_loads_from_a_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("voice_contract.json");
    std::fs::write(&path, minimal_document().to_string())?;
    let store = ContractStore::from_path(&path, "1.0.0")?;
    assert_eq!(store.version(), "1.0.0");
    Ok(())
}

#[test]
fn missing_contract_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    let err = ContractStore::from_path(&path, "1.0.0").unwrap_err();
    assert!(matches!(err, ContractError::Read(_)));
}

#[test]
fn guardrail_pool_lookup_is_indexed() -> Result<(), Box<dyn std::error::Error>> {
    let store = load(&minimal_document())?;
    let pool = store.guardrail_variants(Skeleton::C, Language::En, GuardrailCategory::SelfHarm);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].text, "c safe line");
    let absent = store.guardrail_variants(Skeleton::B, Language::En, GuardrailCategory::SelfHarm);
    assert!(absent.is_empty());
    Ok(())
}
