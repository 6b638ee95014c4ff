// crates/desi-voice-core/src/runtime/engine.rs
// ============================================================================
// Module: Voice Pipeline Engine
// Description: Single canonical execution path for one voice turn.
// Purpose: Orchestrate classify, resolve, select, assemble, guard, and trace.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The pipeline is the single entry point for turn execution; every API
//! surface must call into it to preserve determinism. A turn runs under the
//! session's exclusive lock, stages all state writes, and commits them as one
//! atomic step only when the turn succeeds. Abandoned or failed turns leave
//! the session untouched. The control flow is a strict DAG with no back
//! edges.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::contract::ContractStore;
use crate::core::hashing::HashError;
use crate::core::intent::Intent;
use crate::core::skeleton::Language;
use crate::core::skeleton::Skeleton;
use crate::core::state::PoolReset;
use crate::core::state::SessionId;
use crate::core::state::SessionVoiceState;
use crate::core::state::StateError;
use crate::core::state::TurnStage;
use crate::core::tone::derive_tone;
use crate::core::trace::DecisionTrace;
use crate::core::trace::FallbackLevel;
use crate::core::trace::FallbackMeta;
use crate::core::trace::FallbackReason;
use crate::core::trace::GuardrailActionKind;
use crate::core::trace::GuardrailTrace;
use crate::core::trace::SelectionTrace;
use crate::core::trace::SkeletonTrace;
use crate::core::trace::TurnTrace;
use crate::core::trace::build_decision_trace;
use crate::interfaces::GenerativeModel;
use crate::interfaces::ModelError;
use crate::interfaces::SessionStore;
use crate::interfaces::StoreError;
use crate::runtime::VoiceError;
use crate::runtime::assembler::assemble_response;
use crate::runtime::classifier::classify_intent;
use crate::runtime::fallback::absolute_fallback;
use crate::runtime::fallback::fallback_entry_level;
use crate::runtime::fallback::fallback_reason;
use crate::runtime::fallback::run_fallback;
use crate::runtime::guardrail::GuardrailDecision;
use crate::runtime::guardrail::escalate_skeleton;
use crate::runtime::guardrail::evaluate_guardrail;
use crate::runtime::resolver::Resolution;
use crate::runtime::resolver::resolve_skeleton;
use crate::runtime::resolver::validate_transition;
use crate::runtime::selector::SelectError;
use crate::runtime::selector::SelectionOutcome;
use crate::runtime::selector::TurnContext;
use crate::runtime::selector::select_variants;

// ============================================================================
// SECTION: Requests and Responses
// ============================================================================

/// One inbound turn for the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// Session the turn belongs to.
    pub session_id: &'a SessionId,
    /// Raw user prompt.
    pub prompt: &'a str,
    /// Requested emotional language; detected from the prompt when absent.
    pub emotional_lang: Option<Language>,
}

/// Pipeline output for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResponse {
    /// Final response text.
    pub response_text: String,
    /// Immutable decision trace with the replay hash.
    pub trace: DecisionTrace,
}

/// Errors the pipeline cannot resolve into a safe response.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Session registry failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Generative backend failure on a non-emotional turn.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Trace canonicalization failure.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// No safe output can be produced for this turn.
    #[error("no safe output available")]
    NoSafeOutput,
}

// ============================================================================
// SECTION: Voice Pipeline
// ============================================================================

/// Deterministic voice pipeline over a frozen contract.
pub struct VoicePipeline {
    /// Loaded contract store; `None` when the load failed at startup.
    contract: Option<Arc<ContractStore>>,
    /// Session registry.
    sessions: Arc<dyn SessionStore>,
    /// Generative backend for non-emotional turns.
    model: Arc<dyn GenerativeModel>,
}

impl VoicePipeline {
    /// Creates a pipeline. A missing contract keeps the pipeline serving
    /// absolute fallbacks rather than refusing to start.
    #[must_use]
    pub fn new(
        contract: Option<Arc<ContractStore>>,
        sessions: Arc<dyn SessionStore>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            contract,
            sessions,
            model,
        }
    }

    /// Returns the loaded contract, when any.
    #[must_use]
    pub fn contract(&self) -> Option<&ContractStore> {
        self.contract.as_deref()
    }

    /// Destroys a session's state when the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] when the registry is unusable.
    pub fn end_session(&self, session_id: &SessionId) -> Result<(), PipelineError> {
        self.sessions.end_session(session_id)?;
        Ok(())
    }

    /// Explicitly hard-resets a session: rotation memory cleared, emotional
    /// turn index zeroed, escalation and theme dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] when the registry is unusable.
    pub fn reset_session(&self, session_id: &SessionId) -> Result<(), PipelineError> {
        let handle = self.sessions.get_or_create(session_id)?;
        let mut guard = handle.lock().map_err(|_| StoreError::Poisoned)?;
        guard.reset();
        Ok(())
    }

    /// Executes one turn under the session's exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only when no safe response exists; internal
    /// failures resolve through the fallback hierarchy instead.
    pub fn run_turn(&self, request: &TurnRequest<'_>) -> Result<TurnResponse, PipelineError> {
        let intent = classify_intent(request.prompt);
        let handle = self.sessions.get_or_create(request.session_id)?;
        let mut guard = handle.lock().map_err(|_| StoreError::Poisoned)?;
        let state = &mut *guard;

        let resolution = resolve_skeleton(&intent, state, request.emotional_lang);
        let mut stage = TurnStage::new();
        if resolution.hard_reset {
            stage.stage_hard_reset();
        }
        for reset in &resolution.resets {
            stage.stage_reset(*reset);
        }

        match resolution.skeleton {
            Some(skeleton) => {
                self.run_voice_turn(request, &intent, &resolution, skeleton, stage, state)
            }
            None => self.run_model_turn(request, &intent, &resolution, stage, state),
        }
    }

    // ------------------------------------------------------------------
    // Emotional path
    // ------------------------------------------------------------------

    /// Runs the emotional voice path for a resolved skeleton.
    fn run_voice_turn(
        &self,
        request: &TurnRequest<'_>,
        intent: &Intent,
        resolution: &Resolution,
        skeleton: Skeleton,
        mut stage: TurnStage,
        state: &mut SessionVoiceState,
    ) -> Result<TurnResponse, PipelineError> {
        let language = resolution.language;
        let after_guardrail =
            escalate_skeleton(intent.safety_category, intent.severity, skeleton);
        let decision = evaluate_guardrail(
            self.contract(),
            intent.safety_category,
            intent.severity,
            language,
        );

        let Some(contract) = self.contract() else {
            return self.degraded_turn(request, intent, resolution, after_guardrail, &decision, state);
        };

        let ctx = TurnContext {
            skeleton: after_guardrail,
            language,
            escalation_state: resolution.escalation_state,
            latched_theme: resolution.latched_theme,
            emotional_turn_index: resolution.prior_turn_count,
        };

        let attempt = match validate_transition(resolution.previous_skeleton, after_guardrail) {
            Ok(()) => select_with_retry(contract, &ctx, state, &mut stage),
            Err(err) => SelectAttempt::Failed(VoiceError::State(err)),
        };

        let mut meta: Option<FallbackMeta> = None;
        let (assembled, selection_trace, commits) = match attempt {
            SelectAttempt::Selected(outcome) => {
                match assemble_response(after_guardrail, &outcome.sections) {
                    Ok(text) => {
                        if outcome.exhausted {
                            meta = Some(FallbackMeta {
                                fallback_reason: FallbackReason::SelectionExhausted,
                                fallback_level: FallbackLevel::SkeletonLocal,
                            });
                        }
                        let trace = SelectionTrace::from_sections(
                            outcome.eligible_count,
                            &outcome.variant_ids(),
                        );
                        (text, trace, true)
                    }
                    Err(err) => {
                        let error = VoiceError::Assembly(err);
                        let fallback = run_fallback(
                            Some(contract),
                            after_guardrail,
                            language,
                            fallback_entry_level(&error),
                            resolution.prior_turn_count,
                            &mut stage,
                        );
                        meta = Some(FallbackMeta {
                            fallback_reason: fallback_reason(&error),
                            fallback_level: fallback.level,
                        });
                        let trace = SelectionTrace::from_sections(0, &fallback.sections);
                        (fallback.text, trace, fallback.commits)
                    }
                }
            }
            SelectAttempt::Failed(error) => {
                let fallback = run_fallback(
                    Some(contract),
                    after_guardrail,
                    language,
                    fallback_entry_level(&error),
                    resolution.prior_turn_count,
                    &mut stage,
                );
                meta = Some(FallbackMeta {
                    fallback_reason: fallback_reason(&error),
                    fallback_level: fallback.level,
                });
                let trace = SelectionTrace::from_sections(0, &fallback.sections);
                (fallback.text, trace, fallback.commits)
            }
        };

        let action = if decision.overrides() {
            GuardrailActionKind::Override
        } else {
            GuardrailActionKind::None
        };
        let response_text = decision.override_text.clone().unwrap_or(assembled);
        let tone_profile = if decision.overrides() {
            None
        } else {
            derive_tone(after_guardrail, intent.severity, intent.safety_category)
        };

        let turn_index_after = if commits {
            resolution.prior_turn_count.saturating_add(1)
        } else {
            state.emotional_turn_index
        };
        if commits {
            stage.stage_turn_fields(
                resolution.escalation_state,
                resolution.latched_theme,
                Some(after_guardrail),
                language,
                resolution.calm_streak,
            );
            stage.commit(state);
        }

        let turn = TurnTrace {
            emotional_turn_index: turn_index_after,
            intent: intent.kind,
            emotional_lang: language,
            previous_skeleton: resolution.previous_skeleton,
            resolved_skeleton: Some(skeleton),
            skeleton_transition: Some(format!(
                "{}->{}",
                resolution.previous_skeleton.unwrap_or(skeleton),
                after_guardrail
            )),
            escalation_state: resolution.escalation_state,
            latched_theme: resolution.latched_theme,
            signals: intent.signals,
        };
        let trace = build_decision_trace(
            request.prompt,
            turn,
            GuardrailTrace::new(intent.safety_category, intent.severity, action),
            SkeletonTrace {
                base: Some(skeleton),
                after_guardrail: Some(after_guardrail),
            },
            tone_profile,
            selection_trace,
            meta,
        )?;
        Ok(TurnResponse {
            response_text,
            trace,
        })
    }

    /// Emotional turn with the contract unavailable: absolute output, no
    /// state writes.
    fn degraded_turn(
        &self,
        request: &TurnRequest<'_>,
        intent: &Intent,
        resolution: &Resolution,
        after_guardrail: Skeleton,
        decision: &GuardrailDecision,
        state: &SessionVoiceState,
    ) -> Result<TurnResponse, PipelineError> {
        let action = if decision.overrides() {
            GuardrailActionKind::Override
        } else {
            GuardrailActionKind::None
        };
        let response_text = decision
            .override_text
            .clone()
            .unwrap_or_else(|| absolute_fallback(after_guardrail).to_string());
        let tone_profile = if decision.overrides() {
            None
        } else {
            derive_tone(after_guardrail, intent.severity, intent.safety_category)
        };

        let turn = TurnTrace {
            emotional_turn_index: state.emotional_turn_index,
            intent: intent.kind,
            emotional_lang: resolution.language,
            previous_skeleton: resolution.previous_skeleton,
            resolved_skeleton: resolution.skeleton,
            skeleton_transition: Some(format!(
                "{}->{}",
                resolution.previous_skeleton.or(resolution.skeleton).unwrap_or(after_guardrail),
                after_guardrail
            )),
            escalation_state: resolution.escalation_state,
            latched_theme: resolution.latched_theme,
            signals: intent.signals,
        };
        let trace = build_decision_trace(
            request.prompt,
            turn,
            GuardrailTrace::new(intent.safety_category, intent.severity, action),
            SkeletonTrace {
                base: resolution.skeleton,
                after_guardrail: Some(after_guardrail),
            },
            tone_profile,
            SelectionTrace::empty(),
            Some(FallbackMeta {
                fallback_reason: FallbackReason::ContractLoadFailure,
                fallback_level: FallbackLevel::Absolute,
            }),
        )?;
        Ok(TurnResponse {
            response_text,
            trace,
        })
    }

    // ------------------------------------------------------------------
    // Non-emotional path
    // ------------------------------------------------------------------

    /// Runs a non-emotional turn through the guardrail and the model seam.
    fn run_model_turn(
        &self,
        request: &TurnRequest<'_>,
        intent: &Intent,
        resolution: &Resolution,
        stage: TurnStage,
        state: &mut SessionVoiceState,
    ) -> Result<TurnResponse, PipelineError> {
        let language = resolution.language;
        let decision = evaluate_guardrail(
            self.contract(),
            intent.safety_category,
            intent.severity,
            language,
        );

        let mut meta: Option<FallbackMeta> = None;
        let (response_text, after_guardrail, action) = if let Some(text) =
            decision.override_text.clone()
        {
            let after = escalate_skeleton(intent.safety_category, intent.severity, Skeleton::A);
            if self.contract.is_none() {
                meta = Some(FallbackMeta {
                    fallback_reason: FallbackReason::ContractLoadFailure,
                    fallback_level: FallbackLevel::Absolute,
                });
            }
            (text, Some(after), GuardrailActionKind::Override)
        } else {
            if self.contract.is_none() {
                return Err(PipelineError::NoSafeOutput);
            }
            let generated = self.model.generate(request.prompt, intent.kind, language)?;
            (generated, None, GuardrailActionKind::None)
        };

        // Only the hard reset is staged on non-emotional turns.
        stage.commit(state);

        let turn = TurnTrace {
            emotional_turn_index: state.emotional_turn_index,
            intent: intent.kind,
            emotional_lang: language,
            previous_skeleton: None,
            resolved_skeleton: None,
            skeleton_transition: None,
            escalation_state: state.escalation_state,
            latched_theme: state.latched_theme,
            signals: intent.signals,
        };
        let trace = build_decision_trace(
            request.prompt,
            turn,
            GuardrailTrace::new(intent.safety_category, intent.severity, action),
            SkeletonTrace {
                base: None,
                after_guardrail,
            },
            None,
            SelectionTrace::empty(),
            meta,
        )?;
        Ok(TurnResponse {
            response_text,
            trace,
        })
    }
}

// ============================================================================
// SECTION: Selection Retry
// ============================================================================

/// Outcome of the selection step after at most one retry.
enum SelectAttempt {
    /// Selection succeeded.
    Selected(SelectionOutcome),
    /// Selection failed with the taxonomy error that routes the fallback.
    Failed(VoiceError),
}

/// Runs selection with a single re-selection after a rotation-memory
/// inconsistency; the affected pool is cleared first.
fn select_with_retry(
    contract: &ContractStore,
    ctx: &TurnContext,
    state: &SessionVoiceState,
    stage: &mut TurnStage,
) -> SelectAttempt {
    match select_variants(contract, ctx, state, stage) {
        Ok(outcome) => SelectAttempt::Selected(outcome),
        Err(SelectError::State(StateError::CorruptRotation {
            pool,
        })) => {
            stage.discard_appends();
            stage.stage_reset(PoolReset::Pool(pool));
            match select_variants(contract, ctx, state, stage) {
                Ok(outcome) => SelectAttempt::Selected(outcome),
                Err(err) => SelectAttempt::Failed(err.into()),
            }
        }
        Err(err) => SelectAttempt::Failed(err.into()),
    }
}
