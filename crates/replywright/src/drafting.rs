//! The draft pipeline: intensity, pain point match, guidance selection, tone
//! variant and response contract, in that order.

use common::catalog::{Catalog, Tone};
use common::configuration::Matching;
use common::errors::ReplyError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::contract::{apply_voice_constraints, build_response_contract, ContractRequest, ResponseContract};
use crate::matching::{fuzzy_match, match_pain_point, FuzzyHint, PainPointMatch};
use crate::refiner::Refiner;
use crate::selection::{choose_variant, select_prompt, SelectionError, SelectionStage, ToneVariant};
use crate::signals::{analyze_intensity, EmotionalIntensity};
use crate::state::SessionState;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("No persona given and none set on the session")]
    PersonaMissing,

    #[error("No usable guidance prompt for persona '{0}'")]
    NoGuidance(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl From<DraftError> for ReplyError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::PersonaMissing => ReplyError::PersonaNotSet,
            DraftError::NoGuidance(persona) => ReplyError::NoGuidance(persona),
            DraftError::Selection(err) => ReplyError::CatalogDefect(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftRequest {
    pub customer_message: String,
    /// Falls back to the session persona when absent.
    pub persona: Option<String>,
    /// Overrides the session tone mode when present.
    pub tone: Option<Tone>,
    pub empathy_summary: Option<String>,
    #[serde(default)]
    pub clarifications: BTreeMap<String, String>,
    pub user_intent: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub contract: ResponseContract,
    pub intensity: EmotionalIntensity,
    pub pain_point_match: PainPointMatch,
    /// Independent fuzzy keyword hint; never reconciled with `pain_point_match`.
    pub fuzzy_hint: Option<FuzzyHint>,
    pub selection: SelectionStage,
    pub variant: ToneVariant,
    pub instruction_block: String,
}

pub struct DraftService {
    catalog: Arc<Catalog>,
    matching: Matching,
    refiner: Refiner,
}

impl DraftService {
    pub fn new(catalog: Arc<Catalog>, matching: Matching, refiner: Refiner) -> Self {
        Self {
            catalog,
            matching,
            refiner,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn refiner(&self) -> &Refiner {
        &self.refiner
    }

    pub fn draft<R: Rng + ?Sized>(
        &self,
        request: &DraftRequest,
        session: Option<&SessionState>,
        rng: &mut R,
    ) -> Result<Draft, DraftError> {
        let persona = request
            .persona
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| session.and_then(|s| s.persona()))
            .ok_or(DraftError::PersonaMissing)?
            .to_string();

        let message = request.customer_message.as_str();
        let intensity = analyze_intensity(message);

        let pain_points = self.catalog.pain_points_for(&persona);
        let pain_point_match = match_pain_point(message, &pain_points, self.matching.min_score);
        let fuzzy_hint = fuzzy_match(message, &pain_points, self.matching.fuzzy_cutoff);

        let selection = select_prompt(&persona, &self.catalog.god_mode_prompts, &pain_point_match);
        let prompt = selection
            .prompt()
            .ok_or_else(|| DraftError::NoGuidance(persona.clone()))?;

        let tone = request.tone.unwrap_or_else(|| {
            session
                .map(|s| s.settings().tone_mode)
                .unwrap_or_default()
                .resolve(intensity.label)
        });
        let variant = choose_variant(prompt, tone, rng)?;

        let user_intent = request.user_intent.clone().unwrap_or_else(|| {
            pain_point_match
                .pain_point
                .as_ref()
                .and_then(|p| p.description.clone())
                .unwrap_or_default()
        });

        let contract = build_response_contract(
            ContractRequest {
                customer_message: message.trim().to_string(),
                empathy_summary: request
                    .empathy_summary
                    .clone()
                    .unwrap_or_else(|| intensity.summary()),
                clarifications: request.clarifications.clone(),
                user_intent,
                persona: persona.clone(),
                voice_profile: None,
            },
            prompt,
        );
        let contract = apply_voice_constraints(contract, session.and_then(|s| s.voice_profile()));
        let instruction_block = contract.instruction_block(&variant.text);

        info!(
            persona = %persona,
            intensity = intensity.score,
            pain_point = pain_point_match.pain_point.as_ref().map(|p| p.id.as_str()).unwrap_or("none"),
            prompt = prompt.label(),
            stage = ?selection.stage(),
            tone = %variant.tone,
            "draft assembled"
        );

        Ok(Draft {
            contract,
            intensity,
            pain_point_match,
            fuzzy_hint,
            selection: selection.stage(),
            variant,
            instruction_block,
        })
    }

    /// Verbalizes a draft: the contract first, then the instruction block.
    pub async fn refine(&self, draft: &Draft) -> Option<String> {
        if !self.refiner.is_enabled() {
            return None;
        }
        if let Some(reply) = self.refiner.refine_contract(&draft.contract).await {
            return Some(reply);
        }
        debug!("contract refinement unavailable, trying instruction block");
        self.refiner.refine_instruction(&draft.instruction_block).await
    }
}
