use std::collections::HashSet;

use common::catalog::{GodModePrompt, Tone};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::matching::PainPointMatch;

/// Errors that can occur while picking an instruction variant
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SelectionError {
    #[error("God Mode prompt {0} has no 'prompts' mapping")]
    MissingPrompts(String),
    #[error("God Mode prompt {prompt} has no usable variant for tone '{tone}' or 'safe'")]
    NoUsableVariant { prompt: String, tone: Tone },
}

/// Which rule produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStage {
    TagOverlap,
    Wildcard,
    FirstForPersona,
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptSelection<'a> {
    TagOverlap {
        prompt: &'a GodModePrompt,
        overlap: usize,
    },
    Wildcard(&'a GodModePrompt),
    FirstForPersona(&'a GodModePrompt),
    NoCandidates,
}

impl<'a> PromptSelection<'a> {
    pub fn prompt(&self) -> Option<&'a GodModePrompt> {
        match *self {
            PromptSelection::TagOverlap { prompt, .. } => Some(prompt),
            PromptSelection::Wildcard(prompt) | PromptSelection::FirstForPersona(prompt) => {
                Some(prompt)
            }
            PromptSelection::NoCandidates => None,
        }
    }

    pub fn stage(&self) -> SelectionStage {
        match self {
            PromptSelection::TagOverlap { .. } => SelectionStage::TagOverlap,
            PromptSelection::Wildcard(_) => SelectionStage::Wildcard,
            PromptSelection::FirstForPersona(_) => SelectionStage::FirstForPersona,
            PromptSelection::NoCandidates => SelectionStage::NoCandidates,
        }
    }
}

/// Picks the guidance prompt for a persona.
///
/// Priority: largest positive tag overlap with the matched pain point, then the
/// first `_wildcard` prompt, then the first prompt for the persona. Ties keep
/// catalog order.
pub fn select_prompt<'a>(
    persona: &str,
    prompts: &'a [GodModePrompt],
    pain_point_match: &PainPointMatch,
) -> PromptSelection<'a> {
    let candidates: Vec<&GodModePrompt> = prompts
        .iter()
        .filter(|p| p.persona.eq_ignore_ascii_case(persona))
        .collect();

    if candidates.is_empty() {
        warn!(persona, "no god mode prompts configured for persona");
        return PromptSelection::NoCandidates;
    }

    if pain_point_match.matched {
        let pain_tags: HashSet<&str> = pain_point_match.tags().iter().map(String::as_str).collect();

        let mut best: Option<(&GodModePrompt, usize)> = None;
        for prompt in &candidates {
            let prompt_tags: HashSet<&str> =
                prompt.pain_point_tags.iter().map(String::as_str).collect();
            let overlap = pain_tags.intersection(&prompt_tags).count();
            if overlap > best.map(|(_, o)| o).unwrap_or(0) {
                best = Some((*prompt, overlap));
            }
        }

        if let Some((prompt, overlap)) = best {
            debug!(prompt = prompt.label(), overlap, "selected prompt by tag overlap");
            return PromptSelection::TagOverlap { prompt, overlap };
        }
    }

    if let Some(prompt) = candidates.iter().find(|p| p.is_wildcard()) {
        debug!(prompt = prompt.label(), "selected wildcard prompt");
        return PromptSelection::Wildcard(*prompt);
    }

    debug!(
        prompt = candidates[0].label(),
        "no overlap or wildcard, using first prompt for persona"
    );
    PromptSelection::FirstForPersona(candidates[0])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneVariant {
    pub requested: Tone,
    /// Tone the text was actually drawn from.
    pub tone: Tone,
    pub text: String,
}

impl ToneVariant {
    pub fn fell_back(&self) -> bool {
        self.requested != self.tone
    }
}

/// Draws one instruction variant for `tone`, falling back to `safe` when the
/// requested tone has nothing usable.
pub fn choose_variant<R: Rng + ?Sized>(
    prompt: &GodModePrompt,
    tone: Tone,
    rng: &mut R,
) -> Result<ToneVariant, SelectionError> {
    if prompt.prompts.is_none() {
        return Err(SelectionError::MissingPrompts(prompt.label().to_string()));
    }

    let mut used = tone;
    let mut variants = prompt.variants(tone);
    if variants.is_empty() && tone != Tone::Safe {
        debug!(
            prompt = prompt.label(),
            requested = %tone,
            "no usable variants for requested tone, falling back to safe"
        );
        used = Tone::Safe;
        variants = prompt.variants(Tone::Safe);
    }

    let text = variants
        .choose(rng)
        .ok_or_else(|| SelectionError::NoUsableVariant {
            prompt: prompt.label().to_string(),
            tone,
        })?;

    Ok(ToneVariant {
        requested: tone,
        tone: used,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::catalog::PainPoint;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn prompt(id: &str, persona: &str, tags: &[&str]) -> GodModePrompt {
        let mut prompts = BTreeMap::new();
        prompts.insert("safe".to_string(), vec![format!("{} safe", id)]);
        GodModePrompt {
            id: Some(id.to_string()),
            persona: persona.to_string(),
            pain_point_tags: tags.iter().map(|t| t.to_string()).collect(),
            prompts: Some(prompts),
            ..Default::default()
        }
    }

    fn matched(tags: &[&str]) -> PainPointMatch {
        PainPointMatch {
            matched: true,
            pain_point: Some(PainPoint {
                id: "pp".to_string(),
                persona: "sales".to_string(),
                pain_point_tags: tags.iter().map(|t| t.to_string()).collect(),
                description: None,
            }),
            confidence: 1.0,
            reason: "Matched on 2 keyword signals.".to_string(),
            score: 2,
        }
    }

    fn catalog() -> Vec<GodModePrompt> {
        vec![
            prompt("support_first", "support", &["login"]),
            prompt("sales_general", "sales", &["_wildcard"]),
            prompt("sales_one", "sales", &["pricing", "discount"]),
            prompt("sales_two", "Sales", &["pricing", "cost", "budget"]),
            prompt("sales_tie", "sales", &["pricing", "cost", "budget"]),
        ]
    }

    #[test]
    fn test_largest_overlap_wins_with_catalog_order_on_ties() {
        let prompts = catalog();
        let selection = select_prompt("sales", &prompts, &matched(&["pricing", "cost", "budget"]));

        assert_eq!(selection.stage(), SelectionStage::TagOverlap);
        assert_eq!(selection.prompt().unwrap().label(), "sales_two");
        assert!(matches!(selection, PromptSelection::TagOverlap { overlap: 3, .. }));
    }

    #[test]
    fn test_zero_overlap_falls_back_to_wildcard() {
        let prompts = catalog();
        let selection = select_prompt("sales", &prompts, &matched(&["renewal", "churn"]));

        assert_eq!(selection.stage(), SelectionStage::Wildcard);
        assert_eq!(selection.prompt().unwrap().label(), "sales_general");
    }

    #[test]
    fn test_unmatched_uses_wildcard_even_if_tags_would_overlap() {
        let prompts = catalog();
        let selection = select_prompt("SALES", &prompts, &PainPointMatch::unmatched());
        assert_eq!(selection.prompt().unwrap().label(), "sales_general");
    }

    #[test]
    fn test_first_for_persona_without_wildcard() {
        let prompts = catalog();
        let selection = select_prompt("support", &prompts, &matched(&["billing"]));

        assert_eq!(selection.stage(), SelectionStage::FirstForPersona);
        assert_eq!(selection.prompt().unwrap().label(), "support_first");
    }

    #[test]
    fn test_no_candidates_is_distinguishable() {
        let prompts = catalog();
        let selection = select_prompt("marketing", &prompts, &matched(&["pricing"]));

        assert_eq!(selection, PromptSelection::NoCandidates);
        assert!(selection.prompt().is_none());
    }

    #[test]
    fn test_selection_always_matches_persona() {
        let prompts = catalog();
        for persona in ["sales", "support", "Sales"] {
            for pain in [matched(&["pricing"]), matched(&["login"]), PainPointMatch::unmatched()] {
                let selected = select_prompt(persona, &prompts, &pain).prompt().unwrap();
                assert!(selected.persona.eq_ignore_ascii_case(persona));
            }
        }
    }

    #[test]
    fn test_direct_falls_back_to_safe() {
        let p = prompt("gm", "sales", &[]);
        let mut rng = StdRng::seed_from_u64(7);

        let variant = choose_variant(&p, Tone::Direct, &mut rng).unwrap();
        assert_eq!(variant.requested, Tone::Direct);
        assert_eq!(variant.tone, Tone::Safe);
        assert!(variant.fell_back());
        assert_eq!(variant.text, "gm safe");
    }

    #[test]
    fn test_blank_direct_variants_fall_back_to_safe() {
        let mut p = prompt("gm", "sales", &[]);
        p.prompts
            .as_mut()
            .unwrap()
            .insert("direct".to_string(), vec!["  ".to_string()]);
        let mut rng = StdRng::seed_from_u64(1);

        let variant = choose_variant(&p, Tone::Direct, &mut rng).unwrap();
        assert_eq!(variant.tone, Tone::Safe);
    }

    #[test]
    fn test_no_usable_variant_is_an_error() {
        let mut p = prompt("gm_empty", "sales", &[]);
        p.prompts = Some(BTreeMap::from([(
            "direct".to_string(),
            Vec::<String>::new(),
        )]));
        let mut rng = StdRng::seed_from_u64(1);

        let err = choose_variant(&p, Tone::Direct, &mut rng).unwrap_err();
        assert_eq!(
            err,
            SelectionError::NoUsableVariant {
                prompt: "gm_empty".to_string(),
                tone: Tone::Direct
            }
        );
    }

    #[test]
    fn test_missing_prompts_mapping_is_an_error() {
        let mut p = prompt("gm_none", "sales", &[]);
        p.prompts = None;
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            choose_variant(&p, Tone::Safe, &mut rng).unwrap_err(),
            SelectionError::MissingPrompts("gm_none".to_string())
        );
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut p = prompt("gm", "sales", &[]);
        let variants: Vec<String> = (0..5).map(|i| format!("variant {}", i)).collect();
        p.prompts
            .as_mut()
            .unwrap()
            .insert("direct".to_string(), variants.clone());

        let first = choose_variant(&p, Tone::Direct, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = choose_variant(&p, Tone::Direct, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(first, second);
        assert!(variants.contains(&first.text));
        assert!(!first.fell_back());
    }
}
