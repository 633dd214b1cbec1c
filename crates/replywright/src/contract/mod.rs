//! Response contracts: the structured, prose-free description of what a reply
//! must contain. Contracts are the only thing handed to the refiner.

use chrono::{DateTime, Utc};
use common::catalog::{GodModePrompt, Tone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub mod voice;

pub use voice::{apply_voice_constraints, VoiceProfile};

pub const GUARDRAILS: [&str; 4] = [
    "Do not blame the customer.",
    "Do not sound defensive.",
    "Do not transfer ownership unnecessarily.",
    "Prioritize clarity over persuasion.",
];

const SAFE_PRINCIPLE: &str =
    "Prioritize emotional safety: validate concerns, avoid pressure or escalation.";
const DIRECT_PRINCIPLE: &str =
    "Maintain clarity and firmness when appropriate; avoid unnecessary hedging.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Reconfirmation,
    Acknowledgement,
    SolutionOrNextSteps,
    Assurance,
}

impl Section {
    /// Mandatory order of every reply.
    pub const ORDER: [Section; 4] = [
        Section::Reconfirmation,
        Section::Acknowledgement,
        Section::SolutionOrNextSteps,
        Section::Assurance,
    ];

    pub fn instruction(&self) -> &'static str {
        match self {
            Section::Reconfirmation => {
                "Subtly restate the customer's issue or goal using their language. \
                 Do not sound like a summary or repeat verbatim."
            }
            Section::Acknowledgement => {
                "Acknowledge the customer's concern or frustration without exaggeration. \
                 Avoid defensiveness or over-apologizing."
            }
            Section::SolutionOrNextSteps => {
                "Clearly outline the response, position, or next step. \
                 Be specific and realistic. Do not overpromise."
            }
            Section::Assurance => {
                "Close with reassurance, ownership, or partnership. \
                 Reduce uncertainty about what happens next."
            }
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            Section::Reconfirmation => "Subtle reconfirmation of the issue or goal",
            Section::Acknowledgement => "Acknowledgement of the customer's concern",
            Section::SolutionOrNextSteps => "Clear solution or next steps",
            Section::Assurance => "Assurance or ownership",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSection {
    pub section: Section,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractMeta {
    pub generated_at: DateTime<Utc>,
    pub persona: String,
    pub god_mode_id: Option<String>,
    pub fingerprint_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputContext {
    pub customer_message: String,
    pub empathy_summary: String,
    #[serde(default)]
    pub clarifications: BTreeMap<String, String>,
    pub user_intent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychologyConstraints {
    pub principles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRules {
    pub must_follow_structure: bool,
    pub must_respect_user_intent: bool,
    pub must_respect_psychology: bool,
    pub no_policy_invention: bool,
    pub no_unverified_promises: bool,
    pub no_emotional_manipulation: bool,
}

impl Default for GenerationRules {
    fn default() -> Self {
        Self {
            must_follow_structure: true,
            must_respect_user_intent: true,
            must_respect_psychology: true,
            no_policy_invention: true,
            no_unverified_promises: true,
            no_emotional_manipulation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseContract {
    pub meta: ContractMeta,
    pub input_context: InputContext,
    pub response_structure: Vec<StructureSection>,
    pub psychology_constraints: PsychologyConstraints,
    #[serde(default)]
    pub voice_constraints: VoiceProfile,
    pub generation_rules: GenerationRules,
}

/// Everything a contract needs besides the selected prompt.
#[derive(Debug, Clone, Default)]
pub struct ContractRequest {
    pub customer_message: String,
    pub empathy_summary: String,
    pub clarifications: BTreeMap<String, String>,
    pub user_intent: String,
    pub persona: String,
    pub voice_profile: Option<VoiceProfile>,
}

pub fn mandatory_structure() -> Vec<StructureSection> {
    Section::ORDER
        .iter()
        .map(|section| StructureSection {
            section: *section,
            instruction: section.instruction().to_string(),
        })
        .collect()
}

/// Principles derived from the prompt's metadata and tone keys, followed by the
/// fixed guardrails.
pub fn psychology_principles(prompt: &GodModePrompt) -> Vec<String> {
    let mut principles = Vec::new();

    if let Some(psychology) = &prompt.psychology_used {
        principles.push(format!(
            "Apply psychological framing based on: {}",
            psychology.join(", ")
        ));
    }
    if let Some(inspired_by) = &prompt.inspired_by {
        principles.push(format!(
            "Maintain stance inspired by: {}",
            inspired_by.join(", ")
        ));
    }
    if prompt.has_tone(Tone::Safe) {
        principles.push(SAFE_PRINCIPLE.to_string());
    }
    if prompt.has_tone(Tone::Direct) {
        principles.push(DIRECT_PRINCIPLE.to_string());
    }

    principles.extend(GUARDRAILS.iter().map(|g| g.to_string()));
    principles
}

pub fn build_response_contract(request: ContractRequest, prompt: &GodModePrompt) -> ResponseContract {
    build_response_contract_at(request, prompt, Utc::now())
}

pub fn build_response_contract_at(
    request: ContractRequest,
    prompt: &GodModePrompt,
    generated_at: DateTime<Utc>,
) -> ResponseContract {
    ResponseContract {
        meta: ContractMeta {
            generated_at,
            persona: request.persona,
            god_mode_id: prompt.id.clone(),
            fingerprint_id: prompt.fingerprint_id.clone(),
        },
        input_context: InputContext {
            customer_message: request.customer_message,
            empathy_summary: request.empathy_summary,
            clarifications: request.clarifications,
            user_intent: request.user_intent,
        },
        response_structure: mandatory_structure(),
        psychology_constraints: PsychologyConstraints {
            principles: psychology_principles(prompt),
        },
        voice_constraints: request.voice_profile.unwrap_or_default(),
        generation_rules: GenerationRules::default(),
    }
}

impl ResponseContract {
    /// Plain-text instruction block: the chosen tone guidance, the mandatory
    /// sections and the principles. This is what `refine_instruction` verbalizes.
    pub fn instruction_block(&self, tone_guidance: &str) -> String {
        let mut block = String::new();

        let _ = writeln!(block, "Persona: {}", self.meta.persona);
        let _ = writeln!(
            block,
            "Customer message: \"{}\"",
            self.input_context.customer_message
        );
        if !self.input_context.user_intent.is_empty() {
            let _ = writeln!(block, "Intent: {}", self.input_context.user_intent);
        }
        if !tone_guidance.is_empty() {
            let _ = writeln!(block, "Guidance: {}", tone_guidance);
        }

        let _ = writeln!(block, "Structure:");
        for (index, section) in self.response_structure.iter().enumerate() {
            let _ = writeln!(
                block,
                "{}. {}: {}",
                index + 1,
                section.section.heading(),
                section.instruction
            );
        }

        let _ = writeln!(block, "Principles:");
        for principle in &self.psychology_constraints.principles {
            let _ = writeln!(block, "- {}", principle);
        }

        if !self.voice_constraints.is_empty() {
            let _ = writeln!(block, "Voice:");
            for (trait_name, value) in &self.voice_constraints {
                let _ = writeln!(block, "- {}: {}", trait_name, value);
            }
        }

        block.trim_end().to_string()
    }

    /// Numbered headings of the mandatory structure, as shown to the refiner.
    pub fn structure_outline(&self) -> String {
        self.response_structure
            .iter()
            .enumerate()
            .map(|(index, section)| format!("{}. {}", index + 1, section.section.heading()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn prompt() -> GodModePrompt {
        let mut prompts = BTreeMap::new();
        prompts.insert("safe".to_string(), vec!["Validate first.".to_string()]);
        prompts.insert("direct".to_string(), vec!["Be firm.".to_string()]);
        GodModePrompt {
            id: Some("gm_sales_value_anchor".to_string()),
            persona: "sales".to_string(),
            fingerprint_id: Some("fp-sales-001".to_string()),
            pain_point_tags: vec!["pricing".to_string()],
            prompts: Some(prompts),
            psychology_used: Some(vec!["anchoring".to_string(), "reciprocity".to_string()]),
            inspired_by: Some(vec!["Chris Voss".to_string()]),
        }
    }

    fn request() -> ContractRequest {
        ContractRequest {
            customer_message: "Your pricing is way too high".to_string(),
            empathy_summary: "Customer is frustrated about cost".to_string(),
            clarifications: BTreeMap::from([("plan".to_string(), "team".to_string())]),
            user_intent: "hold the price".to_string(),
            persona: "sales".to_string(),
            voice_profile: None,
        }
    }

    #[test]
    fn test_contract_has_fixed_sections_in_order() {
        let contract = build_response_contract(request(), &prompt());
        let sections: Vec<Section> = contract.response_structure.iter().map(|s| s.section).collect();
        assert_eq!(sections, Section::ORDER.to_vec());

        let json = serde_json::to_value(&contract).unwrap();
        let names: Vec<&str> = json["response_structure"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["section"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "reconfirmation",
                "acknowledgement",
                "solution_or_next_steps",
                "assurance"
            ]
        );
    }

    #[test]
    fn test_principles_from_prompt_metadata() {
        let principles = psychology_principles(&prompt());
        assert_eq!(
            principles,
            vec![
                "Apply psychological framing based on: anchoring, reciprocity".to_string(),
                "Maintain stance inspired by: Chris Voss".to_string(),
                SAFE_PRINCIPLE.to_string(),
                DIRECT_PRINCIPLE.to_string(),
                "Do not blame the customer.".to_string(),
                "Do not sound defensive.".to_string(),
                "Do not transfer ownership unnecessarily.".to_string(),
                "Prioritize clarity over persuasion.".to_string(),
            ]
        );
    }

    #[test]
    fn test_guardrails_present_for_bare_prompt() {
        let bare = GodModePrompt {
            persona: "support".to_string(),
            ..Default::default()
        };
        let contract = build_response_contract(request(), &bare);

        assert_eq!(
            contract.psychology_constraints.principles,
            GUARDRAILS.iter().map(|g| g.to_string()).collect::<Vec<_>>()
        );
        assert_eq!(contract.meta.god_mode_id, None);
    }

    #[test]
    fn test_meta_and_rules() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let contract = build_response_contract_at(request(), &prompt(), at);

        assert_eq!(contract.meta.generated_at, at);
        assert_eq!(contract.meta.persona, "sales");
        assert_eq!(contract.meta.god_mode_id.as_deref(), Some("gm_sales_value_anchor"));
        assert_eq!(contract.meta.fingerprint_id.as_deref(), Some("fp-sales-001"));
        assert_eq!(contract.input_context.clarifications["plan"], "team");
        assert!(contract.voice_constraints.is_empty());

        let rules = serde_json::to_value(&contract.generation_rules).unwrap();
        let rules = rules.as_object().unwrap();
        assert_eq!(rules.len(), 6);
        assert!(rules.values().all(|v| v == &serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_instruction_block_lists_sections_and_principles() {
        let contract = build_response_contract(request(), &prompt());
        let block = contract.instruction_block("Be firm.");

        assert!(block.contains("Guidance: Be firm."));
        assert!(block.contains("1. Subtle reconfirmation of the issue or goal"));
        assert!(block.contains("4. Assurance or ownership"));
        assert!(block.contains("- Do not blame the customer."));
        assert!(!block.contains("Voice:"));
    }
}
