//! Optional language refinement over an external text generator.
//!
//! Everything here fails closed: a missing credential, a transport error, an
//! unparseable reply or a constraint violation all turn into `None` (or an empty
//! list) with a warning. Callers never see an error from this module.

use async_trait::async_trait;
use common::configuration::Refiner as RefinerConfig;
use common::consts::GENERATOR_API_KEY_ENV;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::voice::voice_profile_from_json;
use crate::contract::{ResponseContract, VoiceProfile};

pub mod constraints;
pub mod gemini;
pub mod prompts;

pub use constraints::{ConstraintViolation, OutputConstraints};
pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to send request: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Generator rejected request with status {status}: {body}")]
    ClientError { status: u16, body: String },

    #[error("Generator failed with status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Failed to parse generator response: {0}")]
    ParseError(#[from] hermesllm::GeminiApiError),

    #[error("Generator returned no text")]
    EmptyResponse,
}

/// Sampling and time limits for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GenerationConfig {
    pub const fn new(temperature: f32, max_output_tokens: u32, timeout_secs: u64) -> Self {
        Self {
            temperature,
            top_p: 0.9,
            max_output_tokens,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn wire_config(&self) -> hermesllm::GenerationConfig {
        hermesllm::GenerationConfig {
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            max_output_tokens: Some(self.max_output_tokens),
        }
    }
}

pub const CONTRACT_GENERATION: GenerationConfig = GenerationConfig::new(0.4, 512, 15);
pub const INSTRUCTION_GENERATION: GenerationConfig = GenerationConfig::new(0.4, 512, 8);
pub const QUESTIONS_GENERATION: GenerationConfig = GenerationConfig::new(0.3, 256, 12);
pub const SIMULATION_GENERATION: GenerationConfig = GenerationConfig::new(0.6, 256, 15);
pub const VOICE_GENERATION: GenerationConfig = GenerationConfig::new(0.2, 512, 20);

/// Boundary to the external generative-text service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalDirection {
    Improving,
    Neutral,
    Worsening,
}

impl FromStr for EmotionalDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "improving" => Ok(EmotionalDirection::Improving),
            "neutral" => Ok(EmotionalDirection::Neutral),
            "worsening" => Ok(EmotionalDirection::Worsening),
            other => Err(format!("unknown emotional direction '{}'", other)),
        }
    }
}

impl fmt::Display for EmotionalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmotionalDirection::Improving => "improving",
            EmotionalDirection::Neutral => "neutral",
            EmotionalDirection::Worsening => "worsening",
        };
        f.write_str(name)
    }
}

/// Forecast of the customer's next message after a drafted reply is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplySimulation {
    pub simulated_reply: String,
    pub emotional_direction: EmotionalDirection,
}

#[derive(Clone)]
pub struct Refiner {
    generator: Option<Arc<dyn TextGenerator>>,
    constraints: OutputConstraints,
    timeout_override: Option<Duration>,
}

impl Refiner {
    pub fn new(generator: Arc<dyn TextGenerator>, constraints: OutputConstraints) -> Self {
        Self {
            generator: Some(generator),
            constraints,
            timeout_override: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            generator: None,
            constraints: OutputConstraints::default(),
            timeout_override: None,
        }
    }

    /// Gemini-backed refiner, or a disabled one when the config turns it off or
    /// no API key is available.
    pub fn from_config(config: Option<&RefinerConfig>) -> Self {
        Self::from_config_with_key(config, env::var(GENERATOR_API_KEY_ENV).ok())
    }

    pub fn from_config_with_key(config: Option<&RefinerConfig>, api_key: Option<String>) -> Self {
        let default_config = RefinerConfig::default();
        let config = config.unwrap_or(&default_config);

        if !config.is_enabled() {
            info!("refiner disabled by configuration");
            return Self::disabled();
        }

        match GeminiClient::from_api_key(config, api_key) {
            Some(client) => {
                info!(model = client.model(), "refiner enabled");
                let mut refiner = Self::new(
                    Arc::new(client),
                    OutputConstraints::from_config(config),
                );
                refiner.timeout_override = config.timeout();
                refiner
            }
            None => Self::disabled(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub fn constraints(&self) -> &OutputConstraints {
        &self.constraints
    }

    async fn generate(
        &self,
        operation: &'static str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Option<String> {
        let Some(generator) = &self.generator else {
            debug!(operation, "refiner disabled, skipping");
            return None;
        };

        let mut config = config.clone();
        if let Some(timeout) = self.timeout_override {
            config.timeout = timeout;
        }

        match generator.generate(prompt, &config).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(operation, error = %err, "generation failed");
                None
            }
        }
    }

    fn validated(&self, operation: &'static str, text: String) -> Option<String> {
        match self.constraints.check(&text) {
            Ok(()) => Some(text.trim().to_string()),
            Err(violation) => {
                warn!(operation, violation = %violation, "refined output rejected");
                None
            }
        }
    }

    /// Verbalizes a response contract into a single reply.
    pub async fn refine_contract(&self, contract: &ResponseContract) -> Option<String> {
        let prompt = prompts::contract_prompt(contract);
        let text = self
            .generate("refine_contract", &prompt, &CONTRACT_GENERATION)
            .await?;
        self.validated("refine_contract", text)
    }

    /// Verbalizes a plain instruction block into a reply.
    pub async fn refine_instruction(&self, instruction_block: &str) -> Option<String> {
        let prompt = prompts::instruction_prompt(instruction_block, self.constraints.max_words);
        let text = self
            .generate("refine_instruction", &prompt, &INSTRUCTION_GENERATION)
            .await?;
        self.validated("refine_instruction", text)
    }

    /// Up to two short factual clarification questions.
    pub async fn suggest_questions(&self, customer_message: &str, persona: &str) -> Vec<String> {
        let prompt = prompts::questions_prompt(customer_message, persona);
        let Some(text) = self
            .generate("suggest_questions", &prompt, &QUESTIONS_GENERATION)
            .await
        else {
            return Vec::new();
        };
        prompts::filter_questions(prompts::extract_questions(&text))
    }

    pub async fn simulate_reply(
        &self,
        customer_message: &str,
        drafted_response: &str,
        persona: &str,
    ) -> Option<ReplySimulation> {
        let prompt = prompts::simulation_prompt(customer_message, drafted_response, persona);
        let text = self
            .generate("simulate_reply", &prompt, &SIMULATION_GENERATION)
            .await?;

        let Some(object) = prompts::extract_json_object(&text) else {
            warn!("simulation output contained no JSON object");
            return None;
        };

        let simulated_reply = object
            .get("simulated_reply")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        let direction = object
            .get("emotional_direction")
            .and_then(|v| v.as_str())
            .map(EmotionalDirection::from_str);

        match direction {
            Some(Ok(emotional_direction)) => Some(ReplySimulation {
                simulated_reply: simulated_reply.to_string(),
                emotional_direction,
            }),
            Some(Err(reason)) => {
                warn!(reason = %reason, "simulation output rejected");
                None
            }
            None => {
                warn!("simulation output missing emotional_direction");
                None
            }
        }
    }

    /// Stable style traits extracted from writing samples.
    pub async fn analyze_voice(&self, samples: &[String]) -> Option<VoiceProfile> {
        let samples: Vec<String> = samples
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if samples.is_empty() {
            return None;
        }

        let prompt = prompts::voice_analysis_prompt(&samples);
        let text = self
            .generate("analyze_voice", &prompt, &VOICE_GENERATION)
            .await?;

        let profile = voice_profile_from_json(prompts::extract_json_object(&text)?);
        if profile.is_empty() {
            warn!("voice analysis returned no traits");
            return None;
        }
        Some(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{build_response_contract, ContractRequest};
    use common::catalog::GodModePrompt;
    use std::sync::Mutex;

    /// Returns a fixed reply and records what it was asked.
    struct CannedGenerator {
        reply: Option<String>,
        calls: Mutex<Vec<(String, GenerationConfig)>>,
    }

    impl CannedGenerator {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn last_config(&self) -> GenerationConfig {
            self.calls.lock().unwrap().last().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(
            &self,
            prompt: &str,
            config: &GenerationConfig,
        ) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), config.clone()));
            self.reply.clone().ok_or(GenerationError::ServerError {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    fn contract() -> ResponseContract {
        build_response_contract(
            ContractRequest {
                customer_message: "I was double charged".to_string(),
                empathy_summary: "Customer is annoyed".to_string(),
                persona: "support".to_string(),
                user_intent: "fix billing".to_string(),
                ..Default::default()
            },
            &GodModePrompt {
                persona: "support".to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_disabled_refiner_short_circuits() {
        let refiner = Refiner::disabled();
        assert!(!refiner.is_enabled());
        assert_eq!(refiner.refine_contract(&contract()).await, None);
        assert_eq!(refiner.refine_instruction("be kind").await, None);
        assert!(refiner.suggest_questions("help", "support").await.is_empty());
        assert_eq!(refiner.simulate_reply("a", "b", "support").await, None);
        assert_eq!(refiner.analyze_voice(&["sample".to_string()]).await, None);
    }

    #[test]
    fn test_from_config_disabled_by_flag() {
        let config = RefinerConfig {
            enabled: Some(false),
            ..Default::default()
        };
        let refiner = Refiner::from_config_with_key(Some(&config), Some("key-123".to_string()));
        assert!(!refiner.is_enabled());
    }

    #[test]
    fn test_from_config_disabled_without_key() {
        let config = RefinerConfig::default();
        assert!(!Refiner::from_config_with_key(Some(&config), None).is_enabled());
        assert!(!Refiner::from_config_with_key(Some(&config), Some("  ".to_string())).is_enabled());
        assert!(!Refiner::from_config_with_key(None, Some(String::new())).is_enabled());
    }

    #[test]
    fn test_from_config_with_key_applies_config() {
        let config: RefinerConfig =
            serde_json::from_value(serde_json::json!({ "timeout": "3s", "max_words": 40 })).unwrap();
        let refiner = Refiner::from_config_with_key(Some(&config), Some("key-123".to_string()));

        assert!(refiner.is_enabled());
        assert_eq!(refiner.constraints().max_words, 40);
        assert_eq!(refiner.timeout_override, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_refine_contract_uses_contract_settings() {
        let generator = CannedGenerator::replying("  I'm sorry about the duplicate charge; I've flagged it for billing.  ");
        let refiner = Refiner::new(generator.clone(), OutputConstraints::default());

        let refined = refiner.refine_contract(&contract()).await;
        assert_eq!(
            refined.as_deref(),
            Some("I'm sorry about the duplicate charge; I've flagged it for billing.")
        );

        let config = generator.last_config();
        assert_eq!(config, CONTRACT_GENERATION);
        let calls = generator.calls.lock().unwrap();
        assert!(calls[0].0.contains("I was double charged"));
        assert!(calls[0].0.contains("- Do not blame the customer."));
    }

    #[tokio::test]
    async fn test_constraint_violation_fails_closed() {
        let generator = CannedGenerator::replying("We guarantee a full refund by Friday.");
        let refiner = Refiner::new(generator, OutputConstraints::default());

        assert_eq!(refiner.refine_contract(&contract()).await, None);
        assert_eq!(refiner.refine_instruction("apologize").await, None);
    }

    #[tokio::test]
    async fn test_generator_error_fails_closed() {
        let refiner = Refiner::new(CannedGenerator::failing(), OutputConstraints::default());
        assert_eq!(refiner.refine_instruction("apologize").await, None);
        assert!(refiner.suggest_questions("help", "sales").await.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_override_applies_to_every_call() {
        let generator = CannedGenerator::replying("Which plan are you on?");
        let refiner = Refiner::new(generator.clone(), OutputConstraints::default())
            .with_timeout(Duration::from_secs(3));

        refiner.suggest_questions("help", "sales").await;
        let config = generator.last_config();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.temperature, 0.3);
    }

    #[tokio::test]
    async fn test_suggest_questions_filters_output() {
        let generator = CannedGenerator::replying(
            "1) Why is this happening?\n- Which invoice number is affected?\n- How did that make you feel?\n- When was the charge made?\n- Which card was used?",
        );
        let refiner = Refiner::new(generator, OutputConstraints::default());

        let questions = refiner.suggest_questions("I was double charged", "support").await;
        assert_eq!(
            questions,
            vec![
                "Which invoice number is affected?".to_string(),
                "When was the charge made?".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_simulate_reply_parses_json() {
        let generator = CannedGenerator::replying(
            "```json\n{\"simulated_reply\": \"Thanks, that helps.\", \"emotional_direction\": \"Improving\"}\n```",
        );
        let refiner = Refiner::new(generator.clone(), OutputConstraints::default());

        let simulation = refiner
            .simulate_reply("I was double charged", "We've flagged it.", "support")
            .await
            .unwrap();
        assert_eq!(simulation.simulated_reply, "Thanks, that helps.");
        assert_eq!(simulation.emotional_direction, EmotionalDirection::Improving);
        assert_eq!(generator.last_config(), SIMULATION_GENERATION);
    }

    #[tokio::test]
    async fn test_simulate_reply_rejects_unknown_direction() {
        let generator = CannedGenerator::replying(
            r#"{"simulated_reply": "ok", "emotional_direction": "sideways"}"#,
        );
        let refiner = Refiner::new(generator, OutputConstraints::default());
        assert_eq!(refiner.simulate_reply("a", "b", "sales").await, None);
    }

    #[tokio::test]
    async fn test_analyze_voice() {
        let generator = CannedGenerator::replying(
            r#"Here you go: {"tone": "warm", "formality": "casual", "sentence_length": 9}"#,
        );
        let refiner = Refiner::new(generator.clone(), OutputConstraints::default());

        let profile = refiner
            .analyze_voice(&["Hey! Thanks so much.".to_string(), "  ".to_string()])
            .await
            .unwrap();
        assert_eq!(profile["tone"], "warm");
        assert_eq!(profile["sentence_length"], "9");
        assert_eq!(generator.last_config(), VOICE_GENERATION);
    }

    #[tokio::test]
    async fn test_analyze_voice_without_samples_skips_generator() {
        let generator = CannedGenerator::replying("{}");
        let refiner = Refiner::new(generator.clone(), OutputConstraints::default());

        assert_eq!(refiner.analyze_voice(&[]).await, None);
        assert_eq!(refiner.analyze_voice(&["   ".to_string()]).await, None);
        assert!(generator.calls.lock().unwrap().is_empty());
    }
}
