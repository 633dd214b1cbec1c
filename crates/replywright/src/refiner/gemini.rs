use async_trait::async_trait;
use common::configuration::Refiner as RefinerConfig;
use common::consts::GENERATOR_API_KEY_ENV;
use hermesllm::{GeminiApi, GenerateContentRequest, GenerateContentResponse};
use hyper::header;
use tracing::{debug, warn};

use super::{GenerationConfig, GenerationError, TextGenerator};

/// `generateContent` client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Client built from config, or `None` when the API key is unset or blank.
    pub fn from_api_key(config: &RefinerConfig, api_key: Option<String>) -> Option<Self> {
        match api_key {
            Some(api_key) if !api_key.trim().is_empty() => {
                Some(Self::new(config.endpoint(), config.model(), api_key))
            }
            _ => {
                warn!(
                    env = GENERATOR_API_KEY_ENV,
                    "no generator API key set, refinement disabled"
                );
                None
            }
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}{}",
            self.endpoint,
            GeminiApi::GenerateContent.path_for_model(&self.model)
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        let request = GenerateContentRequest::from_prompt(prompt, Some(config.wire_config()));

        debug!(
            model = %self.model,
            timeout_ms = config.timeout.as_millis() as u64,
            prompt_chars = prompt.len(),
            "sending generateContent request"
        );

        let start_time = std::time::Instant::now();
        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(
            status = status.as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "generateContent responded"
        );

        if status.is_client_error() {
            return Err(GenerationError::ClientError {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).to_string(),
            });
        }
        if !status.is_success() {
            return Err(GenerationError::ServerError {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).to_string(),
            });
        }

        let parsed = GenerateContentResponse::try_from(body.as_ref())?;
        parsed
            .first_text()
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }
}
