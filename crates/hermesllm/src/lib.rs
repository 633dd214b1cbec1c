//! hermesllm: request and response shapes for the generative-text providers
//! used to verbalize response contracts.

pub mod apis;

pub use apis::gemini::{
    GeminiApi, GeminiApiError, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};
pub use apis::ApiDefinition;

pub const GEMINI_API_VERSION_PREFIX: &str = "/v1beta/models";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_content_path() {
        let path = GeminiApi::GenerateContent.path_for_model("gemini-2.5-flash");
        assert_eq!(path, "/v1beta/models/gemini-2.5-flash:generateContent");
    }
}
