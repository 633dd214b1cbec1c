pub mod gemini;

pub use gemini::{GeminiApi, GenerateContentRequest, GenerateContentResponse};

pub trait ApiDefinition {
    /// Returns the endpoint path for this API
    fn endpoint(&self) -> &'static str;

    /// Creates an API instance from an endpoint path
    fn from_endpoint(endpoint: &str) -> Option<Self>
    where
        Self: Sized;

    /// Returns whether this API supports streaming responses
    fn supports_streaming(&self) -> bool;

    /// Returns all variants of this API enum
    fn all_variants() -> Vec<Self>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_api_functionality() {
        fn test_api<T: ApiDefinition>(api: &T) {
            let endpoint = api.endpoint();
            assert!(!endpoint.is_empty());
            assert!(!endpoint.starts_with('/'));
        }

        test_api(&GeminiApi::GenerateContent);
    }

    #[test]
    fn test_all_variants_round_trip_through_endpoint() {
        for api in GeminiApi::all_variants() {
            assert_eq!(GeminiApi::from_endpoint(api.endpoint()), Some(api));
        }
    }
}
