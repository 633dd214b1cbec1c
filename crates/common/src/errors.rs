use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{Error as HyperError, Response, StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog `{path}`: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("catalog `{0}` must be a mapping of persona sections")]
    NotAMapping(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// -----------------------------------------------------------------------------
// Service errors surfaced over HTTP
// -----------------------------------------------------------------------------
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("History entry not found: {0}")]
    HistoryEntryNotFound(String),

    #[error("Persona must be set before this operation")]
    PersonaNotSet,

    #[error("No usable guidance prompt for persona '{0}'")]
    NoGuidance(String),

    #[error("Catalog entry is unusable: {0}")]
    CatalogDefect(String),

    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    #[error("Invalid request")]
    InvalidRequest(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Internal server error")]
    InternalServerError(String),

    #[error("Failed to create response: {0}")]
    ResponseCreationFailed(#[from] hyper::http::Error),
}

impl ReplyError {
    pub fn into_response(self) -> Response<BoxBody<Bytes, HyperError>> {
        let (status, code, details) = match &self {
            ReplyError::SessionNotFound(session_id) => (
                StatusCode::NOT_FOUND,
                "SessionNotFound",
                json!({ "session_id": session_id }),
            ),

            ReplyError::HistoryEntryNotFound(entry_id) => (
                StatusCode::NOT_FOUND,
                "HistoryEntryNotFound",
                json!({ "entry_id": entry_id }),
            ),

            ReplyError::PersonaNotSet => (StatusCode::CONFLICT, "PersonaNotSet", json!({})),

            ReplyError::NoGuidance(persona) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NoGuidance",
                json!({ "persona": persona }),
            ),

            ReplyError::CatalogDefect(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CatalogDefect",
                json!({ "reason": reason }),
            ),

            ReplyError::FeatureUnavailable(feature) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "FeatureUnavailable",
                json!({ "feature": feature }),
            ),

            ReplyError::InvalidRequest(reason) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                json!({ "reason": reason }),
            ),

            ReplyError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PayloadTooLarge",
                json!({ "limit_bytes": limit }),
            ),

            ReplyError::InternalServerError(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                json!({ "reason": reason }),
            ),

            ReplyError::ResponseCreationFailed(reason) => (
                StatusCode::BAD_REQUEST,
                "ResponseCreationFailed",
                json!({ "reason": reason.to_string() }),
            ),
        };

        let body_json = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
                "details": details
            }
        });

        let boxed_body = Full::new(Bytes::from(body_json.to_string()))
            .map_err(|never| match never {})
            .boxed();

        Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(boxed_body)
            .unwrap_or_else(|_| {
                Response::new(
                    Full::new(Bytes::from("Internal Error"))
                        .map_err(|never| match never {})
                        .boxed(),
                )
            })
    }
}
