use bytes::Bytes;
use common::errors::ReplyError;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

pub type HandlerResponse = Response<BoxBody<Bytes, hyper::Error>>;

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HandlerResponse {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            error!(error = %err, "failed to serialize response");
            return ReplyError::InternalServerError("failed to serialize response".to_string())
                .into_response();
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full(json))
        .unwrap_or_else(|err| ReplyError::ResponseCreationFailed(err).into_response())
}

pub fn no_content() -> HandlerResponse {
    let mut response = Response::new(empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

pub fn not_found() -> HandlerResponse {
    let mut response = Response::new(empty());
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Collects a request body, refusing anything past `limit` bytes.
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, ReplyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => {
            warn!(limit, "request body too large");
            Err(ReplyError::PayloadTooLarge(limit))
        }
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            Err(ReplyError::InvalidRequest(format!(
                "Failed to read request body: {}",
                err
            )))
        }
    }
}

/// Parses a JSON request body; an empty body reads as `{}`.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ReplyError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    serde_json::from_slice(body).map_err(|err| {
        warn!(error = %err, "failed to parse request body");
        ReplyError::InvalidRequest(format!("Invalid request body: {}", err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct NameOnly {
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn test_empty_body_reads_as_object() {
        let parsed: NameOnly = parse_json(b"  ").unwrap();
        assert_eq!(parsed, NameOnly { name: None });
    }

    #[test]
    fn test_invalid_body_is_invalid_request() {
        let err = parse_json::<NameOnly>(b"{not json").unwrap_err();
        assert!(matches!(err, ReplyError::InvalidRequest(_)));
    }

    #[test]
    fn test_json_response_sets_content_type() {
        let response = json_response(StatusCode::CREATED, &serde_json::json!({"ok": true}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = Full::new(Bytes::from_static(b"{\"name\":\"ok\"}"));
        let bytes = read_body(body, 64).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"{\"name\":\"ok\"}"));
    }

    #[tokio::test]
    async fn test_read_body_over_limit_is_payload_too_large() {
        let body = Full::new(Bytes::from(vec![b'a'; 65]));
        let err = read_body(body, 64).await.unwrap_err();
        assert!(matches!(err, ReplyError::PayloadTooLarge(64)));
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
