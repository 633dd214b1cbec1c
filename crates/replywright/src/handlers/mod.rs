use common::consts::{
    DRAFTS_PATH, HEALTHZ_PATH, MAX_REQUEST_BODY_BYTES, QUESTIONS_PATH, REQUEST_ID_HEADER,
    SESSIONS_PATH, SIMULATIONS_PATH,
};
use hyper::body::Incoming;
use hyper::{Method, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::drafting::DraftService;
use crate::state::SessionStore;

pub mod drafts;
pub mod refinement;
pub mod sessions;
pub mod utils;

use utils::{json_response, not_found, read_body, HandlerResponse};

/// Shared service state handed to every request.
pub struct AppState {
    pub drafts: DraftService,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(drafts: DraftService, sessions: SessionStore) -> Self {
        Self { drafts, sessions }
    }
}

pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<HandlerResponse, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!("request", request_id = %request_id);

    let body = match read_body(req.into_body(), MAX_REQUEST_BODY_BYTES)
        .instrument(span.clone())
        .await
    {
        Ok(body) => body,
        Err(err) => return Ok(err.into_response()),
    };

    Ok(dispatch(&method, &path, &body, &state).instrument(span).await)
}

pub async fn dispatch(method: &Method, path: &str, body: &[u8], state: &AppState) -> HandlerResponse {
    debug!(method = %method, path, body_bytes = body.len(), "handling request");

    let result = match (method, path) {
        (&Method::GET, HEALTHZ_PATH) => Ok(json_response(StatusCode::OK, &json!({ "status": "ok" }))),
        (&Method::POST, DRAFTS_PATH) => drafts::create_draft(body, state).await,
        (&Method::POST, QUESTIONS_PATH) => refinement::suggest_questions(body, state).await,
        (&Method::POST, SIMULATIONS_PATH) => refinement::simulate_reply(body, state).await,
        (&Method::POST, SESSIONS_PATH) => sessions::create_session(state).await,
        _ => match path
            .strip_prefix(SESSIONS_PATH)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(rest) => sessions::route(method, rest, body, state).await,
            None => {
                debug!(method = %method, path, "no route found");
                return not_found();
            }
        },
    };

    result.unwrap_or_else(|err| err.into_response())
}
