use common::errors::ReplyError;
use hyper::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

use super::utils::{json_response, parse_json, HandlerResponse};
use super::AppState;
use crate::drafting::{Draft, DraftRequest};

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub session_id: Option<String>,
    pub draft: Draft,
    /// Present only when refinement ran and its output passed the constraints.
    pub refined_response: Option<String>,
}

pub async fn create_draft(body: &[u8], state: &AppState) -> Result<HandlerResponse, ReplyError> {
    let request: DraftRequest = parse_json(body)?;
    if request.customer_message.trim().is_empty() {
        return Err(ReplyError::InvalidRequest(
            "customer_message must not be empty".to_string(),
        ));
    }

    let session = match request.session_id.as_deref() {
        Some(session_id) => Some(state.sessions.get(session_id).await?),
        None => None,
    };

    let draft = state
        .drafts
        .draft(&request, session.as_ref(), &mut rand::rng())?;

    let refinement_enabled = session
        .as_ref()
        .map(|s| s.settings().refinement_enabled)
        .unwrap_or(true);
    let refined_response = if refinement_enabled {
        state.drafts.refine(&draft).await
    } else {
        debug!("refinement turned off for session");
        None
    };

    info!(
        refined = refined_response.is_some(),
        tone = %draft.variant.tone,
        "draft created"
    );

    Ok(json_response(
        StatusCode::OK,
        &DraftResponse {
            session_id: request.session_id,
            draft,
            refined_response,
        },
    ))
}
