use common::errors::ReplyError;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

use super::utils::{json_response, parse_json, HandlerResponse};
use super::AppState;
use crate::refiner::ReplySimulation;

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    #[serde(default)]
    pub customer_message: String,
    pub persona: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    #[serde(default)]
    pub customer_message: String,
    #[serde(default)]
    pub drafted_response: String,
    pub persona: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    pub simulation: Option<ReplySimulation>,
}

/// Request persona when given, else the persona of the referenced session.
async fn resolve_persona(
    state: &AppState,
    persona: Option<&str>,
    session_id: Option<&str>,
) -> Result<String, ReplyError> {
    if let Some(persona) = persona.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(persona.to_string());
    }

    let Some(session_id) = session_id else {
        return Err(ReplyError::PersonaNotSet);
    };
    state
        .sessions
        .get(session_id)
        .await?
        .persona()
        .map(str::to_string)
        .ok_or(ReplyError::PersonaNotSet)
}

fn require_text(field: &str, value: &str) -> Result<(), ReplyError> {
    if value.trim().is_empty() {
        return Err(ReplyError::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub async fn suggest_questions(body: &[u8], state: &AppState) -> Result<HandlerResponse, ReplyError> {
    let request: QuestionsRequest = parse_json(body)?;
    require_text("customer_message", &request.customer_message)?;
    let persona = resolve_persona(
        state,
        request.persona.as_deref(),
        request.session_id.as_deref(),
    )
    .await?;

    let questions = state
        .drafts
        .refiner()
        .suggest_questions(&request.customer_message, &persona)
        .await;

    Ok(json_response(StatusCode::OK, &QuestionsResponse { questions }))
}

pub async fn simulate_reply(body: &[u8], state: &AppState) -> Result<HandlerResponse, ReplyError> {
    let request: SimulationRequest = parse_json(body)?;
    require_text("customer_message", &request.customer_message)?;
    require_text("drafted_response", &request.drafted_response)?;
    let persona = resolve_persona(
        state,
        request.persona.as_deref(),
        request.session_id.as_deref(),
    )
    .await?;

    let simulation = state
        .drafts
        .refiner()
        .simulate_reply(&request.customer_message, &request.drafted_response, &persona)
        .await;

    Ok(json_response(StatusCode::OK, &SimulationResponse { simulation }))
}
