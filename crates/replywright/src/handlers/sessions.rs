use common::errors::ReplyError;
use hyper::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::utils::{json_response, no_content, not_found, parse_json, HandlerResponse};
use super::AppState;
use crate::contract::voice::voice_profile_from_json;
use crate::state::SettingsUpdate;

#[derive(Debug, Deserialize)]
struct PersonaRequest {
    #[serde(default)]
    persona: String,
}

#[derive(Debug, Deserialize)]
struct VoiceAnalysisRequest {
    #[serde(default)]
    samples: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryRequest {
    #[serde(default)]
    customer_message: String,
    #[serde(default)]
    final_response: String,
}

pub async fn create_session(state: &AppState) -> Result<HandlerResponse, ReplyError> {
    let session = state.sessions.create().await;
    info!(session_id = session.session_id(), "session created");
    Ok(json_response(StatusCode::CREATED, &session))
}

/// Routes everything below `/v1/sessions/`.
pub async fn route(
    method: &Method,
    rest: &str,
    body: &[u8],
    state: &AppState,
) -> Result<HandlerResponse, ReplyError> {
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        (&Method::GET, [id]) => get_session(state, id).await,
        (&Method::DELETE, [id]) => {
            state.sessions.remove(id).await?;
            Ok(no_content())
        }
        (&Method::PUT, [id, "persona"]) => set_persona(state, id, body).await,
        (&Method::PUT, [id, "voice_profile"]) => set_voice_profile(state, id, body).await,
        (&Method::DELETE, [id, "voice_profile"]) => {
            state
                .sessions
                .update(id, |session| {
                    session.clear_voice_profile();
                    Ok(())
                })
                .await?;
            Ok(no_content())
        }
        (&Method::POST, [id, "voice_profile", "analyze"]) => analyze_voice(state, id, body).await,
        (&Method::PATCH, [id, "settings"]) => {
            let update: SettingsUpdate = parse_json(body)?;
            let settings = state
                .sessions
                .update(id, |session| {
                    session.update_settings(update);
                    Ok(session.settings().clone())
                })
                .await?;
            Ok(json_response(StatusCode::OK, &settings))
        }
        (&Method::GET, [id, "history"]) => {
            let session = state.sessions.get(id).await?;
            Ok(json_response(StatusCode::OK, &session.list_responses()))
        }
        (&Method::POST, [id, "history"]) => add_history(state, id, body).await,
        (&Method::DELETE, [id, "history"]) => {
            state
                .sessions
                .update(id, |session| {
                    session.clear_responses();
                    Ok(())
                })
                .await?;
            Ok(no_content())
        }
        (&Method::GET, [id, "history", entry_id]) => {
            let session = state.sessions.get(id).await?;
            let entry = session
                .get_response(entry_id)
                .ok_or_else(|| ReplyError::HistoryEntryNotFound(entry_id.to_string()))?;
            Ok(json_response(StatusCode::OK, entry))
        }
        _ => {
            debug!(method = %method, rest, "no session route found");
            Ok(not_found())
        }
    }
}

async fn get_session(state: &AppState, session_id: &str) -> Result<HandlerResponse, ReplyError> {
    let session = state.sessions.get(session_id).await?;
    Ok(json_response(StatusCode::OK, &session))
}

async fn set_persona(
    state: &AppState,
    session_id: &str,
    body: &[u8],
) -> Result<HandlerResponse, ReplyError> {
    let request: PersonaRequest = parse_json(body)?;
    let persona = request.persona.trim().to_string();
    if persona.is_empty() {
        return Err(ReplyError::InvalidRequest(
            "persona must not be empty".to_string(),
        ));
    }

    state
        .sessions
        .update(session_id, |session| {
            session.set_persona(&persona);
            Ok(())
        })
        .await?;
    Ok(json_response(StatusCode::OK, &json!({ "persona": persona })))
}

async fn set_voice_profile(
    state: &AppState,
    session_id: &str,
    body: &[u8],
) -> Result<HandlerResponse, ReplyError> {
    let object: Map<String, Value> = parse_json(body)?;
    let profile = voice_profile_from_json(object);

    state
        .sessions
        .update(session_id, |session| {
            session.set_voice_profile(profile.clone());
            Ok(())
        })
        .await?;
    Ok(json_response(StatusCode::OK, &profile))
}

async fn analyze_voice(
    state: &AppState,
    session_id: &str,
    body: &[u8],
) -> Result<HandlerResponse, ReplyError> {
    let request: VoiceAnalysisRequest = parse_json(body)?;
    // fail before spending a generation call on a missing session
    state.sessions.get(session_id).await?;

    let refiner = state.drafts.refiner();
    if !refiner.is_enabled() {
        return Err(ReplyError::FeatureUnavailable("voice analysis".to_string()));
    }
    if request.samples.iter().all(|s| s.trim().is_empty()) {
        return Err(ReplyError::InvalidRequest(
            "samples must contain at least one non-empty text".to_string(),
        ));
    }

    let profile = refiner
        .analyze_voice(&request.samples)
        .await
        .ok_or_else(|| ReplyError::FeatureUnavailable("voice analysis".to_string()))?;

    state
        .sessions
        .update(session_id, |session| {
            session.set_voice_profile(profile.clone());
            Ok(())
        })
        .await?;
    Ok(json_response(StatusCode::OK, &profile))
}

async fn add_history(
    state: &AppState,
    session_id: &str,
    body: &[u8],
) -> Result<HandlerResponse, ReplyError> {
    let request: HistoryRequest = parse_json(body)?;
    if request.final_response.trim().is_empty() {
        return Err(ReplyError::InvalidRequest(
            "final_response must not be empty".to_string(),
        ));
    }

    let entry = state
        .sessions
        .update(session_id, |session| {
            session
                .add_response(&request.customer_message, &request.final_response)
                .cloned()
        })
        .await?;
    Ok(json_response(StatusCode::CREATED, &entry))
}
