use common::errors::ReplyError;
use thiserror::Error;

pub mod history;
pub mod memory;
pub mod session;

pub use history::{HistoryEntry, ResponseHistory};
pub use memory::SessionStore;
pub use session::{SessionSettings, SessionState, SettingsUpdate, ToneMode};

/// Error types for session operations
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Persona must be set before adding responses")]
    PersonaNotSet,

    #[error("Session not found: {0}")]
    NotFound(String),
}

impl From<SessionError> for ReplyError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::PersonaNotSet => ReplyError::PersonaNotSet,
            SessionError::NotFound(session_id) => ReplyError::SessionNotFound(session_id),
        }
    }
}
