use common::configuration::Sessions as SessionsConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{SessionError, SessionState};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct StoredSession {
    state: SessionState,
    last_seen: Instant,
}

impl StoredSession {
    fn touch(&mut self, now: Instant) -> &mut SessionState {
        self.last_seen = now;
        &mut self.state
    }
}

/// In-memory session storage.
/// Uses a HashMap wrapped in Arc<RwLock<>> for thread-safe access; a session is
/// only ever mutated through its own id. Sessions idle past `idle_timeout` are
/// dropped by `sweep_idle`, and creating past `max_sessions` evicts the least
/// recently used one.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Store limits from config, falling back to the defaults per field.
    pub fn from_config(config: Option<&SessionsConfig>) -> Self {
        let idle_timeout = config
            .and_then(SessionsConfig::idle_timeout)
            .unwrap_or(DEFAULT_IDLE_TIMEOUT);
        let max_sessions = config
            .and_then(|c| c.max_sessions)
            .unwrap_or(DEFAULT_MAX_SESSIONS);
        Self::with_limits(idle_timeout, max_sessions)
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Creates a fresh session and returns a snapshot of it.
    pub async fn create(&self) -> SessionState {
        let session = SessionState::new();
        let mut sessions = self.sessions.write().await;

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, stored)| stored.last_seen)
                .map(|(id, _)| id.clone());
            let Some(oldest) = oldest else { break };
            sessions.remove(&oldest);
            warn!(
                session_id = %oldest,
                max_sessions = self.max_sessions,
                "session store full, evicted least recently used session"
            );
        }

        debug!(session_id = session.session_id(), "created session");
        sessions.insert(
            session.session_id().to_string(),
            StoredSession {
                state: session.clone(),
                last_seen: Instant::now(),
            },
        );
        session
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(session_id) {
            Some(stored) => Ok(stored.touch(Instant::now()).clone()),
            None => {
                warn!(session_id, "session not found");
                Err(SessionError::NotFound(session_id.to_string()))
            }
        }
    }

    /// Runs `f` against the stored session under the write lock.
    pub async fn update<F, R>(&self, session_id: &str, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut SessionState) -> Result<R, SessionError>,
    {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(session_id) {
            Some(stored) => f(stored.touch(Instant::now())),
            None => {
                warn!(session_id, "session not found");
                Err(SessionError::NotFound(session_id.to_string()))
            }
        }
    }

    pub async fn remove(&self, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;

        if sessions.remove(session_id).is_some() {
            debug!(session_id, "removed session");
            Ok(())
        } else {
            Err(SessionError::NotFound(session_id.to_string()))
        }
    }

    /// Drops sessions idle for longer than the idle timeout; returns how many.
    pub async fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now()).await
    }

    pub async fn sweep_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| now.saturating_duration_since(stored.last_seen) < self.idle_timeout);

        let expired = before - sessions.len();
        if expired > 0 {
            info!(expired, remaining = sessions.len(), "expired idle sessions");
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
