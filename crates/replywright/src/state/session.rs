use chrono::{DateTime, Utc};
use common::catalog::Tone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::history::{HistoryEntry, ResponseHistory};
use super::SessionError;
use crate::contract::VoiceProfile;
use crate::signals::IntensityLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMode {
    #[default]
    Auto,
    Conservative,
    Assertive,
}

impl ToneMode {
    /// Tone to request for a message of the given intensity.
    pub fn resolve(&self, intensity: IntensityLabel) -> Tone {
        match self {
            ToneMode::Conservative => Tone::Safe,
            ToneMode::Assertive => Tone::Direct,
            ToneMode::Auto => match intensity {
                IntensityLabel::Low => Tone::Direct,
                IntensityLabel::Medium | IntensityLabel::High => Tone::Safe,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub tone_mode: ToneMode,
    #[serde(default = "default_refinement_enabled")]
    pub refinement_enabled: bool,
}

fn default_refinement_enabled() -> bool {
    true
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tone_mode: ToneMode::Auto,
            refinement_enabled: true,
        }
    }
}

/// Partial settings change; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub tone_mode: Option<ToneMode>,
    pub refinement_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    session_id: String,
    created_at: DateTime<Utc>,
    persona: Option<String>,
    voice_profile: Option<VoiceProfile>,
    settings: SessionSettings,
    history: ResponseHistory,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            persona: None,
            voice_profile: None,
            settings: SessionSettings::default(),
            history: ResponseHistory::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_persona(&mut self, persona: &str) {
        self.persona = Some(persona.trim().to_string());
    }

    pub fn persona(&self) -> Option<&str> {
        self.persona.as_deref()
    }

    pub fn set_voice_profile(&mut self, voice_profile: VoiceProfile) {
        self.voice_profile = Some(voice_profile);
    }

    pub fn voice_profile(&self) -> Option<&VoiceProfile> {
        self.voice_profile.as_ref()
    }

    pub fn clear_voice_profile(&mut self) {
        self.voice_profile = None;
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) {
        if let Some(tone_mode) = update.tone_mode {
            self.settings.tone_mode = tone_mode;
        }
        if let Some(refinement_enabled) = update.refinement_enabled {
            self.settings.refinement_enabled = refinement_enabled;
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Records a finished exchange under the session's persona.
    pub fn add_response(
        &mut self,
        customer_message: &str,
        final_response: &str,
    ) -> Result<&HistoryEntry, SessionError> {
        let persona = self
            .persona
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(SessionError::PersonaNotSet)?;

        Ok(self
            .history
            .add(customer_message, final_response, persona))
    }

    pub fn list_responses(&self) -> &[HistoryEntry] {
        self.history.list()
    }

    pub fn get_response(&self, entry_id: &str) -> Option<&HistoryEntry> {
        self.history.get(entry_id)
    }

    pub fn clear_responses(&mut self) {
        self.history.clear();
    }
}
