use duration_string::DurationString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::consts::{DEFAULT_FUZZY_CUTOFF, DEFAULT_MIN_MATCH_SCORE};
use crate::errors::ConfigError;

pub const DEFAULT_GENERATOR_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GENERATOR_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_REFINED_WORDS: usize = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPaths {
    pub pain_points: String,
    pub god_mode_prompts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matching {
    #[serde(default = "default_min_score")]
    pub min_score: usize,
    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f64,
}

impl Default for Matching {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_MATCH_SCORE,
            fuzzy_cutoff: DEFAULT_FUZZY_CUTOFF,
        }
    }
}

fn default_min_score() -> usize {
    DEFAULT_MIN_MATCH_SCORE
}

fn default_fuzzy_cutoff() -> f64 {
    DEFAULT_FUZZY_CUTOFF
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Refiner {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// Applied to every generation call in place of the per-operation defaults.
    pub timeout: Option<DurationString>,
    pub max_words: Option<usize>,
    pub forbidden_phrases: Option<Vec<String>>,
}

impl Refiner {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GENERATOR_ENDPOINT)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GENERATOR_MODEL)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.clone().map(Duration::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Sessions {
    /// Sessions untouched for this long are dropped.
    pub idle_timeout: Option<DurationString>,
    pub max_sessions: Option<usize>,
}

impl Sessions {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout.clone().map(Duration::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Logging {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub version: String,
    pub catalog: CatalogPaths,
    #[serde(default)]
    pub matching: Matching,
    pub refiner: Option<Refiner>,
    pub sessions: Option<Sessions>,
    pub logging: Option<Logging>,
}

impl Configuration {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }
}
