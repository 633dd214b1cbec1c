use common::configuration::{Refiner as RefinerConfig, DEFAULT_MAX_REFINED_WORDS};
use std::fmt;

pub const DEFAULT_FORBIDDEN_PHRASES: [&str; 7] = [
    "we guarantee",
    "i promise",
    "refund",
    "compensation",
    "legal action",
    "policy states",
    "terms and conditions",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintViolation {
    Empty,
    TooLong { words: usize, max_words: usize },
    ForbiddenPhrase(String),
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintViolation::Empty => write!(f, "empty output"),
            ConstraintViolation::TooLong { words, max_words } => {
                write!(f, "{} words exceeds limit of {}", words, max_words)
            }
            ConstraintViolation::ForbiddenPhrase(phrase) => {
                write!(f, "contains forbidden phrase '{}'", phrase)
            }
        }
    }
}

/// Hard limits every refined reply must respect before it is shown to anyone.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConstraints {
    pub max_words: usize,
    /// Lower-cased.
    pub forbidden_phrases: Vec<String>,
}

impl Default for OutputConstraints {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_REFINED_WORDS,
            forbidden_phrases: DEFAULT_FORBIDDEN_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl OutputConstraints {
    pub fn from_config(config: &RefinerConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_words: config.max_words.unwrap_or(defaults.max_words),
            forbidden_phrases: config
                .forbidden_phrases
                .as_ref()
                .map(|phrases| {
                    // a blank phrase is a substring of every reply
                    phrases
                        .iter()
                        .map(|p| p.trim().to_lowercase())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.forbidden_phrases),
        }
    }

    pub fn check(&self, text: &str) -> Result<(), ConstraintViolation> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConstraintViolation::Empty);
        }

        let words = text.split_whitespace().count();
        if words > self.max_words {
            return Err(ConstraintViolation::TooLong {
                words,
                max_words: self.max_words,
            });
        }

        let lowered = text.to_lowercase();
        if let Some(phrase) = self
            .forbidden_phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
        {
            return Err(ConstraintViolation::ForbiddenPhrase(phrase.clone()));
        }

        Ok(())
    }
}
