//! Emotional-intensity signals for a single customer message.
//!
//! The signals are lexical heuristics only: runs of `!`/`?`, shouted words,
//! negative keywords and short clipped sentences. They are cheap enough to run on
//! every draft request and never fail.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Case-insensitive keywords counted as negative sentiment, matched as substrings.
const NEGATIVE_KEYWORDS: &[&str] = &[
    "frustrated",
    "frustrating",
    "angry",
    "annoyed",
    "ridiculous",
    "unacceptable",
    "terrible",
    "horrible",
    "awful",
    "worst",
    "useless",
    "disappointed",
    "furious",
    "nothing works",
    "not working",
    "broken",
    "waste",
    "fed up",
    "hate",
    "cancel",
];

const BURST_WEIGHT: u32 = 10;
const BURST_CAP: u32 = 25;
const CAPS_WEIGHT: u32 = 10;
const CAPS_CAP: u32 = 30;
const KEYWORD_WEIGHT: u32 = 12;
const KEYWORD_CAP: u32 = 35;
const SHORT_SENTENCE_BONUS: u32 = 10;
const SHORT_SENTENCE_WORDS: f64 = 6.0;

const HIGH_THRESHOLD: u8 = 65;
const MEDIUM_THRESHOLD: u8 = 35;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityLabel {
    Low,
    Medium,
    High,
}

impl IntensityLabel {
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_THRESHOLD {
            IntensityLabel::High
        } else if score >= MEDIUM_THRESHOLD {
            IntensityLabel::Medium
        } else {
            IntensityLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityLabel::Low => "low",
            IntensityLabel::Medium => "medium",
            IntensityLabel::High => "high",
        }
    }
}

impl fmt::Display for IntensityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw counters behind an intensity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSignals {
    pub punctuation_bursts: usize,
    pub all_caps_words: usize,
    pub negative_keyword_hits: usize,
    pub mean_sentence_words: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalIntensity {
    /// 0..=100
    pub score: u8,
    pub label: IntensityLabel,
    /// `None` for empty input.
    pub signals: Option<TextSignals>,
}

impl EmotionalIntensity {
    fn calm() -> Self {
        Self {
            score: 0,
            label: IntensityLabel::Low,
            signals: None,
        }
    }

    /// One-line description used when the caller supplies no empathy summary.
    pub fn summary(&self) -> String {
        format!(
            "Customer message reads as {} emotional intensity ({}/100).",
            self.label, self.score
        )
    }
}

// ============================================================================
// Signal extraction
// ============================================================================

/// Number of maximal `!`/`?` runs at least two characters long.
pub fn count_punctuation_bursts(text: &str) -> usize {
    let mut bursts = 0;
    let mut run = 0;

    for c in text.chars() {
        if c == '!' || c == '?' {
            run += 1;
            continue;
        }
        if run >= 2 {
            bursts += 1;
        }
        run = 0;
    }
    if run >= 2 {
        bursts += 1;
    }

    bursts
}

/// Number of maximal alphabetic runs of length >= 3 written entirely in upper case.
pub fn count_all_caps_words(text: &str) -> usize {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|word| word.chars().count() >= 3 && word.chars().all(char::is_uppercase))
        .count()
}

pub fn count_negative_keywords(text: &str) -> usize {
    let lowered = text.to_lowercase();
    NEGATIVE_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count()
}

/// Mean whitespace-separated word count over non-blank sentences; 0 when there are none.
pub fn mean_sentence_words(text: &str) -> f64 {
    let counts: Vec<usize> = text
        .split(['.', '!', '?'])
        .filter(|sentence| !sentence.trim().is_empty())
        .map(|sentence| sentence.split_whitespace().count())
        .collect();

    if counts.is_empty() {
        return 0.0;
    }
    counts.iter().sum::<usize>() as f64 / counts.len() as f64
}

pub fn extract_signals(text: &str) -> TextSignals {
    TextSignals {
        punctuation_bursts: count_punctuation_bursts(text),
        all_caps_words: count_all_caps_words(text),
        negative_keyword_hits: count_negative_keywords(text),
        mean_sentence_words: mean_sentence_words(text),
    }
}

// ============================================================================
// Scoring
// ============================================================================

fn capped(count: usize, weight: u32, cap: u32) -> u32 {
    (count as u32).saturating_mul(weight).min(cap)
}

pub fn score_signals(signals: &TextSignals) -> u8 {
    let mut score = capped(signals.punctuation_bursts, BURST_WEIGHT, BURST_CAP)
        + capped(signals.all_caps_words, CAPS_WEIGHT, CAPS_CAP)
        + capped(signals.negative_keyword_hits, KEYWORD_WEIGHT, KEYWORD_CAP);

    if signals.mean_sentence_words > 0.0 && signals.mean_sentence_words < SHORT_SENTENCE_WORDS {
        score += SHORT_SENTENCE_BONUS;
    }

    score.min(100) as u8
}

pub fn analyze_intensity(text: &str) -> EmotionalIntensity {
    if text.trim().is_empty() {
        return EmotionalIntensity::calm();
    }

    let signals = extract_signals(text);
    let score = score_signals(&signals);

    EmotionalIntensity {
        score,
        label: IntensityLabel::from_score(score),
        signals: Some(signals),
    }
}
