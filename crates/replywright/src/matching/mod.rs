//! Pain point matching.
//!
//! Two independent strategies live here and are never merged:
//! [`match_pain_point`] scores keyword containment over the normalized message,
//! while [`fuzzy_match`] finds the single catalog keyword closest to the raw
//! message. Callers report both.

use common::catalog::PainPoint;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NO_MATCH_REASON: &str = "No strong lexical overlap with known pain points.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainPointMatch {
    pub matched: bool,
    pub pain_point: Option<PainPoint>,
    /// In [0, 1], rounded to two decimals.
    pub confidence: f64,
    pub reason: String,
    pub score: usize,
}

impl PainPointMatch {
    pub fn unmatched() -> Self {
        Self {
            matched: false,
            pain_point: None,
            confidence: 0.0,
            reason: NO_MATCH_REASON.to_string(),
            score: 0,
        }
    }

    /// Tags of the matched pain point; empty when unmatched.
    pub fn tags(&self) -> &[String] {
        self.pain_point
            .as_ref()
            .map(|p| p.pain_point_tags.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyHint {
    pub pain_point_id: String,
    pub keyword: String,
    pub similarity: f64,
}

/// Lower-cases and replaces every character outside `[a-z0-9]` and whitespace with a space.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Number of tags contained in the normalized text.
///
/// Tags are compared as written, so a tag with upper-case letters or
/// punctuation never matches normalized text.
pub fn score_match(normalized: &str, tags: &[String]) -> usize {
    tags.iter()
        .filter(|tag| normalized.contains(tag.as_str()))
        .count()
}

pub fn match_pain_point(
    customer_message: &str,
    pain_points: &[PainPoint],
    min_score: usize,
) -> PainPointMatch {
    let text = normalize(customer_message);

    let mut best: Option<(&PainPoint, usize)> = None;
    for pain_point in pain_points {
        let score = score_match(&text, &pain_point.pain_point_tags);
        if score < min_score {
            continue;
        }
        if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
            best = Some((pain_point, score));
        }
    }

    let Some((pain_point, score)) = best else {
        debug!(min_score, "no pain point cleared the minimum score");
        return PainPointMatch::unmatched();
    };

    let tag_count = pain_point.pain_point_tags.len().max(1);
    let confidence = (score as f64 / tag_count as f64).min(1.0);

    debug!(pain_point = %pain_point.id, score, "matched pain point");

    PainPointMatch {
        matched: true,
        pain_point: Some(pain_point.clone()),
        confidence: (confidence * 100.0).round() / 100.0,
        reason: format!("Matched on {} keyword signals.", score),
        score,
    }
}

/// Closest single keyword by normalized Levenshtein similarity, if it clears `cutoff`.
pub fn fuzzy_match(
    customer_message: &str,
    pain_points: &[PainPoint],
    cutoff: f64,
) -> Option<FuzzyHint> {
    let input = customer_message.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let mut best: Option<FuzzyHint> = None;
    for pain_point in pain_points {
        for keyword in &pain_point.pain_point_tags {
            let similarity = strsim::normalized_levenshtein(&input, &keyword.to_lowercase());
            if similarity < cutoff {
                continue;
            }
            let closer = best
                .as_ref()
                .map(|b| similarity > b.similarity)
                .unwrap_or(true);
            if closer {
                best = Some(FuzzyHint {
                    pain_point_id: pain_point.id.clone(),
                    keyword: keyword.clone(),
                    similarity,
                });
            }
        }
    }

    best
}
