//! Pain-point and God-Mode prompt catalogs.
//!
//! Both catalogs are YAML mappings keyed by persona section (`sales`, `support`,
//! `success`), each section holding a list of entries. Entries are deserialized
//! one at a time so that a malformed entry is skipped with a warning instead of
//! failing the whole file.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{formats::PreferMany, serde_as, OneOrMany};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::consts::{PERSONA_SECTIONS, WILDCARD_TAG};
use crate::errors::CatalogError;

pub mod validation;

/// Stance used to pick instruction variants from a God-Mode prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Safe,
    Direct,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Safe => "safe",
            Tone::Direct => "direct",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safe" => Ok(Tone::Safe),
            "direct" => Ok(Tone::Direct),
            other => Err(format!("unknown tone '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PainPoint {
    pub id: String,
    /// Section the entry was loaded from.
    #[serde(default)]
    pub persona: String,
    #[serde(alias = "keywords")]
    pub pain_point_tags: Vec<String>,
    pub description: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GodModePrompt {
    pub id: Option<String>,
    pub persona: String,
    pub fingerprint_id: Option<String>,
    #[serde(default)]
    pub pain_point_tags: Vec<String>,
    /// Tone name to instruction variants. A single string in YAML is read as one variant.
    #[serde_as(as = "Option<BTreeMap<_, OneOrMany<_, PreferMany>>>")]
    pub prompts: Option<BTreeMap<String, Vec<String>>>,
    #[serde_as(as = "Option<OneOrMany<_, PreferMany>>")]
    pub psychology_used: Option<Vec<String>>,
    #[serde_as(as = "Option<OneOrMany<_, PreferMany>>")]
    pub inspired_by: Option<Vec<String>>,
}

impl GodModePrompt {
    /// Identifier used in logs and reports; catalogs may omit `id`.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("UNKNOWN")
    }

    pub fn is_wildcard(&self) -> bool {
        self.pain_point_tags.iter().any(|t| t == WILDCARD_TAG)
    }

    pub fn has_tone(&self, tone: Tone) -> bool {
        self.prompts
            .as_ref()
            .map(|p| p.contains_key(tone.as_str()))
            .unwrap_or(false)
    }

    /// Non-blank variants for a tone, in catalog order.
    pub fn variants(&self, tone: Tone) -> Vec<&str> {
        self.prompts
            .as_ref()
            .and_then(|p| p.get(tone.as_str()))
            .map(|variants| {
                variants
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Both catalogs, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub pain_points: Vec<PainPoint>,
    pub god_mode_prompts: Vec<GodModePrompt>,
}

impl Catalog {
    pub fn new(pain_points: Vec<PainPoint>, god_mode_prompts: Vec<GodModePrompt>) -> Self {
        Self {
            pain_points,
            god_mode_prompts,
        }
    }

    pub fn load(
        pain_points_path: impl AsRef<Path>,
        god_mode_prompts_path: impl AsRef<Path>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            pain_points: load_pain_points(pain_points_path)?,
            god_mode_prompts: load_god_mode_prompts(god_mode_prompts_path)?,
        })
    }

    /// Pain points loaded from the given persona's section (case-insensitive).
    pub fn pain_points_for(&self, persona: &str) -> Vec<PainPoint> {
        self.pain_points
            .iter()
            .filter(|p| p.persona.eq_ignore_ascii_case(persona))
            .cloned()
            .collect()
    }
}

pub fn load_pain_points(path: impl AsRef<Path>) -> Result<Vec<PainPoint>, CatalogError> {
    let (label, contents) = read_catalog(path.as_ref())?;
    parse_pain_points_from(&label, &contents)
}

pub fn load_god_mode_prompts(path: impl AsRef<Path>) -> Result<Vec<GodModePrompt>, CatalogError> {
    let (label, contents) = read_catalog(path.as_ref())?;
    parse_god_mode_prompts_from(&label, &contents)
}

pub fn parse_pain_points(contents: &str) -> Result<Vec<PainPoint>, CatalogError> {
    parse_pain_points_from("<inline>", contents)
}

pub fn parse_god_mode_prompts(contents: &str) -> Result<Vec<GodModePrompt>, CatalogError> {
    parse_god_mode_prompts_from("<inline>", contents)
}

fn parse_pain_points_from(label: &str, contents: &str) -> Result<Vec<PainPoint>, CatalogError> {
    let sections = parse_sections(label, contents)?;
    let mut pain_points = Vec::new();

    for_each_entry::<PainPoint>(label, &sections, |section, mut entry| {
        entry.pain_point_tags.retain(|t| !t.trim().is_empty());
        if entry.id.trim().is_empty() {
            return Err("missing 'id'".to_string());
        }
        if entry.pain_point_tags.is_empty() {
            return Err("empty 'pain_point_tags'".to_string());
        }
        entry.persona = section.to_string();
        pain_points.push(entry);
        Ok(())
    });

    debug!("loaded {} pain points from {}", pain_points.len(), label);
    Ok(pain_points)
}

fn parse_god_mode_prompts_from(
    label: &str,
    contents: &str,
) -> Result<Vec<GodModePrompt>, CatalogError> {
    let sections = parse_sections(label, contents)?;
    let mut prompts = Vec::new();

    for_each_entry::<GodModePrompt>(label, &sections, |_, entry| {
        if entry.persona.trim().is_empty() {
            return Err("missing 'persona'".to_string());
        }
        if entry.prompts.is_none() {
            warn!(
                "god mode prompt {} in {} has no 'prompts' mapping; it cannot supply variants",
                entry.label(),
                label
            );
        }
        prompts.push(entry);
        Ok(())
    });

    debug!("loaded {} god mode prompts from {}", prompts.len(), label);
    Ok(prompts)
}

fn read_catalog(path: &Path) -> Result<(String, String), CatalogError> {
    let label = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: label.clone(),
        source,
    })?;
    Ok((label, contents))
}

pub(crate) fn parse_sections(
    label: &str,
    contents: &str,
) -> Result<serde_yaml::Mapping, CatalogError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(contents).map_err(|source| CatalogError::Yaml {
            path: label.to_string(),
            source,
        })?;

    match value {
        serde_yaml::Value::Mapping(mapping) => {
            for key in mapping.keys() {
                let known = key
                    .as_str()
                    .map(|k| PERSONA_SECTIONS.contains(&k))
                    .unwrap_or(false);
                if !known {
                    warn!("ignoring unknown catalog section {:?} in {}", key, label);
                }
            }
            Ok(mapping)
        }
        // an empty file parses as null
        serde_yaml::Value::Null => Ok(serde_yaml::Mapping::new()),
        _ => Err(CatalogError::NotAMapping(label.to_string())),
    }
}

/// Visits every entry of the known sections in order, skipping entries that fail
/// to deserialize or that `accept` rejects.
fn for_each_entry<T: DeserializeOwned>(
    label: &str,
    sections: &serde_yaml::Mapping,
    mut accept: impl FnMut(&str, T) -> Result<(), String>,
) {
    for section in PERSONA_SECTIONS {
        let Some(entries) = sections.get(section) else {
            continue;
        };
        let Some(entries) = entries.as_sequence() else {
            warn!("section '{}' in {} is not a list, skipping", section, label);
            continue;
        };

        for (index, raw) in entries.iter().enumerate() {
            let entry_id = raw
                .get("id")
                .and_then(|id| id.as_str())
                .unwrap_or("UNKNOWN")
                .to_string();

            let outcome = serde_yaml::from_value::<T>(raw.clone())
                .map_err(|err| err.to_string())
                .and_then(|entry| accept(section, entry));

            if let Err(reason) = outcome {
                warn!(
                    "skipping catalog entry {} ({}[{}]) in {}: {}",
                    entry_id, section, index, label, reason
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAIN_POINTS: &str = r#"
sales:
  - id: pricing_objection
    pain_point_tags: [pricing, cost, expensive]
    description: Customer pushes back on price
  - id: broken_entry
    pain_point_tags: []
  - pain_point_tags: [orphan]
support:
  - id: login_failure
    keywords: [login, password, locked]
success:
  - id: churn_risk
    pain_point_tags: [cancel, renewal]
"#;

    const PROMPTS: &str = r#"
sales:
  - id: gm_sales_price
    persona: sales
    fingerprint_id: fp-001
    pain_point_tags: [pricing, cost]
    psychology_used: anchoring
    inspired_by: [Chris Voss, Cialdini]
    prompts:
      safe:
        - Validate the budget concern before discussing value.
        - Acknowledge that price matters.
      direct: State the value clearly and hold the price.
  - id: gm_missing_persona
    prompts:
      safe: [x]
support:
  - id: gm_support_wild
    persona: support
    pain_point_tags: [_wildcard]
    prompts:
      safe: Stay calm and specific.
  - id: gm_bad_prompts
    persona: support
    prompts: [not, a, mapping]
"#;

    #[test]
    fn test_parse_pain_points_skips_malformed_entries() {
        let pain_points = parse_pain_points(PAIN_POINTS).unwrap();
        let ids: Vec<&str> = pain_points.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["pricing_objection", "login_failure", "churn_risk"]);
        assert_eq!(pain_points[0].persona, "sales");
        assert_eq!(pain_points[1].persona, "support");
        assert_eq!(
            pain_points[1].pain_point_tags,
            vec!["login".to_string(), "password".to_string(), "locked".to_string()]
        );
    }

    #[test]
    fn test_parse_god_mode_prompts_accepts_one_or_many() {
        let prompts = parse_god_mode_prompts(PROMPTS).unwrap();
        let ids: Vec<&str> = prompts.iter().map(|p| p.label()).collect();
        assert_eq!(ids, vec!["gm_sales_price", "gm_support_wild"]);

        let sales = &prompts[0];
        assert_eq!(sales.variants(Tone::Safe).len(), 2);
        assert_eq!(
            sales.variants(Tone::Direct),
            vec!["State the value clearly and hold the price."]
        );
        assert_eq!(sales.psychology_used, Some(vec!["anchoring".to_string()]));
        assert_eq!(
            sales.inspired_by,
            Some(vec!["Chris Voss".to_string(), "Cialdini".to_string()])
        );
        assert!(prompts[1].is_wildcard());
        assert!(!prompts[1].has_tone(Tone::Direct));
    }

    #[test]
    fn test_pain_points_for_persona() {
        let catalog = Catalog::new(parse_pain_points(PAIN_POINTS).unwrap(), vec![]);
        let support = catalog.pain_points_for("SUPPORT");
        assert_eq!(support.len(), 1);
        assert_eq!(support[0].id, "login_failure");
        assert!(catalog.pain_points_for("marketing").is_empty());
    }

    #[test]
    fn test_non_mapping_catalog_is_rejected() {
        let err = parse_pain_points("- just\n- a list\n").unwrap_err();
        assert!(matches!(err, CatalogError::NotAMapping(_)));
    }

    #[test]
    fn test_empty_catalog_loads_nothing() {
        assert!(parse_god_mode_prompts("").unwrap().is_empty());
    }

    #[test]
    fn test_blank_variants_are_not_usable() {
        let prompts = parse_god_mode_prompts(
            r#"
support:
  - id: gm_blank
    persona: support
    prompts:
      direct: ["   ", ""]
"#,
        )
        .unwrap();
        assert!(prompts[0].has_tone(Tone::Direct));
        assert!(prompts[0].variants(Tone::Direct).is_empty());
    }

    #[test]
    fn test_tone_from_str() {
        assert_eq!("Safe".parse::<Tone>(), Ok(Tone::Safe));
        assert_eq!(" direct ".parse::<Tone>(), Ok(Tone::Direct));
        assert!("gentle".parse::<Tone>().is_err());
    }

    #[test]
    fn test_load_reference_catalogs() {
        let base = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/prompts");
        let catalog = Catalog::load(
            format!("{}/pain_points.yaml", base),
            format!("{}/god_mode_prompts.yaml", base),
        )
        .expect("reference catalogs not found");

        assert!(!catalog.pain_points.is_empty());
        assert!(!catalog.god_mode_prompts.is_empty());
        for persona in PERSONA_SECTIONS {
            assert!(
                catalog
                    .god_mode_prompts
                    .iter()
                    .any(|p| p.persona.eq_ignore_ascii_case(persona)),
                "no prompt for persona {}",
                persona
            );
        }
    }
}
