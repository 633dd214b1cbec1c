use serde::Serialize;
use serde_yaml::Value;
use std::fmt;

use super::parse_sections;
use crate::consts::PERSONA_SECTIONS;
use crate::errors::CatalogError;

/// Problems found on a single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryIssue {
    pub id: String,
    pub section: String,
    pub problems: Vec<String>,
}

impl fmt::Display for EntryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.id, self.section, self.problems.join(", "))
    }
}

/// Checks every God-Mode prompt entry for the fields drafting relies on.
///
/// Unlike loading, this does not skip anything: it reports every defect so the
/// catalog can be fixed upstream.
pub fn validate_god_mode_prompts(contents: &str) -> Result<Vec<EntryIssue>, CatalogError> {
    let sections = parse_sections("<validation>", contents)?;
    Ok(collect_issues(&sections, |entry| {
        let mut problems = Vec::new();

        if !is_non_empty_str(entry.get("persona")) {
            problems.push("missing 'persona'".to_string());
        }

        match entry.get("pain_point_tags") {
            None => problems.push("missing 'pain_point_tags'".to_string()),
            Some(tags) if is_empty_value(tags) => {
                problems.push("empty 'pain_point_tags'".to_string())
            }
            Some(_) => {}
        }

        // an absent key reads as an empty mapping, so both tones are reported
        let no_prompts = serde_yaml::Mapping::new();
        let prompts = match entry.get("prompts") {
            None => Some(&no_prompts),
            Some(Value::Mapping(prompts)) => Some(prompts),
            Some(_) => None,
        };
        match prompts {
            Some(prompts) => {
                for tone in ["safe", "direct"] {
                    let usable = prompts
                        .get(tone)
                        .map(|variants| !is_empty_value(variants))
                        .unwrap_or(false);
                    if !usable {
                        problems.push(format!("missing 'prompts.{}'", tone));
                    }
                }
            }
            None => problems.push("missing or invalid 'prompts'".to_string()),
        }

        problems
    }))
}

pub fn validate_pain_points(contents: &str) -> Result<Vec<EntryIssue>, CatalogError> {
    let sections = parse_sections("<validation>", contents)?;
    Ok(collect_issues(&sections, |entry| {
        let mut problems = Vec::new();

        if !is_non_empty_str(entry.get("id")) {
            problems.push("missing 'id'".to_string());
        }

        let tags = entry
            .get("pain_point_tags")
            .or_else(|| entry.get("keywords"));
        match tags {
            None => problems.push("missing 'pain_point_tags'".to_string()),
            Some(tags) if is_empty_value(tags) => {
                problems.push("empty 'pain_point_tags'".to_string())
            }
            Some(_) => {}
        }

        problems
    }))
}

fn collect_issues(
    sections: &serde_yaml::Mapping,
    check: impl Fn(&Value) -> Vec<String>,
) -> Vec<EntryIssue> {
    let mut issues = Vec::new();

    for section in PERSONA_SECTIONS {
        let Some(entries) = sections.get(section).and_then(|s| s.as_sequence()) else {
            continue;
        };

        for entry in entries {
            let problems = check(entry);
            if problems.is_empty() {
                continue;
            }
            issues.push(EntryIssue {
                id: entry
                    .get("id")
                    .and_then(|id| id.as_str())
                    .unwrap_or("UNKNOWN")
                    .to_string(),
                section: section.to_string(),
                problems,
            });
        }
    }

    issues
}

fn is_non_empty_str(value: Option<&Value>) -> bool {
    value
        .and_then(|v| v.as_str())
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}
