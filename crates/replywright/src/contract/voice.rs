use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::ResponseContract;

/// Writing-style trait name (tone, formality, warmth, ...) to a short description.
pub type VoiceProfile = BTreeMap<String, String>;

/// Replaces the contract's voice constraints with `voice_profile`; no-op when
/// the profile is absent or empty.
pub fn apply_voice_constraints(
    mut contract: ResponseContract,
    voice_profile: Option<&VoiceProfile>,
) -> ResponseContract {
    if let Some(profile) = voice_profile.filter(|p| !p.is_empty()) {
        contract.voice_constraints = profile.clone();
    }
    contract
}

/// Builds a profile from a JSON object, stringifying non-string values.
pub fn voice_profile_from_json(object: Map<String, Value>) -> VoiceProfile {
    object
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let description = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (name, description)
        })
        .collect()
}
