// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles non-empty artifact source lists and positive history lengths.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::artifact::ArtifactSource;

pub fn deserialize_sources<'de, D>(deserializer: D) -> Result<NonEmpty<ArtifactSource>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sources: Vec<ArtifactSource> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(sources)
        .ok_or_else(|| serde::de::Error::custom("an artifact needs at least one source"))
}

pub fn deserialize_history_length<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let length = usize::deserialize(deserializer)?;
    if length == 0 {
        return Err(serde::de::Error::custom(
            "history_length must keep at least one artifact",
        ));
    }
    Ok(length)
}
