// ABOUTME: Decoding of deployment status messages posted by instances.
// ABOUTME: The wire format is `result:instance_id:output`.

use std::str::FromStr;

use crate::types::InstanceId;

/// One instance's report of what it deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentMessage {
    /// Free-form result word from the instance; not used for classification.
    pub result: String,
    pub instance_id: InstanceId,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("malformed deployment message (less than two colons): {0:?}")]
    TooFewFields(String),

    #[error("malformed deployment message (more than two colons): {0:?}")]
    TooManyFields(String),

    #[error("malformed deployment message (empty instance id): {0:?}")]
    EmptyInstance(String),
}

impl FromStr for DeploymentMessage {
    type Err = MessageError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split(':').collect();
        let [result, instance, output] = parts.as_slice() else {
            return Err(if parts.len() < 3 {
                MessageError::TooFewFields(raw.to_string())
            } else {
                MessageError::TooManyFields(raw.to_string())
            });
        };

        if instance.is_empty() {
            return Err(MessageError::EmptyInstance(raw.to_string()));
        }

        Ok(DeploymentMessage {
            result: (*result).to_string(),
            instance_id: InstanceId::new(*instance),
            output: (*output).to_string(),
        })
    }
}
