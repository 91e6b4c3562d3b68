use serde::{Deserialize, Serialize};

use super::super::evidence::VerificationPolicy;
use crate::config::ReviewConfig;

/// Policy dials consumed by the evaluation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub verification_policy: VerificationPolicy,
}

impl From<&ReviewConfig> for EvaluationConfig {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            verification_policy: config.verification_policy,
        }
    }
}
