//! Extra configuration policy.
//!
//! Raw overrides bypass everything the operator generates, so their presence
//! is always flagged. Never blocks admission.

use super::ValidationResult;
use crate::config::FeatureGates;
use crate::crd::TempoMonolithicSpec;

pub const EXTRA_CONFIG_WARNING: &str =
    "overriding Tempo configuration could potentially break the deployment, use it carefully";

/// Warn whenever `spec.extraConfig` is set
pub fn validate(spec: &TempoMonolithicSpec, _gates: &FeatureGates, result: &mut ValidationResult) {
    if spec.extra_config.is_some() {
        result.warn(EXTRA_CONFIG_WARNING);
    }
}
