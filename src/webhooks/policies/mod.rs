//! Validation policies for TempoMonolithic admission.
//!
//! Every rule in [`RULES`] runs on every call, in declaration order, so a
//! single request reports all violations at once and the output order is
//! stable:
//! - Jaeger UI: ingress and route require the UI (route also requires the
//!   openshiftRoute gate)
//! - Observability: ServiceMonitors, PrometheusRules and the Grafana data
//!   source require their operator gates; PrometheusRules require ServiceMonitors
//! - Extra config: always warns

pub mod extra_config;
pub mod jaeger_ui;
pub mod observability;

use crate::config::FeatureGates;
use crate::crd::TempoMonolithicSpec;
use crate::webhooks::field::{FieldError, FieldPath};

/// Warnings and field errors produced by a validation run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationResult {
    /// Non-blocking messages returned to the client
    pub warnings: Vec<String>,
    /// Rejected fields; any entry denies the request
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    /// Record an invalid field value
    pub fn invalid(
        &mut self,
        path: FieldPath,
        value: impl Into<serde_json::Value>,
        message: &str,
    ) {
        self.errors.push(FieldError::invalid(path, value, message));
    }

    /// Whether the request may be admitted
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable denial in the API server's `Invalid` format.
    ///
    /// `TempoMonolithic.tempo.grafana.com "sample" is invalid: <errors>`, with
    /// multiple errors wrapped in brackets.
    pub fn denial_message(&self, group_kind: &str, name: &str) -> String {
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        let detail = match errors.as_slice() {
            [single] => single.clone(),
            _ => format!("[{}]", errors.join(", ")),
        };
        format!("{} \"{}\" is invalid: {}", group_kind, name, detail)
    }
}

/// A single validation rule
pub type Rule = fn(&TempoMonolithicSpec, &FeatureGates, &mut ValidationResult);

/// All rules, in evaluation order
pub const RULES: &[Rule] = &[
    jaeger_ui::validate_ingress,
    jaeger_ui::validate_route,
    observability::validate_service_monitors,
    observability::validate_prometheus_rules,
    observability::validate_grafana_data_source,
    extra_config::validate,
];

/// Run all validation rules against a spec
pub fn validate(spec: &TempoMonolithicSpec, gates: &FeatureGates) -> ValidationResult {
    let mut result = ValidationResult::new();
    for rule in RULES {
        rule(spec, gates, &mut result);
    }
    result
}

/// Path of the `spec` root
pub(crate) fn spec_path() -> FieldPath {
    FieldPath::new("spec")
}
