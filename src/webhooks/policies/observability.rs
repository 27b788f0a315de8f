//! Observability integration policy.
//!
//! ServiceMonitors and PrometheusRules are Prometheus Operator resources and
//! the data source is a Grafana Operator resource, so each needs its gate.
//! PrometheusRules alert on scraped metrics and therefore also need
//! ServiceMonitors.

use super::{ValidationResult, spec_path};
use crate::config::FeatureGates;
use crate::crd::{MetricsSpec, TempoMonolithicSpec};
use crate::webhooks::field::FieldPath;

pub const SERVICE_MONITORS_REQUIRE_GATE: &str =
    "the prometheusOperator feature gate must be enabled to create ServiceMonitors for Tempo components";
pub const PROMETHEUS_RULES_REQUIRE_GATE: &str =
    "the prometheusOperator feature gate must be enabled to create PrometheusRules for Tempo components";
pub const PROMETHEUS_RULES_REQUIRE_SERVICE_MONITORS: &str =
    "serviceMonitors must be enabled to create PrometheusRules (the rules alert based on collected metrics)";
pub const DATA_SOURCE_REQUIRES_GATE: &str =
    "the grafanaOperator feature gate must be enabled to create a data source for Tempo";

fn metrics_path() -> FieldPath {
    spec_path().child("observability").child("metrics")
}

fn metrics(spec: &TempoMonolithicSpec) -> Option<&MetricsSpec> {
    spec.observability.as_ref()?.metrics.as_ref()
}

/// `spec.observability.metrics.serviceMonitors.enabled` requires the prometheusOperator gate
pub fn validate_service_monitors(
    spec: &TempoMonolithicSpec,
    gates: &FeatureGates,
    result: &mut ValidationResult,
) {
    let enabled = metrics(spec)
        .and_then(|m| m.service_monitors.as_ref())
        .is_some_and(|sm| sm.enabled);

    if enabled && !gates.prometheus_operator {
        result.invalid(
            metrics_path().child("serviceMonitors").child("enabled"),
            true,
            SERVICE_MONITORS_REQUIRE_GATE,
        );
    }
}

/// `spec.observability.metrics.prometheusRules.enabled` requires the
/// prometheusOperator gate and enabled ServiceMonitors
pub fn validate_prometheus_rules(
    spec: &TempoMonolithicSpec,
    gates: &FeatureGates,
    result: &mut ValidationResult,
) {
    let Some(metrics) = metrics(spec) else {
        return;
    };
    let enabled = metrics.prometheus_rules.as_ref().is_some_and(|pr| pr.enabled);
    if !enabled {
        return;
    }

    let path = metrics_path().child("prometheusRules").child("enabled");
    let service_monitors = metrics.service_monitors.as_ref().is_some_and(|sm| sm.enabled);
    if !gates.prometheus_operator {
        result.invalid(path, true, PROMETHEUS_RULES_REQUIRE_GATE);
    } else if !service_monitors {
        result.invalid(path, true, PROMETHEUS_RULES_REQUIRE_SERVICE_MONITORS);
    }
}

/// `spec.observability.grafana.dataSource.enabled` requires the grafanaOperator gate
pub fn validate_grafana_data_source(
    spec: &TempoMonolithicSpec,
    gates: &FeatureGates,
    result: &mut ValidationResult,
) {
    let enabled = spec
        .observability
        .as_ref()
        .and_then(|o| o.grafana.as_ref())
        .and_then(|g| g.data_source.as_ref())
        .is_some_and(|ds| ds.enabled);

    if enabled && !gates.grafana_operator {
        result.invalid(
            spec_path()
                .child("observability")
                .child("grafana")
                .child("dataSource")
                .child("enabled"),
            true,
            DATA_SOURCE_REQUIRES_GATE,
        );
    }
}
