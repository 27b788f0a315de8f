//! TempoMonolithic Custom Resource Definition.
//!
//! Defines the TempoMonolithic CRD for running Tempo as a single process.
//! Optional features are modelled as `Option` sub-specs, each with its own
//! `enabled` flag, so an omitted section is distinguishable from one that is
//! explicitly disabled.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use serde::{Deserialize, Serialize};

/// TempoMonolithic is a custom resource for deploying a single-binary Tempo.
///
/// Example:
/// ```yaml
/// apiVersion: tempo.grafana.com/v1alpha1
/// kind: TempoMonolithic
/// metadata:
///   name: sample
/// spec:
///   jaegerui:
///     enabled: true
///     route:
///       enabled: true
///   observability:
///     metrics:
///       serviceMonitors:
///         enabled: true
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "tempo.grafana.com",
    version = "v1alpha1",
    kind = "TempoMonolithic",
    plural = "tempomonolithics",
    shortname = "tempomono",
    status = "TempoMonolithicStatus",
    namespaced,
    printcolumn = r#"{"name":"Tempo Version", "type":"string", "jsonPath":".status.tempoVersion"}"#,
    printcolumn = r#"{"name":"Jaeger UI", "type":"boolean", "jsonPath":".spec.jaegerui.enabled"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TempoMonolithicSpec {
    /// Container images. Operator defaults apply to unset entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImagesSpec>,

    /// Receiver configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion: Option<IngestionSpec>,

    /// Jaeger UI (query frontend) configuration.
    #[serde(default, rename = "jaegerui", skip_serializing_if = "Option::is_none")]
    pub jaeger_ui: Option<JaegerUiSpec>,

    /// Self-monitoring of the Tempo deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilitySpec>,

    /// Raw overrides merged over the generated Tempo configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_config: Option<ExtraConfigSpec>,
}

/// Container image overrides.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImagesSpec {
    /// Tempo image (e.g. docker.io/grafana/tempo:2.7.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,

    /// Tempo Query image serving the Jaeger UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_query: Option<String>,
}

/// Receiver configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSpec {
    /// TLS settings for the OTLP receivers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSpec>,
}

/// TLS configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// Enable TLS.
    #[serde(default)]
    pub enabled: bool,

    /// Name of a ConfigMap containing a CA certificate (service-ca.crt).
    /// Must live in the same namespace as the TempoMonolithic.
    #[serde(default, rename = "caName", skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,

    /// Name of a Secret containing a certificate (tls.crt) and private key (tls.key).
    /// Must live in the same namespace as the TempoMonolithic.
    #[serde(default, rename = "certName", skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,

    /// Minimum acceptable TLS version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
}

/// Jaeger UI configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JaegerUiSpec {
    /// Deploy the Jaeger UI.
    #[serde(default)]
    pub enabled: bool,

    /// Expose the Jaeger UI through a Kubernetes Ingress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<JaegerUiIngressSpec>,

    /// Expose the Jaeger UI through an OpenShift Route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<JaegerUiRouteSpec>,
}

/// Ingress for the Jaeger UI.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JaegerUiIngressSpec {
    /// Create the Ingress.
    #[serde(default)]
    pub enabled: bool,

    /// Hostname of the Ingress rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// IngressClass to use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,

    /// Additional annotations for the Ingress.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// OpenShift Route for the Jaeger UI.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JaegerUiRouteSpec {
    /// Create the Route.
    #[serde(default)]
    pub enabled: bool,

    /// Hostname of the Route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// TLS termination type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<RouteTermination>,
}

/// TLS termination of an OpenShift Route.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RouteTermination {
    Edge,
    Passthrough,
    Reencrypt,
    Insecure,
}

/// Self-monitoring configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObservabilitySpec {
    /// Metrics collection and alerting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSpec>,

    /// Grafana integration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grafana: Option<GrafanaSpec>,
}

/// Metrics configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSpec {
    /// ServiceMonitors scraping the Tempo components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_monitors: Option<ServiceMonitorsSpec>,

    /// PrometheusRules alerting on the collected metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus_rules: Option<PrometheusRulesSpec>,
}

/// ServiceMonitor configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ServiceMonitorsSpec {
    /// Create ServiceMonitors (requires the Prometheus Operator).
    #[serde(default)]
    pub enabled: bool,
}

/// PrometheusRule configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PrometheusRulesSpec {
    /// Create PrometheusRules (requires the Prometheus Operator and ServiceMonitors).
    #[serde(default)]
    pub enabled: bool,
}

/// Grafana configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaSpec {
    /// Grafana data source pointing at this Tempo instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSourceSpec>,
}

/// Grafana data source configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct DataSourceSpec {
    /// Create a GrafanaDatasource (requires the Grafana Operator).
    #[serde(default)]
    pub enabled: bool,
}

/// Raw configuration overrides.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ExtraConfigSpec {
    /// Merged over the generated Tempo configuration file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "raw_json_schema")]
    pub tempo: Option<serde_json::Value>,
}

/// Schema for free-form JSON that the API server must keep as-is.
fn raw_json_schema(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        ..Default::default()
    };
    schema.extensions.insert(
        "x-kubernetes-preserve-unknown-fields".to_string(),
        serde_json::Value::Bool(true),
    );
    Schema::Object(schema)
}

impl TempoMonolithicSpec {
    /// Whether the Jaeger UI is deployed.
    pub fn jaeger_ui_enabled(&self) -> bool {
        self.jaeger_ui.as_ref().is_some_and(|ui| ui.enabled)
    }
}

/// Status of a TempoMonolithic.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TempoMonolithicStatus {
    /// Version of the Tempo image in use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_version: Option<String>,

    /// Version of the Tempo Query image in use (set while the Jaeger UI is enabled).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_query_version: Option<String>,

    /// The generation most recently observed by the controller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Conditions describing the current state.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition describes the state of a TempoMonolithic at a certain point.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition.
    pub r#type: String,
    /// Status of the condition ("True", "False", "Unknown").
    pub status: String,
    /// Machine-readable reason for the condition's last transition.
    pub reason: String,
    /// Human-readable message indicating details about last transition.
    pub message: String,
    /// Last time the condition transitioned from one status to another.
    pub last_transition_time: String,
    /// The generation of the resource this condition was observed for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// Create a new condition.
    pub fn new(
        condition_type: &str,
        status: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status: if status {
                "True".to_string()
            } else {
                "False".to_string()
            },
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: jiff::Timestamp::now().to_string(),
            observed_generation: generation,
        }
    }

    /// Create a "ConfigurationError" condition.
    pub fn configuration_error(
        failed: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Self {
        Self::new(
            &ConditionType::ConfigurationError.to_string(),
            failed,
            reason,
            message,
            generation,
        )
    }

    /// Whether two conditions carry the same observation, ignoring transition time.
    pub fn same_observation(&self, other: &Condition) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
            && self.observed_generation == other.observed_generation
    }
}

/// Types of conditions for TempoMonolithic.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    /// The spec violates a feature dependency or gate.
    ConfigurationError,
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionType::ConfigurationError => write!(f, "ConfigurationError"),
        }
    }
}
