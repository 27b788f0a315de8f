// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Unit tests for tempo-operator.
//!
//! These tests run without a Kubernetes cluster and test individual
//! components in isolation.

#[path = "../common/fixtures.rs"]
mod fixtures;

mod crd_tests {
    use kube::CustomResourceExt;
    use tempo_operator::crd::{Condition, TempoMonolithic, TempoMonolithicStatus};

    #[test]
    fn test_crd_identity() {
        let crd = TempoMonolithic::crd();
        assert_eq!(
            crd.metadata.name.as_deref(),
            Some("tempomonolithics.tempo.grafana.com")
        );
        assert_eq!(crd.spec.group, "tempo.grafana.com");
        assert_eq!(crd.spec.names.kind, "TempoMonolithic");
        assert_eq!(
            crd.spec.names.short_names,
            Some(vec!["tempomono".to_string()])
        );
        assert_eq!(crd.spec.scope, "Namespaced");
    }

    #[test]
    fn test_crd_has_status_subresource() {
        let crd = TempoMonolithic::crd();
        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1alpha1");
        assert!(
            version
                .subresources
                .as_ref()
                .and_then(|s| s.status.as_ref())
                .is_some()
        );
    }

    #[test]
    fn test_status_serialization() {
        let status = TempoMonolithicStatus {
            tempo_version: Some("2.7.0".to_string()),
            tempo_query_version: None,
            observed_generation: Some(3),
            conditions: vec![Condition::configuration_error(false, "ValidSpec", "", Some(3))],
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["tempoVersion"], "2.7.0");
        assert!(json.get("tempoQueryVersion").is_none());
        assert_eq!(json["observedGeneration"], 3);
        assert_eq!(json["conditions"][0]["type"], "ConfigurationError");
        assert_eq!(json["conditions"][0]["status"], "False");
        assert!(json["conditions"][0]["lastTransitionTime"].is_string());
    }
}

mod config_tests {
    use std::path::Path;
    use tempo_operator::config::OperatorConfig;

    #[test]
    fn test_gates_from_yaml() {
        let config = OperatorConfig::from_yaml(
            Path::new("config.yaml"),
            r#"
gates:
  openshift:
    openshiftRoute: true
  prometheusOperator: true
defaultImages:
  tempo: quay.io/grafana/tempo:2.8.0
"#,
        )
        .unwrap();

        assert!(config.gates.openshift.openshift_route);
        assert!(config.gates.prometheus_operator);
        assert!(!config.gates.grafana_operator);
        assert_eq!(config.default_images.tempo, "quay.io/grafana/tempo:2.8.0");
        assert_eq!(
            config.default_images.tempo_query,
            "docker.io/grafana/tempo-query:2.7.0"
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = OperatorConfig::from_file(Path::new("/nonexistent/tempo-operator.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tempo-operator.yaml"));
    }
}

mod image_tests {
    use tempo_operator::image::{ImageReference, ImageReferenceError};

    #[test]
    fn test_tagged_reference() {
        let image = ImageReference::parse("docker.io/grafana/tempo:2.7.0").unwrap();
        assert_eq!(image.repository, "docker.io/grafana/tempo");
        assert_eq!(image.tag.as_deref(), Some("2.7.0"));
        assert_eq!(image.version(), "2.7.0");
    }

    #[test]
    fn test_registry_port_is_not_a_tag() {
        let image = ImageReference::parse("localhost:5000/tempo").unwrap();
        assert_eq!(image.repository, "localhost:5000/tempo");
        assert_eq!(image.tag, None);
        assert_eq!(image.version(), "latest");
    }

    #[test]
    fn test_digest_wins_over_tag() {
        let digest = format!("sha256:{}", "0".repeat(64));
        let image =
            ImageReference::parse(&format!("docker.io/grafana/tempo:2.7.0@{}", digest)).unwrap();
        assert_eq!(image.tag.as_deref(), Some("2.7.0"));
        assert_eq!(image.version(), digest);
    }

    #[test]
    fn test_rejected_references() {
        assert_eq!(ImageReference::parse(""), Err(ImageReferenceError::Empty));
        for reference in [
            "Grafana/Tempo",
            "tempo:",
            "tempo@sha256:short",
            ":2.7.0",
            "tempo:ünicode",
        ] {
            assert!(
                matches!(
                    ImageReference::parse(reference),
                    Err(ImageReferenceError::Invalid { .. })
                ),
                "{reference} should be rejected"
            );
        }
    }

    #[test]
    fn test_name_too_long() {
        let reference = format!("{}:1.0", "a".repeat(256));
        assert!(matches!(
            ImageReference::parse(&reference),
            Err(ImageReferenceError::NameTooLong { .. })
        ));
    }
}

mod webhook_tests {
    use tempo_operator::config::{FeatureGates, OpenShiftFeatureGates};
    use tempo_operator::crd::TempoMonolithicSpec;
    use tempo_operator::webhooks::policies::extra_config::EXTRA_CONFIG_WARNING;
    use tempo_operator::webhooks::policies::jaeger_ui::{
        INGRESS_REQUIRES_UI, ROUTE_REQUIRES_GATE, ROUTE_REQUIRES_UI,
    };
    use tempo_operator::webhooks::policies::observability::{
        DATA_SOURCE_REQUIRES_GATE, PROMETHEUS_RULES_REQUIRE_GATE,
        PROMETHEUS_RULES_REQUIRE_SERVICE_MONITORS, SERVICE_MONITORS_REQUIRE_GATE,
    };
    use tempo_operator::webhooks::{FieldError, FieldPath, validate};

    use crate::fixtures::{TempoMonolithicBuilder, all_gates, no_gates};

    struct Case {
        name: &'static str,
        gates: FeatureGates,
        spec: TempoMonolithicSpec,
        warnings: Vec<&'static str>,
        errors: Vec<(&'static str, &'static str)>,
    }

    fn path(dotted: &str) -> FieldPath {
        let mut segments = dotted.split('.');
        let mut path = FieldPath::new(segments.next().unwrap());
        for segment in segments {
            path = path.child(segment);
        }
        path
    }

    fn cases() -> Vec<Case> {
        vec![
            Case {
                name: "valid instance",
                gates: no_gates(),
                spec: TempoMonolithicSpec::default(),
                warnings: vec![],
                errors: vec![],
            },
            Case {
                name: "ingress enabled but Jaeger UI disabled",
                gates: no_gates(),
                spec: TempoMonolithicBuilder::default()
                    .jaeger_ui(false)
                    .ingress(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![("spec.jaegerui.ingress.enabled", INGRESS_REQUIRES_UI)],
            },
            Case {
                name: "route enabled but Jaeger UI disabled",
                gates: no_gates(),
                spec: TempoMonolithicBuilder::default()
                    .jaeger_ui(false)
                    .route(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![("spec.jaegerui.route.enabled", ROUTE_REQUIRES_UI)],
            },
            Case {
                name: "route enabled but openshiftRoute gate not set",
                gates: no_gates(),
                spec: TempoMonolithicBuilder::default()
                    .jaeger_ui(true)
                    .route(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![("spec.jaegerui.route.enabled", ROUTE_REQUIRES_GATE)],
            },
            Case {
                name: "route enabled and openshiftRoute gate set",
                gates: FeatureGates {
                    openshift: OpenShiftFeatureGates {
                        openshift_route: true,
                    },
                    ..Default::default()
                },
                spec: TempoMonolithicBuilder::default()
                    .jaeger_ui(true)
                    .route(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![],
            },
            Case {
                name: "serviceMonitors enabled but prometheusOperator gate not set",
                gates: no_gates(),
                spec: TempoMonolithicBuilder::default()
                    .service_monitors(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![(
                    "spec.observability.metrics.serviceMonitors.enabled",
                    SERVICE_MONITORS_REQUIRE_GATE,
                )],
            },
            Case {
                name: "prometheusRules enabled but prometheusOperator gate not set",
                gates: no_gates(),
                spec: TempoMonolithicBuilder::default()
                    .prometheus_rules(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![(
                    "spec.observability.metrics.prometheusRules.enabled",
                    PROMETHEUS_RULES_REQUIRE_GATE,
                )],
            },
            Case {
                name: "prometheusRules enabled but serviceMonitors disabled",
                gates: FeatureGates {
                    prometheus_operator: true,
                    ..Default::default()
                },
                spec: TempoMonolithicBuilder::default()
                    .service_monitors(false)
                    .prometheus_rules(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![(
                    "spec.observability.metrics.prometheusRules.enabled",
                    PROMETHEUS_RULES_REQUIRE_SERVICE_MONITORS,
                )],
            },
            Case {
                name: "dataSource enabled but grafanaOperator gate not set",
                gates: no_gates(),
                spec: TempoMonolithicBuilder::default()
                    .grafana_data_source(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![(
                    "spec.observability.grafana.dataSource.enabled",
                    DATA_SOURCE_REQUIRES_GATE,
                )],
            },
            Case {
                name: "all prerequisites satisfied",
                gates: all_gates(),
                spec: TempoMonolithicBuilder::default()
                    .jaeger_ui(true)
                    .route(true)
                    .ingress(true)
                    .service_monitors(true)
                    .prometheus_rules(true)
                    .grafana_data_source(true)
                    .build_spec(),
                warnings: vec![],
                errors: vec![],
            },
            Case {
                name: "extra config warning",
                gates: no_gates(),
                spec: TempoMonolithicBuilder::default()
                    .extra_config(serde_json::json!({}))
                    .build_spec(),
                warnings: vec![EXTRA_CONFIG_WARNING],
                errors: vec![],
            },
        ]
    }

    #[test]
    fn test_validation_table() {
        for case in cases() {
            let result = validate(&case.spec, &case.gates);

            let expected_errors: Vec<FieldError> = case
                .errors
                .iter()
                .map(|(p, message)| FieldError::invalid(path(p), true, message))
                .collect();
            assert_eq!(result.errors, expected_errors, "case: {}", case.name);
            assert_eq!(result.warnings, case.warnings, "case: {}", case.name);
        }
    }

    #[test]
    fn test_every_violation_reported_in_rule_order() {
        let spec = TempoMonolithicBuilder::default()
            .jaeger_ui(false)
            .ingress(true)
            .route(true)
            .service_monitors(true)
            .prometheus_rules(true)
            .grafana_data_source(true)
            .extra_config(serde_json::json!({ "server": {} }))
            .build_spec();

        let result = validate(&spec, &no_gates());
        let paths: Vec<String> = result.errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "spec.jaegerui.ingress.enabled",
                "spec.jaegerui.route.enabled",
                "spec.observability.metrics.serviceMonitors.enabled",
                "spec.observability.metrics.prometheusRules.enabled",
                "spec.observability.grafana.dataSource.enabled",
            ]
        );
        assert_eq!(result.warnings, vec![EXTRA_CONFIG_WARNING]);
    }

    #[test]
    fn test_disabled_children_never_error() {
        let spec = TempoMonolithicBuilder::default()
            .jaeger_ui(false)
            .ingress(false)
            .route(false)
            .service_monitors(false)
            .prometheus_rules(false)
            .grafana_data_source(false)
            .build_spec();

        assert!(validate(&spec, &no_gates()).is_valid());
    }

    #[test]
    fn test_field_error_display() {
        let err = FieldError::invalid(path("spec.jaegerui.route.enabled"), true, ROUTE_REQUIRES_UI);
        assert_eq!(
            err.to_string(),
            format!(
                "spec.jaegerui.route.enabled: Invalid value: true: {}",
                ROUTE_REQUIRES_UI
            )
        );
    }
}

mod admission_tests {
    use tempo_operator::config::OperatorConfig;
    use tempo_operator::crd::TempoMonolithic;
    use tempo_operator::webhooks::{
        AdmissionRequest, AdmissionReview, ValidationResult, admission_response, validate,
    };

    use crate::fixtures::{TempoMonolithicBuilder, no_gates};

    fn request(tempo: &TempoMonolithic) -> AdmissionRequest<TempoMonolithic> {
        let review: AdmissionReview<TempoMonolithic> = serde_json::from_value(serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "c1f4f1b5-6c2c-4a4e-9a52-5f1d6f7a0e11",
                "kind": { "group": "tempo.grafana.com", "version": "v1alpha1", "kind": "TempoMonolithic" },
                "resource": { "group": "tempo.grafana.com", "version": "v1alpha1", "resource": "tempomonolithics" },
                "name": "sample",
                "namespace": "default",
                "operation": "CREATE",
                "userInfo": {},
                "object": tempo,
                "dryRun": false
            }
        }))
        .unwrap();
        review.try_into().unwrap()
    }

    fn response_json(tempo: &TempoMonolithic, result: &ValidationResult) -> serde_json::Value {
        let response = admission_response(&request(tempo), result);
        serde_json::to_value(response.into_review()).unwrap()["response"].clone()
    }

    #[test]
    fn test_denial_lists_all_errors() {
        let tempo = TempoMonolithicBuilder::new("sample")
            .jaeger_ui(false)
            .ingress(true)
            .route(true)
            .build();
        let result = validate(&tempo.spec, &no_gates());
        let response = response_json(&tempo, &result);

        assert_eq!(response["allowed"], false);
        let message = response["status"]["message"].as_str().unwrap();
        assert!(message.contains("TempoMonolithic.tempo.grafana.com \"sample\" is invalid: ["));
        assert!(message.contains("spec.jaegerui.ingress.enabled"));
        assert!(message.contains("spec.jaegerui.route.enabled"));
    }

    #[test]
    fn test_allowed_with_warning() {
        let tempo = TempoMonolithicBuilder::new("sample")
            .extra_config(serde_json::json!({}))
            .build();
        let config = OperatorConfig::default();
        let result = validate(&tempo.spec, &config.gates);
        let response = response_json(&tempo, &result);

        assert_eq!(response["allowed"], true);
        assert_eq!(response["warnings"].as_array().map(Vec::len), Some(1));
    }
}

mod error_tests {
    use std::time::Duration;
    use tempo_operator::controller::error::Error;
    use tempo_operator::image::ImageReferenceError;

    #[test]
    fn test_requeue_intervals() {
        let conflict = Error::Conflict {
            name: "sample".to_string(),
        };
        assert_eq!(conflict.requeue_after(), Duration::from_secs(1));

        let missing = Error::MissingField("metadata.namespace".to_string());
        assert!(!missing.is_retryable());
        assert_eq!(missing.requeue_after(), Duration::from_secs(300));

        let image = Error::from(ImageReferenceError::Invalid {
            reference: "Bad".to_string(),
        });
        assert!(image.to_string().contains("\"Bad\""));
    }
}

mod status_tests {
    use tempo_operator::config::DefaultImages;
    use tempo_operator::controller::status::{ImageRefs, derive_status};
    use tempo_operator::crd::TempoMonolithicStatus;

    use crate::fixtures::TempoMonolithicBuilder;

    #[test]
    fn test_derive_reports_configured_versions() {
        let spec = TempoMonolithicBuilder::default()
            .jaeger_ui(true)
            .tempo_image("docker.io/grafana/tempo:x.y.z")
            .tempo_query_image("docker.io/grafana/tempo-query:a.b.c")
            .build_spec();
        let images = ImageRefs::resolve(&spec, &DefaultImages::default());

        let status = derive_status(&spec, &images, &TempoMonolithicStatus::default()).unwrap();
        assert_eq!(status.tempo_version.as_deref(), Some("x.y.z"));
        assert_eq!(status.tempo_query_version.as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_derive_keeps_other_fields() {
        let spec = TempoMonolithicBuilder::default().build_spec();
        let base = TempoMonolithicStatus {
            observed_generation: Some(7),
            ..Default::default()
        };
        let images = ImageRefs::resolve(&spec, &DefaultImages::default());

        let status = derive_status(&spec, &images, &base).unwrap();
        assert_eq!(status.observed_generation, Some(7));
        assert_eq!(status.tempo_version.as_deref(), Some("2.7.0"));
    }
}

mod event_tests {
    use tempo_operator::controller::reconciler::configuration_error_changed;
    use tempo_operator::crd::Condition;

    fn invalid(message: &str) -> Vec<Condition> {
        vec![Condition::configuration_error(true, "InvalidSpec", message, Some(1))]
    }

    fn valid() -> Vec<Condition> {
        vec![Condition::configuration_error(false, "ValidSpec", "", Some(1))]
    }

    #[test]
    fn test_new_configuration_error_is_announced() {
        assert!(configuration_error_changed(&[], &invalid("route")));
        assert!(configuration_error_changed(&valid(), &invalid("route")));
    }

    #[test]
    fn test_unchanged_configuration_error_stays_quiet() {
        // A version bump rewrites status but leaves the error message alone
        let mut current = invalid("route");
        current[0].observed_generation = Some(2);
        assert!(!configuration_error_changed(&invalid("route"), &current));
    }

    #[test]
    fn test_changed_message_is_announced() {
        assert!(configuration_error_changed(&invalid("route"), &invalid("route; ingress")));
    }

    #[test]
    fn test_resolved_error_is_not_announced() {
        assert!(!configuration_error_changed(&invalid("route"), &valid()));
        assert!(!configuration_error_changed(&[], &valid()));
    }
}
