//! Jaeger UI exposure policy.
//!
//! An Ingress or Route for the Jaeger UI only makes sense when the UI itself
//! is deployed. Routes additionally need the OpenShift route API.

use super::{ValidationResult, spec_path};
use crate::config::FeatureGates;
use crate::crd::TempoMonolithicSpec;
use crate::webhooks::field::FieldPath;

pub const INGRESS_REQUIRES_UI: &str =
    "Jaeger UI must be enabled to create an ingress for Jaeger UI";
pub const ROUTE_REQUIRES_UI: &str = "Jaeger UI must be enabled to create a route for Jaeger UI";
pub const ROUTE_REQUIRES_GATE: &str =
    "the openshiftRoute feature gate must be enabled to create a route for Jaeger UI";

fn jaeger_ui_path() -> FieldPath {
    spec_path().child("jaegerui")
}

/// `spec.jaegerui.ingress.enabled` requires `spec.jaegerui.enabled`
pub fn validate_ingress(
    spec: &TempoMonolithicSpec,
    _gates: &FeatureGates,
    result: &mut ValidationResult,
) {
    let Some(ui) = &spec.jaeger_ui else {
        return;
    };
    let Some(ingress) = &ui.ingress else {
        return;
    };

    if ingress.enabled && !ui.enabled {
        result.invalid(
            jaeger_ui_path().child("ingress").child("enabled"),
            true,
            INGRESS_REQUIRES_UI,
        );
    }
}

/// `spec.jaegerui.route.enabled` requires `spec.jaegerui.enabled` and the openshiftRoute gate
pub fn validate_route(
    spec: &TempoMonolithicSpec,
    gates: &FeatureGates,
    result: &mut ValidationResult,
) {
    let Some(ui) = &spec.jaeger_ui else {
        return;
    };
    let Some(route) = &ui.route else {
        return;
    };
    if !route.enabled {
        return;
    }

    let path = jaeger_ui_path().child("route").child("enabled");
    if !ui.enabled {
        result.invalid(path, true, ROUTE_REQUIRES_UI);
    } else if !gates.openshift.openshift_route {
        result.invalid(path, true, ROUTE_REQUIRES_GATE);
    }
}
