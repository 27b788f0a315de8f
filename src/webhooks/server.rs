//! Admission webhook server.
//!
//! Provides HTTP endpoints for Kubernetes admission webhooks.
//!
//! To enable webhooks:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at /validate-tempomonolithic
//! 3. Mount the TLS certificate secret to the operator pod at /etc/webhook/certs/
//!
//! The webhook server starts automatically when certificates are present.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use kube::Resource;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::OperatorConfig;
use crate::crd::TempoMonolithic;
use crate::health::HealthState;
use crate::webhooks::policies::{ValidationResult, validate};

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;

/// Shared state for webhook handlers
pub struct WebhookState {
    /// Feature gates consulted by the validation rules
    pub config: Arc<OperatorConfig>,
    /// Optional health state for metrics
    pub health_state: Option<Arc<HealthState>>,
}

impl WebhookState {
    pub fn new(config: Arc<OperatorConfig>, health_state: Option<Arc<HealthState>>) -> Self {
        Self {
            config,
            health_state,
        }
    }
}

/// Create a denial response with reason embedded in message.
/// kube-rs deny() only sets status.message, so we format as "[reason] message"
fn deny_with_reason<T: Resource<DynamicType = ()>>(
    request: &AdmissionRequest<T>,
    message: &str,
    reason: &str,
) -> AdmissionResponse {
    let full_message = format!("[{}] {}", reason, message);
    AdmissionResponse::from(request).deny(full_message)
}

/// `<Kind>.<group>` as used in API server error messages
fn group_kind() -> String {
    format!(
        "{}.{}",
        TempoMonolithic::kind(&()),
        TempoMonolithic::group(&())
    )
}

/// Build the admission response for a validated request.
///
/// Warnings are attached whether or not the request is admitted.
pub fn admission_response(
    request: &AdmissionRequest<TempoMonolithic>,
    result: &ValidationResult,
) -> AdmissionResponse {
    let mut response = if result.is_valid() {
        AdmissionResponse::from(request)
    } else {
        let name = request.name.as_str();
        deny_with_reason(
            request,
            &result.denial_message(&group_kind(), name),
            "Invalid",
        )
    };

    if !result.warnings.is_empty() {
        response.warnings = Some(result.warnings.clone());
    }
    response
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/validate-tempomonolithic", post(validate_tempomonolithic))
        .with_state(state)
}

/// TempoMonolithic validating admission webhook handler
async fn validate_tempomonolithic(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<TempoMonolithic>>,
) -> impl IntoResponse {
    let request: AdmissionRequest<TempoMonolithic> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    let review = review_request(&state, &request);
    (StatusCode::OK, Json(review))
}

/// Validate a decoded admission request
fn review_request(
    state: &WebhookState,
    request: &AdmissionRequest<TempoMonolithic>,
) -> AdmissionReview<DynamicObject> {
    let uid = &request.uid;
    debug!(
        uid = %uid,
        operation = ?request.operation,
        namespace = ?request.namespace,
        name = %request.name,
        "Processing admission request"
    );

    // DELETE operations are always allowed
    if request.operation == Operation::Delete {
        info!(uid = %uid, "Admission request allowed (DELETE)");
        return AdmissionResponse::from(request).into_review();
    }

    let resource = match &request.object {
        Some(obj) => obj,
        None => {
            error!(uid = %uid, "Missing object in request");
            return deny_with_reason(request, "Missing object in request", "InvalidRequest")
                .into_review();
        }
    };

    let result = validate(&resource.spec, &state.config.gates);
    let response = admission_response(request, &result);

    if let Some(ref health_state) = state.health_state {
        health_state.metrics.record_admission(result.is_valid());
    }

    if result.is_valid() {
        info!(
            uid = %uid,
            warnings = result.warnings.len(),
            "Admission request allowed"
        );
    } else {
        warn!(
            uid = %uid,
            errors = result.errors.len(),
            "Admission request denied"
        );
    }

    response.into_review()
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0:9443 and serves the /validate-tempomonolithic endpoint.
/// TLS certificates are loaded from the paths specified.
///
/// # Arguments
/// * `state` - Shared webhook state (feature gates, metrics)
/// * `cert_path` - Path to TLS certificate file (PEM format)
/// * `key_path` - Path to TLS private key file (PEM format)
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    cert_path: &str,
    key_path: &str,
) -> Result<(), WebhookError> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(PathBuf::from(cert_path), PathBuf::from(key_path))
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], WEBHOOK_PORT));
    info!(port = WEBHOOK_PORT, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
