//! Webhook module for validating admission requests.
//!
//! This module provides a ValidatingAdmissionWebhook for TempoMonolithic:
//! - Field errors deny the request (feature dependencies and gates)
//! - Warnings are returned but never block (risky overrides)

pub mod field;
pub mod policies;
mod server;

pub use field::{FieldError, FieldPath};
pub use policies::{ValidationResult, validate};
pub use server::{
    WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT, WebhookError, WebhookState,
    admission_response, create_webhook_router, run_webhook_server,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
