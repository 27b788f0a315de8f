//! Reconciliation loop for TempoMonolithic.
//!
//! Each pass re-validates the stored spec against the current feature gates,
//! records the outcome as a `ConfigurationError` condition, and refreshes the
//! reported image versions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::{ResourceExt, runtime::controller::Action};
use tracing::{debug, error, info, warn};

use crate::config::OperatorConfig;
use crate::controller::context::Context;
use crate::controller::error::{Error, Result};
use crate::controller::status::{
    ConditionBuilder, ImageRefs, KubeStatusClient, StatusClient, apply_status, derive_status,
    is_condition_true,
};
use crate::crd::{Condition, ConditionType, TempoMonolithic, TempoMonolithicStatus};
use crate::health::PatchOutcome;
use crate::webhooks::policies::{ValidationResult, validate};

/// Interval between passes over an unchanged object
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Result of one status refresh
#[derive(Clone, Debug)]
pub struct StatusRefresh {
    /// Rule engine output for the stored spec
    pub validation: ValidationResult,
    /// Status the object should carry
    pub status: TempoMonolithicStatus,
    /// Whether a write was made
    pub changed: bool,
}

/// Validate, derive and persist the status of `obj`.
///
/// Nothing is written when an image reference cannot be parsed.
pub async fn refresh_status<C>(
    obj: &TempoMonolithic,
    config: &OperatorConfig,
    client: &C,
) -> Result<StatusRefresh>
where
    C: StatusClient + ?Sized,
{
    let generation = obj.metadata.generation;
    let validation = validate(&obj.spec, &config.gates);
    let base = obj.status.clone().unwrap_or_default();

    let mut conditions = ConditionBuilder::from_existing(base.conditions.clone());
    if validation.is_valid() {
        conditions.configuration_error(false, "ValidSpec", "", generation);
    } else {
        let message = validation
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        conditions.configuration_error(true, "InvalidSpec", &message, generation);
    }

    let images = ImageRefs::resolve(&obj.spec, &config.default_images);
    let mut status = derive_status(&obj.spec, &images, &base)?;
    status.observed_generation = generation;
    status.conditions = conditions.build();

    let changed = apply_status(client, obj, status.clone()).await?;
    Ok(StatusRefresh {
        validation,
        status,
        changed,
    })
}

/// Reconcile a TempoMonolithic
pub async fn reconcile(obj: Arc<TempoMonolithic>, ctx: Arc<Context>) -> Result<Action> {
    let start_time = Instant::now();
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    debug!(name = %name, namespace = %namespace, "Reconciling TempoMonolithic");

    if obj.metadata.deletion_timestamp.is_some() {
        debug!(name = %name, "Resource is being deleted, nothing to do");
        return Ok(Action::await_change());
    }

    let condition_type = ConditionType::ConfigurationError.to_string();
    let was_invalid = obj
        .status
        .as_ref()
        .is_some_and(|s| is_condition_true(&s.conditions, &condition_type));
    let previous_version = obj.status.as_ref().and_then(|s| s.tempo_version.clone());

    let client = KubeStatusClient::new(ctx.client.clone());
    let refresh = match refresh_status(&obj, &ctx.config, &client).await {
        Ok(refresh) => refresh,
        Err(Error::ImageReference(e)) => {
            error!(name = %name, error = %e, "Cannot derive versions from image");
            ctx.publish_warning_event(&obj, "InvalidImage", "DeriveStatus", Some(e.to_string()))
                .await;
            return Err(Error::ImageReference(e));
        }
        Err(e) => {
            let outcome = if e.is_conflict() {
                PatchOutcome::Conflict
            } else {
                PatchOutcome::Error
            };
            record_patch(&ctx, outcome);
            return Err(e);
        }
    };

    let outcome = if refresh.changed {
        PatchOutcome::Patched
    } else {
        PatchOutcome::Unchanged
    };
    record_patch(&ctx, outcome);

    let previous_conditions = obj
        .status
        .as_ref()
        .map(|s| s.conditions.as_slice())
        .unwrap_or_default();
    if configuration_error_changed(previous_conditions, &refresh.status.conditions) {
        for field_error in &refresh.validation.errors {
            ctx.publish_warning_event(
                &obj,
                "ConfigurationError",
                "Validating",
                Some(field_error.to_string()),
            )
            .await;
        }
    } else if refresh.validation.is_valid() && was_invalid {
        info!(name = %name, "Configuration error resolved");
    }

    if refresh.status.tempo_version != previous_version
        && let Some(version) = refresh.status.tempo_version.as_deref()
    {
        info!(name = %name, version = %version, "Tempo version updated");
        ctx.publish_normal_event(
            &obj,
            "VersionUpdated",
            "DeriveStatus",
            Some(format!("Tempo version is {}", version)),
        )
        .await;
    }

    if let Some(ref health_state) = ctx.health_state {
        health_state.metrics.record_reconcile(
            &namespace,
            &name,
            start_time.elapsed().as_secs_f64(),
        );
        health_state.touch_reconcile();
    }

    Ok(Action::requeue(RESYNC_INTERVAL))
}

/// Whether `current` carries a ConfigurationError that `previous` did not
/// report, or reported with a different message.
pub fn configuration_error_changed(previous: &[Condition], current: &[Condition]) -> bool {
    let condition_type = ConditionType::ConfigurationError.to_string();
    let find = |conditions: &[Condition]| {
        conditions
            .iter()
            .find(|c| c.r#type == condition_type && c.status == "True")
            .map(|c| c.message.clone())
    };

    match (find(previous), find(current)) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(before), Some(after)) => before != after,
    }
}

fn record_patch(ctx: &Context, outcome: PatchOutcome) {
    if let Some(ref health_state) = ctx.health_state {
        health_state.metrics.record_status_patch(outcome);
    }
}

/// Error policy for the controller
pub fn error_policy(obj: Arc<TempoMonolithic>, error: &Error, ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    if let Some(ref health_state) = ctx.health_state {
        health_state.metrics.record_error(&namespace, &name);
    }

    if error.is_not_found() {
        debug!(name = %name, "Resource not found (likely deleted)");
        return Action::await_change();
    }

    if error.is_retryable() {
        warn!(name = %name, error = %error, "Retryable error, will retry");
    } else {
        error!(name = %name, error = %error, "Non-retryable error");
    }
    Action::requeue(error.requeue_after())
}
