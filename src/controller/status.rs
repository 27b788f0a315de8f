//! Status derivation and persistence.
//!
//! The reported versions come from the image references in effect, the spec's
//! own images when set and the operator defaults otherwise. Writes go through
//! [`StatusClient`] and are skipped when nothing changed, so repeated passes
//! over an unchanged object cost no API calls.

use async_trait::async_trait;
use kube::api::PostParams;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use crate::config::DefaultImages;
use crate::controller::context::FIELD_MANAGER;
use crate::controller::error::{Error, Result};
use crate::crd::{Condition, TempoMonolithic, TempoMonolithicSpec, TempoMonolithicStatus};
use crate::image::{ImageReference, ImageReferenceError};

/// Image references a TempoMonolithic runs with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRefs {
    pub tempo: String,
    pub tempo_query: String,
}

impl ImageRefs {
    /// Spec images win over defaults; an empty string counts as unset.
    pub fn resolve(spec: &TempoMonolithicSpec, defaults: &DefaultImages) -> Self {
        let images = spec.images.as_ref();
        let pick = |custom: Option<&String>, default: &str| {
            custom
                .filter(|image| !image.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            tempo: pick(images.and_then(|i| i.tempo.as_ref()), &defaults.tempo),
            tempo_query: pick(
                images.and_then(|i| i.tempo_query.as_ref()),
                &defaults.tempo_query,
            ),
        }
    }
}

/// Compute the versions to report, starting from `base`.
///
/// `tempoQueryVersion` is only refreshed while the Jaeger UI is enabled;
/// otherwise whatever `base` holds is kept. The query image is not parsed at
/// all in that case.
pub fn derive_status(
    spec: &TempoMonolithicSpec,
    images: &ImageRefs,
    base: &TempoMonolithicStatus,
) -> std::result::Result<TempoMonolithicStatus, ImageReferenceError> {
    let mut status = base.clone();

    let tempo = ImageReference::parse(&images.tempo)?;
    status.tempo_version = Some(tempo.version().to_string());

    if spec.jaeger_ui_enabled() {
        let tempo_query = ImageReference::parse(&images.tempo_query)?;
        status.tempo_query_version = Some(tempo_query.version().to_string());
    }

    Ok(status)
}

/// Writes the status subresource
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// Persist `desired.status`.
    ///
    /// Must fail with [`Error::Conflict`] if the stored object no longer
    /// matches `original`'s resourceVersion.
    async fn patch_status(
        &self,
        desired: &TempoMonolithic,
        original: &TempoMonolithic,
    ) -> Result<()>;
}

/// [`StatusClient`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStatusClient {
    client: Client,
}

impl KubeStatusClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusClient for KubeStatusClient {
    async fn patch_status(
        &self,
        desired: &TempoMonolithic,
        original: &TempoMonolithic,
    ) -> Result<()> {
        let name = original.name_any();
        let namespace = original
            .namespace()
            .ok_or_else(|| Error::MissingField("metadata.namespace".to_string()))?;
        let api: Api<TempoMonolithic> = Api::namespaced(self.client.clone(), &namespace);

        // A replace carrying the read resourceVersion is rejected with 409 if
        // anyone wrote in between.
        let mut body = desired.clone();
        body.metadata.resource_version = original.metadata.resource_version.clone();
        let data = serde_json::to_vec(&body)?;

        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        match api.replace_status(&name, &params, data).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 409 => Err(Error::Conflict { name }),
            Err(kube::Error::Api(e)) if e.code == 404 => Err(Error::NotFound { name }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `candidate` as the status of `stored` if it differs from what is stored.
///
/// Returns `Ok(false)` when no write was needed and `Ok(true)` after a
/// successful write. An error means a write was needed but did not land,
/// either because the request could not be built (no namespace, encoding
/// failure) or because the API server rejected it.
pub async fn apply_status<C>(
    client: &C,
    stored: &TempoMonolithic,
    candidate: TempoMonolithicStatus,
) -> Result<bool>
where
    C: StatusClient + ?Sized,
{
    if stored.status.as_ref() == Some(&candidate) {
        debug!(name = %stored.name_any(), "Status unchanged, skipping write");
        return Ok(false);
    }

    let mut desired = stored.clone();
    desired.status = Some(candidate);
    client.patch_status(&desired, stored).await?;
    Ok(true)
}

/// Builder for managing conditions list
pub struct ConditionBuilder {
    conditions: Vec<Condition>,
}

impl ConditionBuilder {
    /// Create a new condition builder
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Start from the conditions already on the object
    pub fn from_existing(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Add or update a condition.
    ///
    /// `lastTransitionTime` only moves when the status flips.
    pub fn set(&mut self, condition: Condition) -> &mut Self {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition.r#type)
        {
            Some(existing) if existing.same_observation(&condition) => {}
            Some(existing) if existing.status == condition.status => {
                let last_transition_time = std::mem::take(&mut existing.last_transition_time);
                *existing = Condition {
                    last_transition_time,
                    ..condition
                };
            }
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
        self
    }

    /// Set ConfigurationError condition
    pub fn configuration_error(
        &mut self,
        failed: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> &mut Self {
        self.set(Condition::configuration_error(
            failed, reason, message, generation,
        ))
    }

    /// Build the conditions list
    pub fn build(self) -> Vec<Condition> {
        self.conditions
    }
}

impl Default for ConditionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a condition type is true
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    conditions
        .iter()
        .find(|c| c.r#type == condition_type)
        .is_some_and(|c| c.status == "True")
}
