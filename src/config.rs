//! Operator configuration.
//!
//! Feature gates and default images are read once at startup from a YAML
//! file and shared read-only (behind an `Arc`) with the controller and the
//! admission webhook.
//!
//! ```yaml
//! gates:
//!   openshift:
//!     openshiftRoute: true
//!   prometheusOperator: true
//!   grafanaOperator: false
//! defaultImages:
//!   tempo: docker.io/grafana/tempo:2.7.0
//!   tempoQuery: docker.io/grafana/tempo-query:2.7.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "TEMPO_OPERATOR_CONFIG";

/// Configuration file used when `TEMPO_OPERATOR_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tempo-operator/config.yaml";

/// Errors that can occur while loading the operator configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Process-wide operator configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    /// Cluster capabilities the operator may rely on
    #[serde(default)]
    pub gates: FeatureGates,

    /// Images used when a TempoMonolithic does not override them
    #[serde(default)]
    pub default_images: DefaultImages,
}

/// Cluster capability toggles
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureGates {
    /// OpenShift specific capabilities
    #[serde(default)]
    pub openshift: OpenShiftFeatureGates,

    /// The Prometheus Operator CRDs (ServiceMonitor, PrometheusRule) are installed
    #[serde(default)]
    pub prometheus_operator: bool,

    /// The Grafana Operator CRDs (GrafanaDatasource) are installed
    #[serde(default)]
    pub grafana_operator: bool,
}

/// OpenShift capability toggles
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OpenShiftFeatureGates {
    /// The route.openshift.io API is available
    #[serde(default, rename = "openshiftRoute")]
    pub openshift_route: bool,
}

/// Default container images
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefaultImages {
    #[serde(default = "default_tempo_image")]
    pub tempo: String,

    #[serde(default = "default_tempo_query_image")]
    pub tempo_query: String,
}

impl Default for DefaultImages {
    fn default() -> Self {
        Self {
            tempo: default_tempo_image(),
            tempo_query: default_tempo_query_image(),
        }
    }
}

fn default_tempo_image() -> String {
    "docker.io/grafana/tempo:2.7.0".to_string()
}

fn default_tempo_query_image() -> String {
    "docker.io/grafana/tempo-query:2.7.0".to_string()
}

impl OperatorConfig {
    /// Parse a configuration document
    pub fn from_yaml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(path, &contents)
    }

    /// Load the configuration named by `TEMPO_OPERATOR_CONFIG`.
    ///
    /// An explicitly configured file must exist. When the variable is unset
    /// and the default file is absent, built-in defaults are used.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    info!(
                        path = DEFAULT_CONFIG_PATH,
                        "Config file not found, using defaults"
                    );
                    Ok(Self::default())
                }
            }
        }
    }
}
