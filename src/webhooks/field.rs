//! Field-addressed validation errors.
//!
//! Mirrors the Kubernetes convention of reporting which nested field of an
//! object was rejected, the value it held and why.

use std::fmt;

/// Segmented locator of a field within an object (e.g. `spec.jaegerui.route.enabled`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Start a path at its root segment
    pub fn new(root: &str) -> Self {
        Self {
            segments: vec![root.to_string()],
        }
    }

    /// Extend the path by one segment
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Path segments from the root
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// A rejected field value
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    /// Field that holds the rejected value
    pub path: FieldPath,
    /// The rejected value
    pub value: serde_json::Value,
    /// Why the value was rejected
    pub message: String,
}

impl FieldError {
    /// Create an "Invalid value" error
    pub fn invalid(path: FieldPath, value: impl Into<serde_json::Value>, message: &str) -> Self {
        Self {
            path,
            value: value.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Invalid value: {}: {}",
            self.path, self.value, self.message
        )
    }
}

impl std::error::Error for FieldError {}
