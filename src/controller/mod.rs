//! Controller module for tempo-operator.
//!
//! Contains the reconciliation loop, error handling, and status derivation
//! and persistence for TempoMonolithic resources.

pub mod context;
pub mod error;
pub mod reconciler;
pub mod status;
