//! Custom Resource Definitions (CRDs) for tempo-operator.
//!
//! - `TempoMonolithic`: Deploy and manage a single-binary Tempo tracing backend

mod tempo_monolithic;

pub use tempo_monolithic::*;
