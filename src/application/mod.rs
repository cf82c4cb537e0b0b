//! Application layer: Use cases and services.
//!
//! This module wires the fitted artifacts behind the ports into the
//! prediction use case.

mod bundle;
mod prediction;

pub use bundle::{ArtifactBundle, ArtifactFailure, BundleState, LoadError};
pub use prediction::{features, predict, PredictionService};
