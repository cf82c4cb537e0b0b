//! Ports layer: Trait definitions for external operations.
//!
//! These traits define the boundaries between the prediction pipeline and
//! things it treats as opaque (the fitted model, artifact storage).

mod artifact_source;
mod classifier;

pub use artifact_source::{ArtifactKind, ArtifactReadError, ArtifactSource};
pub use classifier::{check_input, Classifier, ClassifierError};
