//! Domain layer: Core types for nutritional-status prediction.
//!
//! Pure Rust types with no I/O. Everything here is cheap to construct and
//! carries no references to loaded artifacts.

mod error;
mod features;
mod measurement;
mod prediction;

pub use error::{ErrorKind, PredictionError};
pub use features::{
    FeatureVector, ScaledMeasurements, FEATURE_COUNT, FEATURE_NAMES, NUMERICAL_FEATURE_COUNT,
};
pub use measurement::{ChildMeasurement, Field, RawRequest};
pub use prediction::Prediction;
