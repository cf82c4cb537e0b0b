//! # Stuntguard
//!
//! Child nutritional-status prediction from sex, age, height and weight,
//! backed by pre-fitted model artifacts.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Request, feature vector, prediction and error types
//! - `ports`: Classifier and artifact source traits
//! - `adapters`: Fitted artifact formats, filesystem source, log sanitizer
//! - `application`: Artifact bundle loading and the prediction pipeline
//! - `server`: HTTP transport (axum)
//! - `config`: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;

pub use application::{ArtifactBundle, BundleState, PredictionService};
pub use domain::{Prediction, PredictionError, RawRequest};

/// Result type for Stuntguard operations
pub type Result<T> = std::result::Result<T, StuntguardError>;

/// Main error type for Stuntguard
#[derive(Debug, thiserror::Error)]
pub enum StuntguardError {
    #[error("Artifact loading failed: {0}")]
    Load(#[from] application::LoadError),

    #[error("Artifact integrity check failed: {0}")]
    Integrity(#[from] adapters::IntegrityError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
