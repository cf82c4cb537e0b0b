//! Adapters layer: Concrete implementations of ports.
//!
//! - `fs`: artifact directory with manifest and signature verification
//! - `models`: classifiers rebuilt from exported fitted attributes
//! - `encoding`, `scaling`: fitted preprocessing artifacts
//! - `sanitize`: secret and contact-detail filtering for logs

pub mod encoding;
pub mod fs;
pub mod models;
pub mod sanitize;
pub mod scaling;

pub use encoding::LabelEncoder;
pub use fs::{FsArtifactSource, IntegrityError, VerificationPolicy};
pub use models::ClassifierArtifact;
pub use scaling::{NumericalScaler, ScalerParams};
