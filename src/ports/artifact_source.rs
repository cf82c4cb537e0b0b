//! Artifact source port: where the four pre-fitted objects come from.

use serde::{Deserialize, Serialize};

/// One of the four artifacts in a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Classifier,
    NumericalScaler,
    CategoricalEncoder,
    LabelDecoder,
}

impl ArtifactKind {
    /// All artifacts, in load order.
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Classifier,
        ArtifactKind::NumericalScaler,
        ArtifactKind::CategoricalEncoder,
        ArtifactKind::LabelDecoder,
    ];

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier",
            Self::NumericalScaler => "numerical-scaler",
            Self::CategoricalEncoder => "categorical-encoder",
            Self::LabelDecoder => "label-decoder",
        }
    }

    /// File name inside an artifact directory.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier.json",
            Self::NumericalScaler => "scaler.json",
            Self::CategoricalEncoder => "sex_encoder.json",
            Self::LabelDecoder => "label_decoder.json",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Error reading a single artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactReadError {
    #[error("not found at {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("integrity check failed: {0}")]
    Integrity(String),
}

/// Trait for reading serialized artifacts.
pub trait ArtifactSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Read the raw bytes of one artifact.
    ///
    /// # Errors
    /// Returns `ArtifactReadError` if the artifact is missing, unreadable, or
    /// fails an integrity check.
    fn read(&self, kind: ArtifactKind) -> Result<Vec<u8>, ArtifactReadError>;
}
