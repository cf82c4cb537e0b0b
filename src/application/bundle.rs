//! Artifact bundle: the four fitted objects, loaded together or not at all.

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::{ClassifierArtifact, LabelEncoder, NumericalScaler};
use crate::domain::FEATURE_COUNT;
use crate::ports::{ArtifactKind, ArtifactSource, Classifier};

/// One artifact that could not be loaded, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFailure {
    pub artifact: ArtifactKind,
    pub reason: String,
}

impl std::fmt::Display for ArtifactFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.artifact, self.reason)
    }
}

/// Why a bundle could not be constructed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("Artifact source unavailable: {0}")]
    Source(String),

    #[error("Failed to load {} artifact(s): {}", .0.len(), join_failures(.0))]
    Incomplete(Vec<ArtifactFailure>),

    #[error("Artifacts are inconsistent: {0}")]
    Inconsistent(String),
}

fn join_failures(failures: &[ArtifactFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoadError {
    /// Per-artifact failures, for health reporting.
    ///
    /// Source and consistency errors are not tied to a single artifact and
    /// are reported against every artifact.
    #[must_use]
    pub fn failures(&self) -> Vec<ArtifactFailure> {
        match self {
            Self::Incomplete(failures) => failures.clone(),
            Self::Source(reason) | Self::Inconsistent(reason) => ArtifactKind::ALL
                .iter()
                .map(|&artifact| ArtifactFailure {
                    artifact,
                    reason: reason.clone(),
                })
                .collect(),
        }
    }
}

/// The four fitted artifacts used by every prediction.
///
/// Immutable after construction. Share it behind an `Arc`.
#[derive(Debug)]
pub struct ArtifactBundle {
    sex_encoder: LabelEncoder,
    scaler: NumericalScaler,
    classifier: Box<dyn Classifier>,
    label_decoder: LabelEncoder,
}

impl ArtifactBundle {
    /// Assemble a bundle from already-built artifacts.
    ///
    /// # Errors
    /// Returns `LoadError::Inconsistent` if the classifier does not take
    /// exactly four features or emits a class the decoder cannot name.
    pub fn new(
        sex_encoder: LabelEncoder,
        scaler: NumericalScaler,
        classifier: Box<dyn Classifier>,
        label_decoder: LabelEncoder,
    ) -> Result<Self, LoadError> {
        if classifier.n_features() != FEATURE_COUNT {
            return Err(LoadError::Inconsistent(format!(
                "classifier expects {} features, pipeline produces {FEATURE_COUNT}",
                classifier.n_features()
            )));
        }
        for &class in classifier.classes() {
            if label_decoder.inverse_transform(class).is_err() {
                return Err(LoadError::Inconsistent(format!(
                    "classifier class {class} has no label in the decoder ({} labels)",
                    label_decoder.classes().len()
                )));
            }
        }

        Ok(Self {
            sex_encoder,
            scaler,
            classifier,
            label_decoder,
        })
    }

    /// Load all four artifacts from `source`.
    ///
    /// Every artifact is attempted even after a failure so the error names
    /// each one that is broken.
    ///
    /// # Errors
    /// Returns `LoadError::Incomplete` if any artifact fails to read or parse,
    /// or `LoadError::Inconsistent` if they do not fit together.
    pub fn load(source: &dyn ArtifactSource) -> Result<Self, LoadError> {
        tracing::info!("Loading artifacts from {}", source.describe());

        let mut failures = Vec::new();
        let mut fail = |artifact: ArtifactKind, reason: String| {
            tracing::error!("Artifact {} failed to load: {}", artifact, reason);
            failures.push(ArtifactFailure { artifact, reason });
        };

        let classifier = read_with(source, ArtifactKind::Classifier, |b| {
            ClassifierArtifact::from_json_slice(b)?.into_classifier()
        })
        .map_err(|e| fail(ArtifactKind::Classifier, e))
        .ok();
        let scaler = read_with(
            source,
            ArtifactKind::NumericalScaler,
            NumericalScaler::from_json_slice,
        )
        .map_err(|e| fail(ArtifactKind::NumericalScaler, e))
        .ok();
        let sex_encoder = read_with(
            source,
            ArtifactKind::CategoricalEncoder,
            LabelEncoder::from_json_slice,
        )
        .map_err(|e| fail(ArtifactKind::CategoricalEncoder, e))
        .ok();
        let label_decoder = read_with(
            source,
            ArtifactKind::LabelDecoder,
            LabelEncoder::from_json_slice,
        )
        .map_err(|e| fail(ArtifactKind::LabelDecoder, e))
        .ok();

        let (Some(classifier), Some(scaler), Some(sex_encoder), Some(label_decoder)) =
            (classifier, scaler, sex_encoder, label_decoder)
        else {
            return Err(LoadError::Incomplete(failures));
        };

        let bundle = Self::new(sex_encoder, scaler, classifier, label_decoder)?;
        tracing::info!(
            "Artifacts loaded: classifier={}, scaler={}, {} sex categories, {} labels",
            bundle.classifier.kind(),
            bundle.scaler.kind(),
            bundle.sex_encoder.classes().len(),
            bundle.label_decoder.classes().len()
        );
        Ok(bundle)
    }

    #[must_use]
    pub fn sex_encoder(&self) -> &LabelEncoder {
        &self.sex_encoder
    }

    #[must_use]
    pub fn scaler(&self) -> &NumericalScaler {
        &self.scaler
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    #[must_use]
    pub fn label_decoder(&self) -> &LabelEncoder {
        &self.label_decoder
    }
}

fn read_with<T>(
    source: &dyn ArtifactSource,
    kind: ArtifactKind,
    parse: impl FnOnce(&[u8]) -> Result<T, String>,
) -> Result<T, String> {
    let bytes = source.read(kind).map_err(|e| e.to_string())?;
    parse(&bytes)
}

/// Process-wide readiness: either a loaded bundle or the reason there is none.
#[derive(Debug, Clone)]
pub enum BundleState {
    Ready(Arc<ArtifactBundle>),
    Unavailable(Arc<LoadError>),
}

impl BundleState {
    /// Load a bundle, recording the failure instead of returning it.
    #[must_use]
    pub fn load(source: &dyn ArtifactSource) -> Self {
        Self::from(ArtifactBundle::load(source))
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[must_use]
    pub fn bundle(&self) -> Option<&Arc<ArtifactBundle>> {
        match self {
            Self::Ready(bundle) => Some(bundle),
            Self::Unavailable(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable(err) => Some(err),
        }
    }
}

impl From<Result<ArtifactBundle, LoadError>> for BundleState {
    fn from(result: Result<ArtifactBundle, LoadError>) -> Self {
        match result {
            Ok(bundle) => Self::Ready(Arc::new(bundle)),
            Err(err) => Self::Unavailable(Arc::new(err)),
        }
    }
}
