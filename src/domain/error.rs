//! Prediction error taxonomy.

use super::Field;

/// Coarse error class used by the transport to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service cannot answer at all (artifacts not loaded)
    ServerUnavailable,
    /// The request cannot be answered as given
    ClientError,
}

/// Failure of a single prediction.
///
/// Each pipeline step has its own variant; no step substitutes a default.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("Model artifacts not initialized")]
    BundleUnavailable,

    #[error("Missing JSON key '{0}'. Required: {keys}", keys = Field::required_keys())]
    MissingField(Field),

    #[error(
        "Unknown value '{value}' for '{field}'. Valid choices: {choices}",
        field = Field::Sex,
        choices = .known.join(", ")
    )]
    UnknownCategory { value: String, known: Vec<String> },

    #[error("Predicted class index {0} has no label")]
    Decode(i64),

    #[error("{0}")]
    Processing(String),
}

impl PredictionError {
    /// Coarse classification for the transport layer.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BundleUnavailable => ErrorKind::ServerUnavailable,
            _ => ErrorKind::ClientError,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BundleUnavailable => "bundle_unavailable",
            Self::MissingField(_) => "missing_field",
            Self::UnknownCategory { .. } => "unknown_category",
            Self::Decode(_) => "decode_error",
            Self::Processing(_) => "processing_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            PredictionError::BundleUnavailable.kind(),
            ErrorKind::ServerUnavailable
        );
        assert_eq!(
            PredictionError::MissingField(Field::Weight).kind(),
            ErrorKind::ClientError
        );
        assert_eq!(PredictionError::Decode(7).kind(), ErrorKind::ClientError);
    }

    #[test]
    fn test_missing_field_message_lists_keys() {
        let msg = PredictionError::MissingField(Field::Weight).to_string();
        assert!(msg.contains("'berat'"));
        assert!(msg.contains("'jenis_kelamin', 'umur', 'tinggi', 'berat'"));
    }

    #[test]
    fn test_unknown_category_message_lists_choices() {
        let err = PredictionError::UnknownCategory {
            value: "invalid-value".into(),
            known: vec!["Laki-laki".into(), "Perempuan".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid-value"));
        assert!(msg.contains("Laki-laki, Perempuan"));
        assert_eq!(err.code(), "unknown_category");
    }
}
