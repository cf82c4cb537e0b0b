//! HTTP mapping for prediction errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{ErrorKind, PredictionError};

/// JSON error body returned by `/predict`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_choices: Option<Vec<String>>,
}

impl From<&PredictionError> for ErrorBody {
    fn from(err: &PredictionError) -> Self {
        let mut body = Self {
            error: err.to_string(),
            kind: err.code(),
            field: None,
            value: None,
            valid_choices: None,
        };
        match err {
            PredictionError::MissingField(field) => body.field = Some(field.wire_name()),
            PredictionError::UnknownCategory { value, known } => {
                body.value = Some(value.clone());
                body.valid_choices = Some(known.clone());
            }
            _ => {}
        }
        body
    }
}

/// Status code for an error kind.
#[must_use]
pub fn status_for(err: &PredictionError) -> StatusCode {
    match err.kind() {
        ErrorKind::ServerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ClientError => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        (status_for(&self), Json(ErrorBody::from(&self))).into_response()
    }
}
