//! Request handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{ArtifactFailure, BundleState, PredictionService};
use crate::domain::PredictionError;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: String,
}

/// `POST /predict`
///
/// The body is taken as raw bytes so that malformed JSON is reported through
/// the same error body as every other failure.
pub async fn predict(
    State(service): State<PredictionService>,
    body: Bytes,
) -> Result<Json<PredictResponse>, PredictionError> {
    let prediction = service.predict_payload(&body)?;
    Ok(Json(PredictResponse {
        prediction: prediction.label,
    }))
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthResponse {
    Ready { classes: Vec<String>, model: &'static str },
    Unavailable { failed: Vec<ArtifactFailure> },
}

/// `GET /health`
pub async fn health(State(service): State<PredictionService>) -> Response {
    match service.state() {
        BundleState::Ready(bundle) => Json(HealthResponse::Ready {
            classes: bundle.label_decoder().classes().to_vec(),
            model: bundle.classifier().kind(),
        })
        .into_response(),
        BundleState::Unavailable(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::Unavailable {
                failed: err.failures(),
            }),
        )
            .into_response(),
    }
}
