//! Prediction service: runs the fixed preprocessing and inference pipeline.
//!
//! The pipeline steps, in order:
//! 1. Check that all four fields are present
//! 2. Encode sex through the categorical encoder
//! 3. Scale age, height and weight as one sample
//! 4. Assemble the feature vector
//! 5. Classify
//! 6. Decode the class label

use std::sync::Arc;

use super::bundle::{ArtifactBundle, BundleState};
use crate::domain::{ChildMeasurement, FeatureVector, Prediction, PredictionError, RawRequest};

/// Encode, scale and assemble the classifier input for one measurement.
///
/// # Errors
/// Returns `PredictionError::UnknownCategory` if the sex label is outside the
/// encoder's vocabulary.
pub fn features(
    bundle: &ArtifactBundle,
    measurement: &ChildMeasurement,
) -> Result<FeatureVector, PredictionError> {
    let sex_code = bundle.sex_encoder().transform(&measurement.sex)?;
    let scaled = bundle.scaler().transform(measurement.numerical());
    Ok(FeatureVector::assemble(sex_code, scaled))
}

/// Run the pipeline for one request against a loaded bundle.
///
/// Pure with respect to the bundle: the same request always gives the same
/// result.
///
/// # Errors
/// Returns the `PredictionError` of the first step that fails.
pub fn predict(bundle: &ArtifactBundle, raw: &RawRequest) -> Result<Prediction, PredictionError> {
    let measurement = raw.validate()?;
    let vector = features(bundle, &measurement)?;

    let class_index = bundle
        .classifier()
        .predict(&vector)
        .map_err(|e| PredictionError::Processing(e.to_string()))?;

    let label = bundle.label_decoder().inverse_transform(class_index)?;
    Ok(Prediction {
        label: label.to_string(),
        class_index,
    })
}

/// Service answering prediction requests.
///
/// Cheap to clone; clones share the same bundle.
#[derive(Debug, Clone)]
pub struct PredictionService {
    state: BundleState,
}

impl PredictionService {
    #[must_use]
    pub fn new(state: BundleState) -> Self {
        Self { state }
    }

    /// Service over a bundle that is known to be loaded.
    #[must_use]
    pub fn ready(bundle: ArtifactBundle) -> Self {
        Self::new(BundleState::Ready(Arc::new(bundle)))
    }

    #[must_use]
    pub fn state(&self) -> &BundleState {
        &self.state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Predict from a parsed request.
    ///
    /// # Errors
    /// Returns `PredictionError::BundleUnavailable` before looking at the
    /// request if no bundle is loaded, otherwise the pipeline's error.
    pub fn predict(&self, raw: &RawRequest) -> Result<Prediction, PredictionError> {
        let bundle = self.bundle()?;
        let result = predict(bundle, raw);
        log_outcome(&result);
        result
    }

    /// Predict from a raw JSON request body.
    ///
    /// # Errors
    /// As [`PredictionService::predict`], plus `PredictionError::Processing`
    /// for a body that is not a JSON object of the expected shape.
    pub fn predict_payload(&self, body: &[u8]) -> Result<Prediction, PredictionError> {
        let bundle = self.bundle()?;
        let result = RawRequest::from_json_slice(body).and_then(|raw| predict(bundle, &raw));
        log_outcome(&result);
        result
    }

    fn bundle(&self) -> Result<&ArtifactBundle, PredictionError> {
        match &self.state {
            BundleState::Ready(bundle) => Ok(bundle.as_ref()),
            BundleState::Unavailable(_) => {
                tracing::warn!("Prediction refused: artifacts not loaded");
                Err(PredictionError::BundleUnavailable)
            }
        }
    }
}

fn log_outcome(result: &Result<Prediction, PredictionError>) {
    match result {
        Ok(p) => tracing::debug!("Prediction complete: class={} label={}", p.class_index, p.label),
        Err(e) => tracing::warn!("Prediction failed ({}): {}", e.code(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{LabelEncoder, NumericalScaler, ScalerParams};
    use crate::application::bundle::tests::MemorySource;
    use crate::application::LoadError;
    use crate::domain::Field;
    use crate::ports::{Classifier, ClassifierError};

    fn service() -> PredictionService {
        PredictionService::ready(ArtifactBundle::load(&MemorySource::complete()).expect("loads"))
    }

    fn request(sex: &str, age: f64, height: f64, weight: f64) -> RawRequest {
        RawRequest {
            sex: Some(sex.into()),
            age_months: Some(age),
            height_cm: Some(height),
            weight_kg: Some(weight),
        }
    }

    #[test]
    fn test_pipeline_routes_by_scaled_height() {
        let svc = service();
        // (height - 87) / 12.5: 68 -> -1.52, 85 -> -0.16, 95 -> 0.64
        let p = svc.predict(&request("Laki-laki", 12.0, 68.0, 8.0)).unwrap();
        assert_eq!(p.label, "Severely Stunted");
        let p = svc.predict(&request("Laki-laki", 24.0, 85.0, 11.0)).unwrap();
        assert_eq!(p.label, "Stunted");
        let p = svc.predict(&request("Perempuan", 36.0, 95.0, 14.0)).unwrap();
        assert_eq!(p.label, "Normal");
        assert_eq!(p.class_index, 0);
    }

    #[test]
    fn test_features_follow_column_order() {
        let bundle = ArtifactBundle::load(&MemorySource::complete()).unwrap();
        let measurement = request("Perempuan", 47.5, 74.5, 15.5).validate().unwrap();
        let vector = features(&bundle, &measurement).unwrap();
        // (47.5 - 30) / 17.5, (74.5 - 87) / 12.5, (15.5 - 12) / 3.5
        assert_eq!(vector.to_array(), [1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_deterministic() {
        let svc = service();
        let req = request("Perempuan", 24.0, 85.5, 10.1);
        let first = svc.predict(&req).unwrap();
        for _ in 0..50 {
            assert_eq!(svc.predict(&req).unwrap(), first);
        }
    }

    #[test]
    fn test_unknown_sex_rejected() {
        let err = service().predict(&request("invalid-value", 24.0, 85.5, 10.1)).unwrap_err();
        assert_eq!(err.code(), "unknown_category");
        assert!(err.to_string().contains("Laki-laki, Perempuan"));
    }

    #[test]
    fn test_missing_weight_rejected() {
        let mut req = request("Perempuan", 24.0, 85.5, 10.1);
        req.weight_kg = None;
        assert_eq!(
            service().predict(&req),
            Err(PredictionError::MissingField(Field::Weight))
        );
    }

    #[test]
    fn test_missing_reported_before_unknown_category() {
        let mut req = request("invalid-value", 24.0, 85.5, 10.1);
        req.age_months = None;
        assert_eq!(
            service().predict(&req),
            Err(PredictionError::MissingField(Field::Age))
        );
    }

    #[test]
    fn test_unavailable_bundle_checked_first() {
        let svc = PredictionService::new(BundleState::Unavailable(Arc::new(LoadError::Source(
            "gone".into(),
        ))));
        assert!(!svc.is_ready());
        assert_eq!(
            svc.predict(&RawRequest::default()),
            Err(PredictionError::BundleUnavailable)
        );
        assert_eq!(
            svc.predict_payload(b"not json"),
            Err(PredictionError::BundleUnavailable)
        );
    }

    #[test]
    fn test_payload_parsing() {
        let svc = service();
        let primary = br#"{"jenis_kelamin": "Laki-laki", "umur": 12, "tinggi": 68, "berat": 8}"#;
        let p = svc.predict_payload(primary).unwrap();
        assert_eq!(p.label, "Severely Stunted");

        let aliased = br#"{"sex": "Laki-laki", "age_months": 12, "height_cm": 68, "weight_kg": 8}"#;
        let p = svc.predict_payload(aliased).unwrap();
        assert_eq!(p.label, "Severely Stunted");

        assert_eq!(svc.predict_payload(b"[1, 2]").unwrap_err().code(), "processing_error");
        assert_eq!(svc.predict_payload(b"{").unwrap_err().code(), "processing_error");
        let null_weight =
            br#"{"jenis_kelamin": "Laki-laki", "umur": 12, "tinggi": 68, "berat": null}"#;
        assert_eq!(
            svc.predict_payload(null_weight),
            Err(PredictionError::MissingField(Field::Weight))
        );
    }

    #[test]
    fn test_concurrent_predictions_match_sequential() {
        let svc = service();
        let requests: Vec<RawRequest> = (0..64)
            .map(|i| {
                let sex = if i % 2 == 0 { "Laki-laki" } else { "Perempuan" };
                let i = f64::from(i);
                request(sex, 6.0 + i, 60.0 + i * 0.8, 6.0 + i * 0.2)
            })
            .collect();
        let expected: Vec<_> = requests.iter().map(|r| svc.predict(r)).collect();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let svc = svc.clone();
                    let requests = &requests;
                    s.spawn(move || requests.iter().map(|r| svc.predict(r)).collect::<Vec<_>>())
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().expect("thread"), expected);
            }
        });
    }

    /// Classifier that emits a fixed class regardless of input.
    #[derive(Debug)]
    struct FixedClass(Vec<i64>, i64);

    impl Classifier for FixedClass {
        fn kind(&self) -> &'static str {
            "fixed"
        }

        fn n_features(&self) -> usize {
            4
        }

        fn classes(&self) -> &[i64] {
            &self.0
        }

        fn predict(&self, _features: &FeatureVector) -> Result<i64, ClassifierError> {
            Ok(self.1)
        }
    }

    #[test]
    fn test_out_of_range_class_is_decode_error() {
        // Declares only class 0 so the bundle passes its load checks.
        let bundle = ArtifactBundle::new(
            LabelEncoder::new(vec!["Laki-laki".into(), "Perempuan".into()]).unwrap(),
            NumericalScaler::new(ScalerParams::Standard {
                mean: [0.0; 3],
                scale: [1.0; 3],
            })
            .unwrap(),
            Box::new(FixedClass(vec![0], 7)),
            LabelEncoder::new(vec!["Normal".into()]).unwrap(),
        )
        .expect("consistent");
        let err = predict(&bundle, &request("Laki-laki", 1.0, 2.0, 3.0)).unwrap_err();
        assert_eq!(err, PredictionError::Decode(7));
        assert_eq!(err.code(), "decode_error");
    }

    #[test]
    fn test_decode_round_trip() {
        let bundle = ArtifactBundle::load(&MemorySource::complete()).unwrap();
        for &class in bundle.classifier().classes() {
            let label = bundle.label_decoder().inverse_transform(class).unwrap();
            assert!(!label.is_empty());
        }
    }
}
