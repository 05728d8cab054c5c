//! Map whichever resolver fired onto the caller-facing [`PredictionResult`].
//!
//! Raw provider fields are mapped as follows:
//!
//! | provider field                                   | result field                  |
//! |--------------------------------------------------|-------------------------------|
//! | `prediction` (short or "Detected" form)          | `prediction`                  |
//! | `mutation_probability` / `mutation_prob`         | `mutation_probability`        |
//! | `non_mutation_probability` / `non_mutation_prob` | `non_mutation_probability`    |
//! | `confidence`                                     | recomputed from probabilities |
//! | `processing_time`                                | `processing_time`             |
//! | `sequence_length`, `processed_shape`, `preprocessing_method` | same, else local inspection |
//! | `model_status`                                   | `model_status`, else a tag per backend |
//! | `backend_type`                                   | replaced by the candidate tag |

use chrono::Utc;
use std::time::Duration;

use crate::error::CandidateError;
use crate::intake::Upload;
use crate::mock::{round_to, MockPrediction};
use crate::models::{
    BackendKind, Prediction, PredictionResult, SequenceLength, UpstreamPrediction,
};
use crate::resolver::{Failure, Resolution};
use crate::sequence::Inspection;

pub const STATUS_EXTERNAL: &str = "external_prediction";
pub const STATUS_LOCAL: &str = "local_prediction";
pub const STATUS_MOCK_NOT_CONFIGURED: &str = "mock_prediction (ML service not configured)";
pub const STATUS_MOCK_UNAVAILABLE: &str = "mock_prediction (ML service unavailable)";

const DEMO_NOTE: &str =
    "Demo mode: no ML service is configured (set ML_API_URL); this result is mock data";

/// A provider answer that passed structural checks.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePrediction {
    pub prediction: Prediction,
    pub mutation_probability: f64,
    pub non_mutation_probability: f64,
    pub processing_time: Option<f64>,
    pub sequence_length: Option<SequenceLength>,
    pub processed_shape: Option<[usize; 2]>,
    pub preprocessing_method: Option<String>,
    pub model_status: Option<String>,
    pub raw_prediction: Option<Vec<Vec<f64>>>,
}

impl TryFrom<UpstreamPrediction> for CandidatePrediction {
    type Error = CandidateError;

    fn try_from(raw: UpstreamPrediction) -> Result<Self, Self::Error> {
        let mutation = raw
            .mutation_probability
            .ok_or_else(|| CandidateError::Invalid("missing mutation probability".into()))?;
        check_probability("mutation_probability", mutation)?;

        let non_mutation = raw.non_mutation_probability.unwrap_or(1.0 - mutation);
        check_probability("non_mutation_probability", non_mutation)?;

        if let Some(time) = raw.processing_time {
            if !time.is_finite() || time < 0.0 {
                return Err(CandidateError::Invalid(format!(
                    "processing_time {} is negative",
                    time
                )));
            }
        }

        Ok(Self {
            prediction: raw
                .prediction
                .unwrap_or_else(|| Prediction::from_mutation_probability(mutation)),
            mutation_probability: mutation,
            non_mutation_probability: non_mutation,
            processing_time: raw.processing_time,
            sequence_length: raw.sequence_length,
            processed_shape: raw
                .processed_shape
                .and_then(|shape| <[usize; 2]>::try_from(shape.as_slice()).ok()),
            preprocessing_method: raw.preprocessing_method,
            model_status: raw.model_status,
            raw_prediction: raw.raw_prediction,
        })
    }
}

fn check_probability(field: &str, value: f64) -> Result<(), CandidateError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CandidateError::Invalid(format!("{} {} outside [0, 1]", field, value)))
    }
}

pub fn normalize(
    resolution: Resolution,
    upload: &Upload,
    inspection: Inspection,
) -> PredictionResult {
    match resolution {
        Resolution::Candidate {
            backend,
            endpoint,
            prediction,
            elapsed,
        } => from_candidate(backend, endpoint, prediction, elapsed, upload, inspection),
        Resolution::Mock {
            prediction,
            failures,
        } => from_mock(prediction, &failures, upload, inspection),
    }
}

fn from_candidate(
    backend: BackendKind,
    endpoint: String,
    answer: CandidatePrediction,
    elapsed: Duration,
    upload: &Upload,
    inspection: Inspection,
) -> PredictionResult {
    let default_status = match backend {
        BackendKind::Local => STATUS_LOCAL,
        _ => STATUS_EXTERNAL,
    };

    PredictionResult {
        prediction: answer.prediction,
        mutation_probability: answer.mutation_probability,
        non_mutation_probability: answer.non_mutation_probability,
        confidence: answer
            .mutation_probability
            .max(answer.non_mutation_probability),
        processing_time: answer
            .processing_time
            .unwrap_or_else(|| round_to(elapsed.as_secs_f64(), 3)),
        sequence_length: answer.sequence_length.unwrap_or(inspection.sequence_length),
        filename: upload.filename.clone(),
        processed_shape: answer.processed_shape.unwrap_or(inspection.processed_shape),
        preprocessing_method: answer
            .preprocessing_method
            .unwrap_or_else(|| inspection.preprocessing_method.to_string()),
        backend_type: backend,
        model_status: answer
            .model_status
            .unwrap_or_else(|| default_status.to_string()),
        raw_prediction: answer.raw_prediction,
        warning: None,
        note: None,
        used_endpoint: Some(endpoint),
        timestamp: Utc::now(),
    }
}

fn from_mock(
    mock: MockPrediction,
    failures: &[Failure],
    upload: &Upload,
    inspection: Inspection,
) -> PredictionResult {
    let (model_status, warning, note) = if failures.is_empty() {
        (
            STATUS_MOCK_NOT_CONFIGURED,
            None,
            Some(DEMO_NOTE.to_string()),
        )
    } else {
        (
            STATUS_MOCK_UNAVAILABLE,
            Some(format!(
                "ML service unavailable ({} backend(s) failed); \
                 this result is mock data for demo purposes",
                failures.len()
            )),
            None,
        )
    };

    PredictionResult {
        raw_prediction: Some(mock.raw_prediction()),
        prediction: mock.prediction,
        mutation_probability: mock.mutation_probability,
        non_mutation_probability: mock.non_mutation_probability,
        confidence: mock.confidence,
        processing_time: mock.processing_time,
        sequence_length: inspection.sequence_length,
        filename: upload.filename.clone(),
        processed_shape: inspection.processed_shape,
        preprocessing_method: inspection.preprocessing_method.to_string(),
        backend_type: BackendKind::Mock,
        model_status: model_status.to_string(),
        warning,
        note,
        used_endpoint: None,
        timestamp: Utc::now(),
    }
}
