use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Mutation probability above which a sample is labelled DSPD.
pub const DSPD_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    #[serde(rename = "DSPD", alias = "DSPD Detected")]
    Dspd,
    #[serde(rename = "No DSPD", alias = "No DSPD Detected")]
    NoDspd,
}

impl Prediction {
    pub fn from_mutation_probability(probability: f64) -> Self {
        if probability > DSPD_THRESHOLD {
            Prediction::Dspd
        } else {
            Prediction::NoDspd
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Prediction::Dspd => "DSPD",
            Prediction::NoDspd => "No DSPD",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Nucleotide count of the upload, or a marker when it could not be counted.
///
/// Serializes as a bare integer or as the strings `"Preprocessed"` / `"Unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceLength {
    Known(usize),
    Preprocessed,
    Unknown,
}

impl Serialize for SequenceLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SequenceLength::Known(n) => serializer.serialize_u64(*n as u64),
            SequenceLength::Preprocessed => serializer.serialize_str("Preprocessed"),
            SequenceLength::Unknown => serializer.serialize_str("Unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for SequenceLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(usize),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Count(n) => SequenceLength::Known(n),
            Raw::Text(text) if text == "Preprocessed" => SequenceLength::Preprocessed,
            Raw::Text(_) => SequenceLength::Unknown,
        })
    }
}

/// Which branch of the resolution chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendKind {
    #[serde(rename = "external_ml_service")]
    External,
    #[serde(rename = "local_ml_service")]
    Local,
    #[serde(rename = "mock")]
    Mock,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::External => "external_ml_service",
            BackendKind::Local => "local_ml_service",
            BackendKind::Mock => "mock",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one response shape returned by `POST /api/predict`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub prediction: Prediction,
    pub mutation_probability: f64,
    pub non_mutation_probability: f64,
    pub confidence: f64,
    pub processing_time: f64,
    pub sequence_length: SequenceLength,
    pub filename: String,
    pub processed_shape: [usize; 2],
    pub preprocessing_method: String,
    pub backend_type: BackendKind,
    pub model_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_prediction: Option<Vec<Vec<f64>>>,
    #[serde(rename = "_warning", skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(rename = "_note", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "_used_endpoint", skip_serializing_if = "Option::is_none")]
    pub used_endpoint: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Body returned by an inference service, before normalization.
///
/// Providers disagree on field names; both spellings are accepted here.
/// `confidence` and `backend_type` are deliberately not read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamPrediction {
    pub prediction: Option<Prediction>,
    #[serde(alias = "mutation_prob")]
    pub mutation_probability: Option<f64>,
    #[serde(alias = "non_mutation_prob")]
    pub non_mutation_probability: Option<f64>,
    pub processing_time: Option<f64>,
    pub sequence_length: Option<SequenceLength>,
    pub processed_shape: Option<Vec<usize>>,
    pub preprocessing_method: Option<String>,
    pub model_status: Option<String>,
    pub raw_prediction: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Serialize)]
pub struct UploadLimits {
    pub sequence_max_bytes: usize,
    pub npz_max_bytes: usize,
}

/// Body of `GET /api/predict`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub message: &'static str,
    pub backend_type: BackendKind,
    pub mode: &'static str,
    pub ml_service_url: String,
    pub local_fallback: bool,
    pub timeout_secs: f64,
    pub supported_formats: Vec<&'static str>,
    pub upload_limits: UploadLimits,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
