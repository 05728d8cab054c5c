use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::Instrument;

use crate::error::ApiError;
use crate::intake::{self, FileKind, Upload, MAX_NPZ_BYTES, MAX_SEQUENCE_BYTES};
use crate::models::{BackendKind, PredictionResult, StatusReport, UploadLimits};
use crate::normalize::normalize;
use crate::sequence;
use crate::AppState;

pub const SUPPORTED_FORMATS: [&str; 4] = [
    "FASTA (.fasta, .fa)",
    "Text (.txt)",
    "Sequence (.seq)",
    "Preprocessed (.npz)",
];

/// `POST /api/predict`
pub async fn predict(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let upload = intake::read_upload(payload).await?;

    let span = tracing::info_span!(
        "predict",
        request_id = %upload.request_id,
        filename = %upload.filename
    );
    let result = resolve_upload(&state, &upload).instrument(span).await;

    Ok(HttpResponse::Ok().json(result))
}

async fn resolve_upload(state: &AppState, upload: &Upload) -> PredictionResult {
    tracing::info!(bytes = upload.data.len(), "processing upload");

    // The browser enforces these; here they are only logged.
    match upload.kind() {
        FileKind::Unsupported => tracing::warn!("unrecognised file extension"),
        _ if upload.exceeds_advisory_limit() => {
            tracing::warn!("upload is larger than the page allows for its type")
        }
        _ => {}
    }

    let inspection = sequence::inspect(upload);
    let resolution = state.chain.resolve(upload).await;
    let result = normalize(resolution, upload, inspection);

    tracing::info!(
        prediction = %result.prediction,
        confidence = result.confidence,
        backend = %result.backend_type,
        "prediction complete"
    );
    result
}

/// `GET /api/predict`: reflects configuration only, never calls a backend.
pub async fn status(state: web::Data<AppState>) -> HttpResponse {
    let config = &state.config;
    let (backend_type, mode) = if config.ml_api_url.is_some() {
        (BackendKind::External, "external")
    } else {
        (BackendKind::Mock, "demo")
    };

    HttpResponse::Ok().json(StatusReport {
        status: "healthy",
        message: "DSPD Prediction API is running",
        backend_type,
        mode,
        ml_service_url: config
            .ml_api_url
            .clone()
            .unwrap_or_else(|| "not_configured".to_string()),
        local_fallback: config.local_fallback,
        timeout_secs: config.timeout.as_secs_f64(),
        supported_formats: SUPPORTED_FORMATS.to_vec(),
        upload_limits: UploadLimits {
            sequence_max_bytes: MAX_SEQUENCE_BYTES,
            npz_max_bytes: MAX_NPZ_BYTES,
        },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
