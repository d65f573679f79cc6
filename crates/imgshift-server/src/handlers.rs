//! Route handlers.
//!
//! Both processing endpoints share the same body and run the pipeline on
//! the blocking thread pool. They differ only in how the result is sent.

use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use imgshift_core::{decode_field, process_with_config, PipelineConfig, PipelineResult};

use crate::error::ApiError;
use crate::types::{Base64Response, HealthResponse, ProcessRequest};

/// `POST /process-base64`
pub async fn process_base64(
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<Base64Response>, ApiError> {
    let Json(request) = payload?;
    let result = run_pipeline(request).await?;

    Ok(Json(Base64Response {
        processed_base64: STANDARD.encode(&result.bytes),
    }))
}

/// `POST /process-binary`
pub async fn process_binary(
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let result = run_pipeline(request).await?;

    let filename = format!(
        "processed-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        result.extension
    );
    let headers = [
        (header::CONTENT_TYPE, result.mime_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, result.bytes).into_response())
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn run_pipeline(request: ProcessRequest) -> Result<PipelineResult, ApiError> {
    let buffer = decode_field(request.base64.as_deref())?;

    let options = request.options.unwrap_or_default();
    let mut config = PipelineConfig::from_options(&options);
    if let Some(noise) = request.noise {
        config = config.with_noise_magnitude(noise);
    }

    tracing::debug!(input_bytes = buffer.len(), ?config, "running pipeline");

    let result = tokio::task::spawn_blocking(move || process_with_config(&buffer, &config))
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {e}")))??;

    Ok(result)
}
