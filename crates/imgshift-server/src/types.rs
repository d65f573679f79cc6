//! JSON request and response bodies.

use imgshift_core::PipelineOptions;
use serde::{Deserialize, Serialize};

/// Body accepted by both processing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    /// Base64 payload, optionally with a `data:` URI header
    pub base64: Option<String>,
    #[serde(default)]
    pub options: Option<PipelineOptions>,
    /// Shorthand for the active noise strategy's magnitude
    #[serde(default)]
    pub noise: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64Response {
    pub processed_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
