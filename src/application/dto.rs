use serde::{Deserialize, Serialize};

use crate::domain::prediction::Diagnosis;

/// Sobre estándar `{status, message}` de la API.
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: "success".into(), message: message.into() }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self { status: "ok".into(), message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: "error".into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub labels: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub status: String,
    #[serde(flatten)]
    pub diagnosis: Diagnosis,
}

impl From<Diagnosis> for PredictionResponse {
    fn from(diagnosis: Diagnosis) -> Self {
        Self { status: "success".into(), diagnosis }
    }
}

/// Cuerpo JSON alternativo de `/predict-disease`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Base64ImageRequest {
    pub image_base64: Option<String>,
}
