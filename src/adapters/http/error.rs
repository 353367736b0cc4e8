use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::dto::StatusMessage;
use crate::domain::errors::DomainError;

/// Error de un manejador HTTP. Siempre se responde con el sobre
/// `{"status": "error", "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::InvalidInput(_)
            | DomainError::InvalidSensorData(_)
            | DomainError::UnsupportedExtension => StatusCode::BAD_REQUEST,
            DomainError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            DomainError::ModelNotFound { .. }
            | DomainError::LabelsNotFound(_)
            | DomainError::EmptyLabels(_)
            | DomainError::ImageDecode(_)
            | DomainError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Error interno: {}", self.0);
        } else if status != StatusCode::NOT_FOUND {
            tracing::warn!("Petición rechazada ({}): {}", status.as_u16(), self.0);
        }
        (status, Json(StatusMessage::error(self.0.to_string()))).into_response()
    }
}
