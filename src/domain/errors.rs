use std::path::PathBuf;
use thiserror::Error;

/// Errores del dominio. Los mensajes se devuelven tal cual al cliente HTTP,
/// por eso van en inglés (contrato de la API móvil).
#[derive(Debug, Error)]
pub enum DomainError {
    // --- Arranque (fatales) ---
    #[error("No valid model found. Expected one of: {}", format_paths(.candidates))]
    ModelNotFound { candidates: Vec<PathBuf> },
    #[error("{} not found.", .0.display())]
    LabelsNotFound(PathBuf),
    #[error("{} is empty.", .0.display())]
    EmptyLabels(PathBuf),

    // --- Validación de peticiones ---
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidSensorData(String),
    #[error("Only .jpg/.jpeg/.png allowed")]
    UnsupportedExtension,
    /// `limit` ya viene formateado con su unidad ("10 MB", "512 KB").
    #[error("File too large (max {limit})")]
    PayloadTooLarge { limit: String },
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,

    // --- Fallos internos ---
    #[error("Cannot decode image: {0}")]
    ImageDecode(String),
    #[error("{0}")]
    OperationFailed(String),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" / ")
}

pub type DomainResult<T> = Result<T, DomainError>;
