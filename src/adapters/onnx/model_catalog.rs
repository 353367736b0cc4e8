use std::fs;
use std::path::PathBuf;

use crate::domain::errors::{DomainError, DomainResult};

/// Tamaño mínimo de un modelo válido (100 KiB). Descarta ficheros truncados.
pub const MIN_MODEL_BYTES: u64 = 100 * 1024;

/// Lista ordenada de rutas candidatas para el modelo ONNX.
pub struct OnnxModelCatalog {
    candidates: Vec<PathBuf>,
    min_bytes: u64,
}

impl OnnxModelCatalog {
    pub fn new(candidates: Vec<PathBuf>, min_bytes: u64) -> Self {
        Self { candidates, min_bytes }
    }

    /// Primer candidato que existe y supera el tamaño mínimo.
    pub fn select(&self) -> DomainResult<PathBuf> {
        self.candidates
            .iter()
            .find(|path| {
                fs::metadata(path)
                    .map(|m| m.is_file() && m.len() > self.min_bytes)
                    .unwrap_or(false)
            })
            .cloned()
            .ok_or_else(|| DomainError::ModelNotFound {
                candidates: self.candidates.clone(),
            })
    }
}
