use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{PredictionService, SensorService};

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Diagnóstico de enfermedades a partir de imágenes.
    pub prediction: Arc<PredictionService>,
    /// Última lectura del sensor de campo.
    pub sensors: Arc<SensorService>,
    /// Carpeta de la interfaz web (index.html, favicon, js).
    pub static_dir: PathBuf,
    /// Límite del cuerpo de las peticiones, en bytes.
    pub max_body_bytes: usize,
}

impl HttpState {
    /// Límite legible para el mensaje de error 413.
    pub fn max_body_label(&self) -> String {
        format_limit(self.max_body_bytes)
    }
}

const MIB: usize = 1024 * 1024;

fn format_limit(bytes: usize) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}
