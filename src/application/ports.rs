use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::{
    errors::DomainResult,
    sensor::{LatestSensor, SensorReading},
    tensor::ImageTensor,
};

/// Modelo de clasificación de hojas (ONNX en producción, falso en tests).
#[async_trait]
pub trait ClassifierPort: Send + Sync {
    /// Lado de la imagen cuadrada que espera el modelo.
    fn input_size(&self) -> u32;
    /// Una puntuación por clase, en el orden de `class_labels.txt`.
    async fn classify(&self, input: ImageTensor) -> DomainResult<Vec<f32>>;
}

/// Documento único con la última lectura del sensor.
#[async_trait]
pub trait SensorRepositoryPort: Send + Sync {
    /// Nunca falla: si el documento falta o está corrupto devuelve campos nulos.
    async fn read_latest(&self) -> LatestSensor;
    /// Sustituye el documento completo.
    async fn write_latest(&self, reading: &SensorReading) -> DomainResult<()>;
}

/// Directorio temporal de imágenes subidas.
#[async_trait]
pub trait UploadStorePort: Send + Sync {
    /// Guarda los bytes con un nombre único y la extensión dada.
    async fn save(&self, extension: &str, bytes: &[u8]) -> DomainResult<PathBuf>;
    async fn load(&self, path: &Path) -> DomainResult<Vec<u8>>;
    /// Borra el archivo; los errores sólo se registran.
    async fn discard(&self, path: &Path);
    /// Variante síncrona de `discard`, usable desde `Drop` cuando la
    /// petición se cancela antes de terminar.
    fn discard_now(&self, path: &Path);
}
