use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{prelude::BASE64_STANDARD, Engine};
use image::ImageFormat;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    application::ports::{ClassifierPort, SensorRepositoryPort, UploadStorePort},
    domain::{
        errors::{DomainError, DomainResult},
        labels::ClassLabels,
        prediction::{Diagnosis, Prediction},
        sensor::{LatestSensor, SensorReading},
        tensor::{self, ImageTensor},
        treatment,
        upload::{self, DEFAULT_UPLOAD_NAME},
    },
};

/// Caso de uso principal: imagen de hoja -> enfermedad + tratamiento.
/// Toda imagen guardada en el directorio temporal se borra antes de responder.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn ClassifierPort>,
    labels: Arc<ClassLabels>,
    uploads: Arc<dyn UploadStorePort>,
}

impl PredictionService {
    pub fn new(
        classifier: Arc<dyn ClassifierPort>,
        labels: Arc<ClassLabels>,
        uploads: Arc<dyn UploadStorePort>,
    ) -> Self {
        Self {
            classifier,
            labels,
            uploads,
        }
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Imagen recibida como archivo de formulario. La extensión se valida
    /// antes de tocar disco o modelo.
    pub async fn predict_upload(&self, file_name: Option<&str>, bytes: &[u8]) -> DomainResult<Diagnosis> {
        let file_name = file_name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_UPLOAD_NAME);
        let Some(ext) = upload::allowed_extension(file_name) else {
            warn!("Subida rechazada por extensión: {}", file_name);
            return Err(DomainError::UnsupportedExtension);
        };
        self.diagnose(&ext, bytes).await
    }

    /// Imagen en base64 (con o sin prefijo `data:`). Se normaliza a PNG.
    pub async fn predict_base64(&self, payload: &str) -> DomainResult<Diagnosis> {
        let raw = BASE64_STANDARD
            .decode(upload::strip_data_uri(payload))
            .map_err(|e| DomainError::InvalidInput(format!("Invalid base64 image data: {}", e)))?;

        let png = tokio::task::spawn_blocking(move || -> DomainResult<Vec<u8>> {
            let img = tensor::decode(&raw)?;
            let mut buf = Cursor::new(Vec::new());
            img.to_rgb8()
                .write_to(&mut buf, ImageFormat::Png)
                .map_err(|e| DomainError::OperationFailed(format!("Cannot re-encode image: {}", e)))?;
            Ok(buf.into_inner())
        })
        .await
        .map_err(join_error)??;

        self.diagnose("png", &png).await
    }

    async fn diagnose(&self, extension: &str, bytes: &[u8]) -> DomainResult<Diagnosis> {
        let path = self.uploads.save(extension, bytes).await?;
        let scratch = ScratchUpload::new(self.uploads.clone(), path);
        let outcome = self.diagnose_file(scratch.path()).await;
        scratch.discard().await;
        outcome
    }

    async fn diagnose_file(&self, path: &Path) -> DomainResult<Diagnosis> {
        let bytes = self.uploads.load(path).await?;
        let size = self.classifier.input_size();

        let input = tokio::task::spawn_blocking(move || ImageTensor::from_encoded(&bytes, size))
            .await
            .map_err(join_error)??;

        let scores = self.classifier.classify(input).await?;
        let prediction = Prediction::from_scores(&scores, &self.labels)?;
        let advice = treatment::recommend(&prediction.label);

        info!(
            "Predicción -> {} ({:.2}%) | {}",
            prediction.label, prediction.confidence, advice
        );

        Ok(Diagnosis {
            predicted_disease: prediction.label,
            confidence: prediction.confidence,
            treatment: advice.to_string(),
        })
    }
}

/// Imagen guardada en el directorio temporal. Si el futuro de la petición se
/// abandona (cliente desconectado) el archivo se borra en `Drop`.
struct ScratchUpload {
    store: Arc<dyn UploadStorePort>,
    path: PathBuf,
    pending: bool,
}

impl ScratchUpload {
    fn new(store: Arc<dyn UploadStorePort>, path: PathBuf) -> Self {
        Self { store, path, pending: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn discard(mut self) {
        self.store.discard(&self.path).await;
        self.pending = false;
    }
}

impl Drop for ScratchUpload {
    fn drop(&mut self) {
        if self.pending {
            warn!("Petición cancelada; se borra {}", self.path.display());
            self.store.discard_now(&self.path);
        }
    }
}

/// Telemetría del sensor de campo: sólo se guarda la última lectura.
#[derive(Clone)]
pub struct SensorService {
    repo: Arc<dyn SensorRepositoryPort>,
}

impl SensorService {
    pub fn new(repo: Arc<dyn SensorRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn latest(&self) -> LatestSensor {
        self.repo.read_latest().await
    }

    /// Valida el cuerpo y sustituye la lectura guardada. Un cuerpo inválido
    /// no modifica el documento.
    pub async fn update(&self, payload: &Value) -> DomainResult<SensorReading> {
        let reading = SensorReading::from_json(payload)?;
        self.repo.write_latest(&reading).await?;
        info!(
            "Sensor: Temp {}°C | Hum {}% | Suelo {}",
            reading.temperature, reading.humidity, reading.soil_moisture
        );
        Ok(reading)
    }
}

fn join_error(e: tokio::task::JoinError) -> DomainError {
    DomainError::OperationFailed(format!("Worker task failed: {}", e))
}
