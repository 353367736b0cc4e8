use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::application::ports::SensorRepositoryPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::sensor::{LatestSensor, SensorReading};

/// Última lectura del sensor guardada como un único documento JSON.
pub struct JsonSensorStore {
    path: PathBuf,
}

impl JsonSensorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Crea el documento vacío (`{}`) si todavía no existe.
    pub async fn init(&self) -> Result<()> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
        fs::write(&self.path, "{}")
            .await
            .with_context(|| format!("Cannot create {}", self.path.display()))?;
        Ok(())
    }

    // Escritura atómica: fichero temporal hermano + rename.
    async fn replace(&self, contents: &[u8]) -> std::io::Result<()> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sensor_data.json".into());
        let tmp = self.path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl SensorRepositoryPort for JsonSensorStore {
    async fn read_latest(&self) -> LatestSensor {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("No se pudo leer {}: {}", self.path.display(), e);
                return LatestSensor::default();
            }
        };
        match serde_json::from_slice::<Value>(&raw) {
            Ok(doc) => LatestSensor::from_document(&doc),
            Err(e) => {
                warn!("{} corrupto, se devuelven nulos: {}", self.path.display(), e);
                LatestSensor::default()
            }
        }
    }

    async fn write_latest(&self, reading: &SensorReading) -> DomainResult<()> {
        let body = serde_json::to_vec_pretty(reading)
            .map_err(|e| DomainError::OperationFailed(e.to_string()))?;
        self.replace(&body).await.map_err(|e| {
            DomainError::OperationFailed(format!("Cannot write {}: {}", self.path.display(), e))
        })
    }
}
