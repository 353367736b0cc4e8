use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::application::ports::UploadStorePort;
use crate::domain::errors::{DomainError, DomainResult};

/// Directorio temporal de subidas. Cada petición usa un nombre UUID propio.
pub struct FsUploadStore {
    dir: PathBuf,
}

impl FsUploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).with_context(|| format!("Cannot create {}", dir.display()))?;
        Ok(Self { dir })
    }
}

fn log_remove_error(path: &Path, e: std::io::Error) {
    if e.kind() != ErrorKind::NotFound {
        warn!("No se pudo borrar {}: {}", path.display(), e);
    }
}

#[async_trait]
impl UploadStorePort for FsUploadStore {
    async fn save(&self, extension: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
        let path = self.dir.join(format!("{}.{}", Uuid::new_v4(), extension));
        fs::write(&path, bytes).await.map_err(|e| {
            DomainError::OperationFailed(format!("Cannot store upload {}: {}", path.display(), e))
        })?;
        Ok(path)
    }

    async fn load(&self, path: &Path) -> DomainResult<Vec<u8>> {
        fs::read(path).await.map_err(|e| {
            DomainError::OperationFailed(format!("Cannot read upload {}: {}", path.display(), e))
        })
    }

    async fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            log_remove_error(path, e);
        }
    }

    fn discard_now(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            log_remove_error(path, e);
        }
    }
}
