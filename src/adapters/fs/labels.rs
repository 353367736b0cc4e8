use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::labels::ClassLabels;

/// Carga `class_labels.txt`. Se ejecuta una sola vez al arrancar.
pub fn load_labels(path: &Path) -> DomainResult<ClassLabels> {
    if !path.is_file() {
        return Err(DomainError::LabelsNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)
        .map_err(|e| DomainError::OperationFailed(format!("Cannot read {}: {}", path.display(), e)))?;
    ClassLabels::parse(&text, path)
}

/// Escribe el fichero de etiquetas a partir de un dataset organizado en una
/// carpeta por clase. El orden alfabético es el índice que asigna el
/// generador de entrenamiento, así que el fichero coincide con el modelo.
pub fn export_labels(dataset: &Path, output: &Path) -> Result<usize> {
    if !dataset.is_dir() {
        bail!("Dataset directory does not exist: {}", dataset.display());
    }

    let mut classes = Vec::new();
    for entry in fs::read_dir(dataset).with_context(|| format!("Cannot list {}", dataset.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                classes.push(name.to_string());
            }
        }
    }
    classes.sort();

    if classes.is_empty() {
        bail!("No class folders found in {}", dataset.display());
    }

    let mut text = classes.join("\n");
    text.push('\n');
    fs::write(output, text).with_context(|| format!("Cannot write {}", output.display()))?;

    tracing::info!("{} clases exportadas a {}", classes.len(), output.display());
    Ok(classes.len())
}
