use std::path::Path;

use super::errors::{DomainError, DomainResult};

/// Lista ordenada de clases. La posición coincide con el índice de salida del modelo.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Construye la lista a partir del contenido de `class_labels.txt`.
    /// `source` sólo se usa para el mensaje de error.
    pub fn parse(text: &str, source: &Path) -> DomainResult<Self> {
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();

        if names.is_empty() {
            return Err(DomainError::EmptyLabels(source.to_path_buf()));
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Nombre de la clase `index`, o `Class_{index}` si el modelo tiene más
    /// salidas que etiquetas.
    pub fn name_or_synthetic(&self, index: usize) -> String {
        match self.get(index) {
            Some(name) => name.to_string(),
            None => format!("Class_{}", index),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
