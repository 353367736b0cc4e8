use serde::Serialize;

use super::errors::{DomainError, DomainResult};
use super::labels::ClassLabels;

/// Resultado de una clasificación: clase ganadora y confianza en porcentaje.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_id: usize,
    pub label: String,
    /// Probabilidad máxima * 100, redondeada a 2 decimales.
    pub confidence: f64,
}

/// Diagnóstico completo devuelto por `/predict-disease`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub predicted_disease: String,
    pub confidence: f64,
    pub treatment: String,
}

impl Prediction {
    /// Argmax sobre el vector de puntuaciones del modelo.
    /// Si el índice supera la lista de etiquetas se usa `Class_{index}`.
    pub fn from_scores(scores: &[f32], labels: &ClassLabels) -> DomainResult<Self> {
        let (class_id, max_score) = argmax(scores)
            .ok_or_else(|| DomainError::OperationFailed("Model returned no scores".into()))?;

        if class_id >= labels.len() {
            tracing::warn!(
                "Índice {} fuera de la lista de etiquetas ({}); class_labels.txt no coincide con el modelo",
                class_id,
                labels.len()
            );
        }

        Ok(Self {
            class_id,
            label: labels.name_or_synthetic(class_id),
            confidence: to_percent(max_score),
        })
    }
}

/// Primer máximo del vector. Los NaN nunca ganan.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .fold(None, |best, (i, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
}

fn to_percent(score: f32) -> f64 {
    (f64::from(score) * 100.0 * 100.0).round() / 100.0
}
