use serde::Serialize;
use serde_json::Value;

use super::errors::{DomainError, DomainResult};

pub const SENSOR_FIELDS: [&str; 3] = ["temperature", "humidity", "soil_moisture"];

/// Lectura validada del sensor de campo. Es el documento completo que se persiste.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
}

/// Vista de lectura: cualquier campo ausente o corrupto se devuelve como `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatestSensor {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
}

impl SensorReading {
    /// Valida un cuerpo JSON arbitrario: objeto con las tres claves, cada una
    /// convertible a número (números, cadenas numéricas o booleanos).
    pub fn from_json(payload: &Value) -> DomainResult<Self> {
        let obj = payload
            .as_object()
            .ok_or_else(|| DomainError::InvalidSensorData("Invalid JSON".into()))?;

        if !SENSOR_FIELDS.iter().all(|k| obj.contains_key(*k)) {
            return Err(DomainError::InvalidSensorData("Missing keys in data".into()));
        }

        Ok(Self {
            temperature: coerce(&obj["temperature"], "temperature")?,
            humidity: coerce(&obj["humidity"], "humidity")?,
            soil_moisture: coerce(&obj["soil_moisture"], "soil_moisture")?,
        })
    }
}

impl LatestSensor {
    /// Extrae los campos de un documento ya parseado. Nunca falla.
    pub fn from_document(doc: &Value) -> Self {
        let field = |k: &str| doc.get(k).and_then(Value::as_f64);
        Self {
            temperature: field("temperature"),
            humidity: field("humidity"),
            soil_moisture: field("soil_moisture"),
        }
    }
}

impl From<SensorReading> for LatestSensor {
    fn from(r: SensorReading) -> Self {
        Self {
            temperature: Some(r.temperature),
            humidity: Some(r.humidity),
            soil_moisture: Some(r.soil_moisture),
        }
    }
}

fn coerce(value: &Value, field: &str) -> DomainResult<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    // NaN/inf no se pueden serializar en JSON: se rechazan.
    number.filter(|n| n.is_finite()).ok_or_else(|| {
        DomainError::InvalidSensorData(format!("Invalid value for '{}': expected a number", field))
    })
}
