use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::onnx::{classifier::TensorLayout, model_catalog::MIN_MODEL_BYTES};
use crate::domain::tensor::MODEL_INPUT_SIZE;

/// Backend de SmartAg: diagnóstico de enfermedades en hojas y telemetría de sensores.
#[derive(Parser, Debug)]
#[command(name = "smartag-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Sin subcomando se arranca el servidor HTTP.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Genera class_labels.txt a partir de un dataset con una carpeta por clase
    ExportLabels {
        /// Carpeta del dataset (una subcarpeta por clase)
        #[arg(short, long, default_value = "leaf_dataset")]
        dataset: PathBuf,

        /// Fichero de etiquetas a escribir
        #[arg(short, long, default_value = "class_labels.txt")]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Host to bind to
    #[arg(long, env = "SMARTAG_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "SMARTAG_PORT", default_value = "5000")]
    pub port: u16,

    /// Candidate model files, tried in order (repeat the flag)
    #[arg(
        long = "model",
        env = "SMARTAG_MODELS",
        value_delimiter = ',',
        default_values = ["crop_disease_model.onnx", "models/crop_disease_model.onnx"]
    )]
    pub models: Vec<PathBuf>,

    /// Class label file (one label per line, model output order)
    #[arg(long, env = "SMARTAG_LABELS", default_value = "class_labels.txt")]
    pub labels: PathBuf,

    /// JSON document holding the latest sensor reading
    #[arg(long, env = "SMARTAG_SENSOR_FILE", default_value = "sensor_data.json")]
    pub sensor_file: PathBuf,

    /// Scratch directory for uploaded images
    #[arg(long, env = "SMARTAG_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Static web UI directory
    #[arg(long, env = "SMARTAG_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Maximum request body, in megabytes
    #[arg(long, env = "SMARTAG_MAX_UPLOAD_MB", default_value = "10")]
    pub max_upload_mb: usize,

    /// Model files at or below this size (bytes) are ignored
    #[arg(long, env = "SMARTAG_MIN_MODEL_BYTES", default_value_t = MIN_MODEL_BYTES)]
    pub min_model_bytes: u64,

    /// Axis order of the model input
    #[arg(long, env = "SMARTAG_INPUT_LAYOUT", value_enum, default_value_t = TensorLayout::Nhwc)]
    pub input_layout: TensorLayout,

    /// Side of the square model input, in pixels
    #[arg(long, env = "SMARTAG_INPUT_SIZE", default_value_t = MODEL_INPUT_SIZE)]
    pub input_size: u32,
}

/// Configuración resuelta del servidor.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_candidates: Vec<PathBuf>,
    pub labels_path: PathBuf,
    pub sensor_file: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_body_bytes: usize,
    pub min_model_bytes: u64,
    pub input_layout: TensorLayout,
    pub input_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            model_candidates: vec![
                PathBuf::from("crop_disease_model.onnx"),
                PathBuf::from("models/crop_disease_model.onnx"),
            ],
            labels_path: PathBuf::from("class_labels.txt"),
            sensor_file: PathBuf::from("sensor_data.json"),
            upload_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("static"),
            max_body_bytes: 10 * 1024 * 1024,
            min_model_bytes: MIN_MODEL_BYTES,
            input_layout: TensorLayout::Nhwc,
            input_size: MODEL_INPUT_SIZE,
        }
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(a: ServerArgs) -> anyhow::Result<Self> {
        if a.max_upload_mb == 0 {
            bail!("--max-upload-mb must be at least 1");
        }
        let max_body_bytes = a
            .max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("--max-upload-mb {} is too large", a.max_upload_mb))?;

        Ok(Self {
            host: a.host,
            port: a.port,
            model_candidates: a.models,
            labels_path: a.labels,
            sensor_file: a.sensor_file,
            upload_dir: a.upload_dir,
            static_dir: a.static_dir,
            max_body_bytes,
            min_model_bytes: a.min_model_bytes,
            input_layout: a.input_layout,
            input_size: a.input_size,
        })
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
