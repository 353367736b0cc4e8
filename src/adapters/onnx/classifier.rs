use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ndarray::Array4;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::application::ports::ClassifierPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::tensor::ImageTensor;

/// Orden de ejes que espera la entrada del grafo ONNX.
/// Un modelo Keras exportado con tf2onnx conserva NHWC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TensorLayout {
    #[default]
    Nhwc,
    Nchw,
}

/// Clasificador de hojas sobre ONNX Runtime.
pub struct OnnxClassifier {
    // `Session::run` necesita acceso exclusivo.
    session: Arc<Mutex<Session>>,
    layout: TensorLayout,
    input_size: u32,
}

impl OnnxClassifier {
    pub fn load(path: &Path, layout: TensorLayout, input_size: u32) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            layout,
            input_size,
        })
    }
}

#[async_trait]
impl ClassifierPort for OnnxClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    async fn classify(&self, input: ImageTensor) -> DomainResult<Vec<f32>> {
        let session = self.session.clone();
        let layout = self.layout;

        tokio::task::spawn_blocking(move || {
            let (shape, data) = to_model_input(input, layout)?;
            run(&session, shape, data)
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("Inference task failed: {}", e)))?
        .map_err(|e| DomainError::OperationFailed(format!("Inference failed: {}", e)))
    }
}

fn run(session: &Mutex<Session>, shape: Vec<i64>, data: Vec<f32>) -> Result<Vec<f32>> {
    let input_tensor = Value::from_array((shape, data))?;

    let mut session = session
        .lock()
        .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
    let outputs = session.run(ort::inputs![input_tensor])?;
    let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

    // Salida [1, clases]: nos quedamos con la fila del único elemento del lote.
    let classes = shape_out.iter().copied().last().unwrap_or(0).max(0) as usize;
    Ok(data_out[..classes.min(data_out.len())].to_vec())
}

/// Convierte el tensor HWC del dominio a la forma de entrada del grafo.
fn to_model_input(input: ImageTensor, layout: TensorLayout) -> Result<(Vec<i64>, Vec<f32>)> {
    let [n, h, w, c] = input.shape();
    let nhwc = Array4::from_shape_vec((n, h, w, c), input.data)?;

    let (shape, array) = match layout {
        TensorLayout::Nhwc => ([n, h, w, c], nhwc),
        TensorLayout::Nchw => (
            [n, c, h, w],
            nhwc.permuted_axes([0, 3, 1, 2]).as_standard_layout().into_owned(),
        ),
    };

    let (data, _) = array.into_raw_vec_and_offset();
    Ok((shape.iter().map(|&d| d as i64).collect(), data))
}
