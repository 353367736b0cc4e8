use image::{imageops::FilterType, DynamicImage};

use super::errors::{DomainError, DomainResult};

/// Lado de la imagen de entrada del modelo (128x128x3).
pub const MODEL_INPUT_SIZE: u32 = 128;

/// Tensor de entrada en orden HWC, canales RGB escalados a [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub size: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Decodifica, redimensiona y normaliza una imagen para el clasificador.
    pub fn from_encoded(bytes: &[u8], size: u32) -> DomainResult<Self> {
        let img = decode(bytes)?;
        Ok(Self::from_image(&img, size))
    }

    /// Vecino más cercano: es la interpolación con la que se entrenó el modelo.
    pub fn from_image(img: &DynamicImage, size: u32) -> Self {
        let rgb = img.to_rgb8();
        let resized = image::imageops::resize(&rgb, size, size, FilterType::Nearest);

        let data = resized
            .pixels()
            .flat_map(|p| p.0)
            .map(|c| c as f32 / 255.0)
            .collect();

        Self { size, data }
    }

    /// Forma NHWC con lote 1.
    pub fn shape(&self) -> [usize; 4] {
        [1, self.size as usize, self.size as usize, 3]
    }
}

pub fn decode(bytes: &[u8]) -> DomainResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| DomainError::ImageDecode(e.to_string()))
}
