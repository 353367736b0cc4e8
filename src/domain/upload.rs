use std::path::Path;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Nombre usado cuando el formulario no trae nombre de archivo.
pub const DEFAULT_UPLOAD_NAME: &str = "upload.png";

/// Extensión en minúsculas si está permitida (`.jpg`, `.jpeg`, `.png`).
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Quita un prefijo tipo `data:image/png;base64,` (todo hasta la primera coma).
pub fn strip_data_uri(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    }
    .trim()
}
