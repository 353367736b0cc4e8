use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{Base64ImageRequest, HealthResponse, PredictionResponse, StatusMessage};
use crate::domain::{errors::DomainError, sensor::LatestSensor};

const NO_IMAGE_MESSAGE: &str =
    "No image sent (use 'file' or 'image' form field, or 'image_base64' JSON)";

pub async fn home(State(st): State<HttpState>) -> Response {
    match tokio::fs::read_to_string(st.static_dir.join("index.html")).await {
        Ok(page) => Html(page).into_response(),
        Err(_) => Json(StatusMessage::ok("Backend running")).into_response(),
    }
}

pub async fn favicon(State(st): State<HttpState>) -> Response {
    match tokio::fs::read(st.static_dir.join("favicon.ico")).await {
        Ok(icon) => ([(header::CONTENT_TYPE, "image/x-icon")], icon).into_response(),
        Err(_) => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn health(State(st): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        model_loaded: true,
        labels: st.prediction.label_count(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError(DomainError::NotFound("Not found".into()))
}

/// Los 405 que genera el enrutador salen sin cuerpo; se envuelven en el
/// sobre de error conservando la cabecera `Allow`.
pub async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow = response.headers().get(header::ALLOW).cloned();
    let mut envelope = ApiError(DomainError::MethodNotAllowed).into_response();
    if let Some(allow) = allow {
        envelope.headers_mut().insert(header::ALLOW, allow);
    }
    envelope
}

/// POST /sensor-data y /api/sensor/update. El cuerpo se interpreta como JSON
/// aunque falte la cabecera Content-Type (los microcontroladores no la envían).
pub async fn receive_sensor_data(
    State(st): State<HttpState>,
    request: Request,
) -> Result<Json<StatusMessage>, ApiError> {
    let body = read_body(&st, request).await?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| DomainError::InvalidSensorData("Invalid JSON".into()))?;

    st.sensors.update(&payload).await?;
    Ok(Json(StatusMessage::success("Data received")))
}

/// GET /sensor-data y /api/sensor/latest.
pub async fn latest_sensor_data(State(st): State<HttpState>) -> Json<LatestSensor> {
    Json(st.sensors.latest().await)
}

/// POST /predict-disease: formulario multipart (`file` o `image`) o JSON con `image_base64`.
pub async fn predict_disease(
    State(st): State<HttpState>,
    request: Request,
) -> Result<Json<PredictionResponse>, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let diagnosis = if content_type.starts_with("multipart/form-data") {
        let (file_name, bytes) = read_image_field(&st, request).await?;
        st.prediction.predict_upload(file_name.as_deref(), &bytes).await?
    } else if is_json(&content_type) {
        let body = read_body(&st, request).await?;
        // JSON mal formado equivale a no enviar imagen.
        let req: Base64ImageRequest = serde_json::from_slice(&body).unwrap_or_default();
        match req.image_base64.filter(|b64| !b64.is_empty()) {
            Some(b64) => st.prediction.predict_base64(&b64).await?,
            None => return Err(DomainError::InvalidInput(NO_IMAGE_MESSAGE.into()).into()),
        }
    } else {
        return Err(DomainError::InvalidInput(NO_IMAGE_MESSAGE.into()).into());
    };

    Ok(Json(diagnosis.into()))
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime == "application/json" || mime.ends_with("+json")
}

async fn read_body(st: &HttpState, request: Request) -> Result<Bytes, ApiError> {
    Bytes::from_request(request, &()).await.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(st)
        } else {
            ApiError(DomainError::InvalidInput(rejection.body_text()))
        }
    })
}

/// Primer campo `file`; si no hay, el primer campo `image`. Un campo con
/// `filename=""` (formulario enviado sin elegir archivo) cuenta como ausente.
async fn read_image_field(
    st: &HttpState,
    request: Request,
) -> Result<(Option<String>, Bytes), ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| ApiError(DomainError::InvalidInput(rejection.body_text())))?;

    let mut file = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(st, e))?
    {
        let slot = match field.name() {
            Some("file") => &mut file,
            Some("image") => &mut image,
            _ => continue,
        };
        let file_name = field.file_name().map(str::to_string);
        if file_name.as_deref() == Some("") {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| multipart_error(st, e))?;
        if slot.is_none() {
            *slot = Some((file_name, bytes));
        }
    }

    file.or(image)
        .ok_or_else(|| ApiError(DomainError::InvalidInput(NO_IMAGE_MESSAGE.into())))
}

fn multipart_error(st: &HttpState, e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(st)
    } else {
        ApiError(DomainError::InvalidInput(e.body_text()))
    }
}

fn too_large(st: &HttpState) -> ApiError {
    ApiError(DomainError::PayloadTooLarge {
        limit: st.max_body_label(),
    })
}
