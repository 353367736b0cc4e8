//! Tests de integración de la API HTTP con un clasificador falso.

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // para `oneshot`

use smartag_server::{
    adapters::{
        fs::{sensor_store::JsonSensorStore, uploads::FsUploadStore},
        http::{router, state::HttpState},
    },
    application::{
        ports::ClassifierPort,
        services::{PredictionService, SensorService},
    },
    domain::{errors::DomainResult, labels::ClassLabels, tensor::ImageTensor},
};

const LABELS: &str = "Tomato___Early_blight\nTomato___Leaf_Mold\nTomato___healthy\n";

/// Devuelve siempre las mismas puntuaciones y cuenta las llamadas.
/// Con `stalled` la inferencia no termina nunca.
struct FakeClassifier {
    scores: Vec<f32>,
    stalled: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl ClassifierPort for FakeClassifier {
    fn input_size(&self) -> u32 {
        128
    }

    async fn classify(&self, input: ImageTensor) -> DomainResult<Vec<f32>> {
        assert_eq!(input.data.len(), 128 * 128 * 3);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stalled {
            std::future::pending::<()>().await;
        }
        Ok(self.scores.clone())
    }
}

struct TestApp {
    router: Router,
    classifier: Arc<FakeClassifier>,
    dir: TempDir,
}

impl TestApp {
    async fn new(scores: Vec<f32>) -> Self {
        Self::with_limit(scores, 10 * 1024 * 1024).await
    }

    async fn with_limit(scores: Vec<f32>, max_body_bytes: usize) -> Self {
        Self::build(scores, false, max_body_bytes).await
    }

    async fn stalled() -> Self {
        Self::build(vec![1.0], true, 10 * 1024 * 1024).await
    }

    async fn build(scores: Vec<f32>, stalled: bool, max_body_bytes: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Arc::new(FakeClassifier {
            scores,
            stalled,
            calls: AtomicUsize::new(0),
        });
        let labels = ClassLabels::parse(LABELS, Path::new("class_labels.txt")).unwrap();

        let sensor_store = JsonSensorStore::new(dir.path().join("sensor_data.json"));
        sensor_store.init().await.unwrap();
        let uploads = FsUploadStore::new(dir.path().join("uploads")).unwrap();

        let state = HttpState {
            prediction: Arc::new(PredictionService::new(
                classifier.clone(),
                Arc::new(labels),
                Arc::new(uploads),
            )),
            sensors: Arc::new(SensorService::new(Arc::new(sensor_store))),
            static_dir: dir.path().join("static"),
            max_body_bytes,
        };

        Self {
            router: router(state),
            classifier,
            dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };
        (status, body)
    }

    fn uploads_left(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("uploads")).unwrap().count()
    }

    fn inference_calls(&self) -> usize {
        self.classifier.calls.load(Ordering::SeqCst)
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "smartag-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict-disease")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

fn leaf_png() -> Vec<u8> {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 90]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =============================================================================
// Salud y rutas auxiliares
// =============================================================================

#[tokio::test]
async fn health_reports_label_count() {
    let app = TestApp::new(vec![1.0, 0.0, 0.0]).await;

    let (status, body) = app.send(get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "model_loaded": true, "labels": 3}));
}

#[tokio::test]
async fn root_without_ui_reports_backend_running() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, body) = app.send(get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "Backend running"}));
}

#[tokio::test]
async fn missing_favicon_is_no_content() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, _) = app.send(get("/favicon.ico")).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, body) = app.send(get("/does/not/exist")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "error", "message": "Not found"}));
}

#[tokio::test]
async fn wrong_method_is_json_405_with_allow_header() {
    let app = TestApp::new(vec![1.0]).await;

    let response = app.router.clone().oneshot(get("/predict-disease")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers().get("allow").unwrap().to_str().unwrap().to_string();
    assert!(allow.contains("POST"));

    let (status, body) = app.send(get("/predict-disease")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"status": "error", "message": "Method not allowed"}));
}

// =============================================================================
// Sensor
// =============================================================================

#[tokio::test]
async fn sensor_write_then_read_returns_same_values() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, body) = app
        .send(post_json(
            "/sensor-data",
            &json!({"temperature": 24.5, "humidity": 60, "soil_moisture": 33.1}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "Data received"}));

    let (status, body) = app.send(get("/sensor-data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"temperature": 24.5, "humidity": 60.0, "soil_moisture": 33.1}));
}

#[tokio::test]
async fn sensor_aliases_share_the_same_document() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, _) = app
        .send(post_json(
            "/api/sensor/update",
            &json!({"temperature": "18.5", "humidity": 71.2, "soil_moisture": 40}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send(get("/api/sensor/latest")).await;
    assert_eq!(body, json!({"temperature": 18.5, "humidity": 71.2, "soil_moisture": 40.0}));
}

#[tokio::test]
async fn fresh_store_reads_as_nulls() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, body) = app.send(get("/sensor-data")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"temperature": null, "humidity": null, "soil_moisture": null}));
}

#[tokio::test]
async fn sensor_write_missing_key_is_rejected_and_keeps_previous_reading() {
    let app = TestApp::new(vec![1.0]).await;
    app.send(post_json(
        "/sensor-data",
        &json!({"temperature": 20.0, "humidity": 50.0, "soil_moisture": 30.0}),
    ))
    .await;

    let (status, body) = app
        .send(post_json("/sensor-data", &json!({"temperature": 99.0, "humidity": 1.0})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Missing keys in data"}));

    let (_, latest) = app.send(get("/sensor-data")).await;
    assert_eq!(latest, json!({"temperature": 20.0, "humidity": 50.0, "soil_moisture": 30.0}));
}

#[tokio::test]
async fn sensor_write_accepts_body_without_content_type() {
    let app = TestApp::new(vec![1.0]).await;
    let request = Request::builder()
        .method("POST")
        .uri("/sensor-data")
        .body(Body::from(r#"{"temperature": 1, "humidity": 2, "soil_moisture": 3}"#))
        .unwrap();

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_sensor_json_is_bad_request() {
    let app = TestApp::new(vec![1.0]).await;
    let request = Request::builder()
        .method("POST")
        .uri("/sensor-data")
        .header("content-type", "application/json")
        .body(Body::from("{temperature: 1"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn non_numeric_sensor_value_is_bad_request() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, body) = app
        .send(post_json(
            "/sensor-data",
            &json!({"temperature": "hot", "humidity": 50, "soil_moisture": 30}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn oversized_body_is_413() {
    let app = TestApp::with_limit(vec![1.0], 1024 * 1024).await;
    let big = vec![b' '; 2 * 1024 * 1024];
    let request = Request::builder()
        .method("POST")
        .uri("/sensor-data")
        .header("content-type", "application/json")
        .body(Body::from(big))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"status": "error", "message": "File too large (max 1 MB)"}));
}

// =============================================================================
// Predicción
// =============================================================================

#[tokio::test]
async fn oversized_multipart_upload_is_413() {
    let app = TestApp::with_limit(vec![1.0, 0.0, 0.0], 1024 * 1024).await;
    let big = vec![0u8; 2 * 1024 * 1024];

    let (status, body) = app.send(post_multipart("file", "leaf.jpg", &big)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"status": "error", "message": "File too large (max 1 MB)"}));
    assert_eq!(app.uploads_left(), 0);
    assert_eq!(app.inference_calls(), 0);
}

#[tokio::test]
async fn limit_below_one_megabyte_is_reported_in_kilobytes() {
    let app = TestApp::with_limit(vec![1.0], 512 * 1024).await;
    let big = vec![0u8; 1024 * 1024];

    let (status, body) = app.send(post_multipart("file", "leaf.png", &big)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["message"], "File too large (max 512 KB)");
}

#[tokio::test]
async fn cancelled_request_leaves_no_scratch_file() {
    let app = TestApp::stalled().await;
    let request = post_multipart("file", "leaf.png", &leaf_png());

    let outcome = tokio::time::timeout(Duration::from_millis(500), app.router.clone().oneshot(request)).await;

    assert!(outcome.is_err(), "la inferencia no debería terminar");
    assert_eq!(app.inference_calls(), 1);
    assert_eq!(app.uploads_left(), 0);
}

#[tokio::test]
async fn form_submitted_without_choosing_a_file_is_bad_request() {
    let app = TestApp::new(vec![1.0, 0.0, 0.0]).await;

    let (status, body) = app.send(post_multipart("file", "", b"")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "message": "No image sent (use 'file' or 'image' form field, or 'image_base64' JSON)"
        })
    );
    assert_eq!(app.inference_calls(), 0);
    assert_eq!(app.uploads_left(), 0);
}

#[tokio::test]
async fn multipart_file_is_classified_and_scratch_is_cleaned() {
    let app = TestApp::new(vec![0.05, 0.15, 0.80]).await;

    let (status, body) = app.send(post_multipart("file", "leaf.jpg", &leaf_png())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "predicted_disease": "Tomato___healthy",
            "confidence": 80.0,
            "treatment": "No treatment needed."
        })
    );
    assert_eq!(app.inference_calls(), 1);
    assert_eq!(app.uploads_left(), 0);
}

#[tokio::test]
async fn image_field_is_accepted_too() {
    let app = TestApp::new(vec![0.9, 0.05, 0.05]).await;

    let (status, body) = app.send(post_multipart("image", "leaf.PNG", &leaf_png())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_disease"], "Tomato___Early_blight");
    assert_eq!(body["treatment"], "Use Mancozeb or Chlorothalonil fungicide.");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&confidence));
}

#[tokio::test]
async fn gif_upload_is_rejected_before_inference() {
    let app = TestApp::new(vec![1.0, 0.0, 0.0]).await;

    let (status, body) = app.send(post_multipart("file", "leaf.gif", &leaf_png())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Only .jpg/.jpeg/.png allowed"}));
    assert_eq!(app.inference_calls(), 0);
    assert_eq!(app.uploads_left(), 0);
}

#[tokio::test]
async fn undecodable_upload_is_500_and_scratch_is_cleaned() {
    let app = TestApp::new(vec![1.0, 0.0, 0.0]).await;

    let (status, body) = app
        .send(post_multipart("file", "leaf.jpg", b"this is not a jpeg"))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(app.inference_calls(), 0);
    assert_eq!(app.uploads_left(), 0);
}

#[tokio::test]
async fn base64_json_with_data_uri_is_classified() {
    let app = TestApp::new(vec![0.1, 0.7, 0.2]).await;
    let payload = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(leaf_png()));

    let (status, body) = app
        .send(post_json("/predict-disease", &json!({"image_base64": payload})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_disease"], "Tomato___Leaf_Mold");
    assert_eq!(body["confidence"], 70.0);
    assert_eq!(body["treatment"], "Consult a local expert for targeted management.");
    assert_eq!(app.uploads_left(), 0);
}

#[tokio::test]
async fn model_with_more_outputs_than_labels_gets_synthetic_label() {
    let app = TestApp::new(vec![0.0, 0.1, 0.1, 0.0, 0.8]).await;

    let (status, body) = app.send(post_multipart("file", "leaf.png", &leaf_png())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_disease"], "Class_4");
}

#[tokio::test]
async fn request_without_image_is_bad_request() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, body) = app.send(post_json("/predict-disease", &json!({"other": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, _) = app.send(post_multipart("document", "leaf.png", &leaf_png())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let plain = Request::builder()
        .method("POST")
        .uri("/predict-disease")
        .body(Body::from("hello"))
        .unwrap();
    let (status, _) = app.send(plain).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.inference_calls(), 0);
}

#[tokio::test]
async fn invalid_base64_is_bad_request() {
    let app = TestApp::new(vec![1.0]).await;

    let (status, body) = app
        .send(post_json("/predict-disease", &json!({"image_base64": "***"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(app.uploads_left(), 0);
}
