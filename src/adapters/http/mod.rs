pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState) -> Router {
    // Rutas desconocidas: archivo de la interfaz web si existe, si no 404 JSON.
    let static_files =
        ServeDir::new(&state.static_dir).not_found_service(routes::not_found.into_service());
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/", get(routes::home))
        .route("/favicon.ico", get(routes::favicon))
        .route("/health", get(routes::health))
        .route("/sensor-data", post(routes::receive_sensor_data))
        .route("/sensor-data", get(routes::latest_sensor_data))
        .route("/api/sensor/update", post(routes::receive_sensor_data))
        .route("/api/sensor/latest", get(routes::latest_sensor_data))
        .route("/predict-disease", post(routes::predict_disease))
        .fallback_service(static_files)
        .with_state(state)
        .layer(middleware::map_response(routes::method_not_allowed))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        // Las apps móvil y web se sirven desde otro origen.
        .layer(CorsLayer::permissive())
}
