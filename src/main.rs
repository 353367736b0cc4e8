use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use smartag_server::{
    adapters::{
        fs::{labels, sensor_store::JsonSensorStore, uploads::FsUploadStore},
        http::{router, state::HttpState},
        onnx::{classifier::OnnxClassifier, model_catalog::OnnxModelCatalog},
    },
    application::services::{PredictionService, SensorService},
    config::{Cli, Commands, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Some(Commands::ExportLabels { dataset, output }) = cli.command {
        labels::export_labels(&dataset, &output)?;
        return Ok(());
    }

    let config = ServerConfig::try_from(cli.server)?;
    serve(config).await
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");
    tracing::info!("  Modelos candidatos: {:?}", config.model_candidates);
    tracing::info!("  Etiquetas:          {:?}", config.labels_path);
    tracing::info!("  Sensor:             {:?}", config.sensor_file);
    tracing::info!("  Subidas:            {:?}", config.upload_dir);

    // 2. Modelo y etiquetas: cualquier fallo aquí impide arrancar.
    let model_path = OnnxModelCatalog::new(config.model_candidates.clone(), config.min_model_bytes).select()?;
    tracing::info!("🧠 Cargando modelo: {}", model_path.display());
    let classifier = OnnxClassifier::load(&model_path, config.input_layout, config.input_size)
        .with_context(|| format!("No se pudo cargar el modelo {}", model_path.display()))?;

    let class_labels = labels::load_labels(&config.labels_path)?;
    tracing::info!("🏷️  {} etiquetas cargadas", class_labels.len());

    // 3. Adaptadores de ficheros
    let sensor_store = JsonSensorStore::new(&config.sensor_file);
    sensor_store.init().await?;
    let uploads = FsUploadStore::new(&config.upload_dir)?;

    // 4. Servicios (casos de uso) con sus dependencias inyectadas
    let prediction = PredictionService::new(Arc::new(classifier), Arc::new(class_labels), Arc::new(uploads));
    let sensors = SensorService::new(Arc::new(sensor_store));

    let state = HttpState {
        prediction: Arc::new(prediction),
        sensors: Arc::new(sensors),
        static_dir: config.static_dir.clone(),
        max_body_bytes: config.max_body_bytes,
    };

    // 5. Lanzar el servidor
    let app = router(state);
    let addr = config.bind_addr();
    tracing::info!("🚀 Servidor SmartAg iniciado en http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
