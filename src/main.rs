//! Credit Scoring API Server
//!
//! Serves a pre-trained credit-default classifier over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CREDIT SCORING API                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────────────────────────────┐    │
//! │  │  Router   │─▶│  Pipeline                            │    │
//! │  │  (Axum)   │  │  align → impute → scale → score →    │    │
//! │  └─────┬─────┘  │  decide → assemble                   │    │
//! │        │        └──────────────────┬───────────────────┘    │
//! │        ▼                           ▼                        │
//! │  ┌─────────────┐           ┌───────────────┐                │
//! │  │ Reference   │           │ Model Bundle  │ (read once,    │
//! │  │ Dataset     │           │ (JSON)        │  shared)       │
//! │  └─────────────┘           └───────────────┘                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod model;
mod pipeline;
mod reference;
mod verify;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, LogFormat};
use model::ModelBundle;
use reference::ReferenceDataset;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("verify") {
        let path = args.next().unwrap_or_else(|| config.model_path.clone());
        std::process::exit(verify::run(&path));
    }

    init_tracing(config.log_format);

    tracing::info!("Credit Scoring API v{} starting...", env!("CARGO_PKG_VERSION"));

    for fallback in &config.fallbacks {
        tracing::warn!("Configuration fallback: {}", fallback);
    }

    if !config.is_production() {
        tracing::debug!(?config, "Configuration loaded");
    }

    let model = load_model(&config);
    let reference = load_reference(&config);

    let state = AppState::new(config.clone(), model, reference);
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "credit_scoring_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// A load failure leaves the process running but permanently degraded
fn load_model(config: &Config) -> Option<ModelBundle> {
    match ModelBundle::load(&config.model_path) {
        Ok(bundle) => {
            tracing::info!(
                model = %bundle.name(),
                threshold = bundle.threshold(),
                features = bundle.feature_count(),
                sha256 = %bundle.metadata().sha256,
                "Model loaded"
            );
            Some(bundle)
        }
        Err(e) => {
            tracing::error!(path = %config.model_path, error = %e, "Model failed to load, prediction endpoints disabled");
            None
        }
    }
}

fn load_reference(config: &Config) -> Option<ReferenceDataset> {
    let path = config.reference_data_path.as_ref()?;
    match ReferenceDataset::load(path, &config.reference_id_field) {
        Ok(dataset) => Some(dataset),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Reference data unavailable, lookup endpoints disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Option<Arc<ModelBundle>>,
    pub reference: Option<Arc<ReferenceDataset>>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, model: Option<ModelBundle>, reference: Option<ReferenceDataset>) -> Self {
        Self {
            model: model.map(Arc::new),
            reference: reference.map(Arc::new),
            config,
        }
    }

    /// Every prediction path goes through this check
    pub fn bundle(&self) -> AppResult<&ModelBundle> {
        self.model.as_deref().ok_or(AppError::ModelUnavailable)
    }

    pub fn reference(&self) -> AppResult<&ReferenceDataset> {
        self.reference.as_deref().ok_or(AppError::ReferenceDataUnavailable)
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::service::index))
        .route("/health", get(handlers::health::check))

        // Model
        .route("/model-info", get(handlers::model::info))
        .route("/model_info", get(handlers::model::info))
        .route("/features", get(handlers::model::features))

        // Submit-record predictions
        .route("/predict", post(handlers::predict::predict))
        .route("/predict/simple", post(handlers::predict::predict_simple))
        .route("/test_prediction", get(handlers::predict::smoke_test))

        // Lookup-by-ID
        .route("/clients", get(handlers::clients::list))
        .route("/client/:id/info", get(handlers::clients::info))
        .route("/predict/:id", get(handlers::clients::predict))

        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
