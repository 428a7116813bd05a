//! Store Assistant Server Entry Point

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use store_assistant_agent::{Capabilities, QueryPipeline, QueryPipelineConfig};
use store_assistant_config::{load_settings, Settings};
use store_assistant_llm::LlmFactory;
use store_assistant_persistence::{AudioArtifactStore, SqliteCatalog};
use store_assistant_pipeline::{HttpSttBackend, HttpSttConfig, HttpTtsBackend, HttpTtsConfig};
use store_assistant_server::{create_router, init_metrics, AppState, CatalogHandle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("STORE_ASSISTANT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Store Assistant Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match init_metrics() {
            Ok(_) => tracing::info!("Initialized Prometheus metrics at /metrics"),
            Err(e) => tracing::warn!(error = %e, "Metrics disabled"),
        }
    }

    // Catalog
    let catalog = CatalogHandle::Sqlite(SqliteCatalog::open(&config.catalog.database_path)?);
    if let Some(seed_path) = &config.catalog.seed_path {
        match catalog.load_seed_file(seed_path).await {
            Ok((locations, vouchers)) => {
                tracing::info!(path = %seed_path, locations, vouchers, "Catalog seeded")
            }
            Err(e) => tracing::warn!(path = %seed_path, error = %e, "Catalog seed failed"),
        }
    }
    if !catalog.is_loaded() {
        tracing::warn!("Catalog is empty; lookups fail until POST /admin/reload-catalog");
    }

    // Capabilities, built once and shared by every request
    let model = LlmFactory::create(&config.llm)?;
    let stt = HttpSttBackend::new(HttpSttConfig::from(&config.stt))?;
    let tts = HttpTtsBackend::new(HttpTtsConfig::from(&config.tts))?;
    tracing::info!(
        llm = %config.llm.model,
        stt = %config.stt.url,
        tts = %config.tts.url,
        "Backends configured"
    );

    let capabilities = Capabilities {
        store: catalog.store(),
        model,
        stt: Arc::new(stt),
        tts: Arc::new(tts),
    };
    let artifacts = Arc::new(AudioArtifactStore::open(&config.artifacts.directory)?);
    let pipeline = Arc::new(QueryPipeline::new(
        capabilities,
        artifacts,
        QueryPipelineConfig::from_settings(&config.pipeline, &config.llm),
    ));

    let state = AppState::new(config.clone(), pipeline, catalog);
    let _sweeper = state.spawn_retention_sweeper();

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    // Graceful shutdown on SIGTERM/SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("store_assistant={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
