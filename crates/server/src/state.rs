//! Application State
//!
//! Shared state across all handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;

use store_assistant_agent::QueryPipeline;
use store_assistant_config::Settings;
use store_assistant_core::ProductStore;
use store_assistant_persistence::{CatalogSeed, InMemoryCatalog, SqliteCatalog};
use store_assistant_text_processing::Recommender;

use crate::retention::spawn_sweeper;
use crate::ServerError;

/// Catalog backing the structured store
///
/// Kept concrete so the admin reload can reach the bulk-load operations
/// that `ProductStore` does not expose.
#[derive(Clone)]
pub enum CatalogHandle {
    Sqlite(SqliteCatalog),
    Memory(Arc<InMemoryCatalog>),
}

impl CatalogHandle {
    pub fn store(&self) -> Arc<dyn ProductStore> {
        match self {
            CatalogHandle::Sqlite(catalog) => Arc::new(catalog.clone()),
            CatalogHandle::Memory(catalog) => catalog.clone(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        match self {
            CatalogHandle::Sqlite(catalog) => catalog.is_loaded().unwrap_or(false),
            CatalogHandle::Memory(catalog) => catalog.is_loaded(),
        }
    }

    /// Replace both tables with the contents of a seed file
    ///
    /// Returns `(locations, vouchers)` row counts.
    pub async fn load_seed_file(&self, path: impl Into<PathBuf>) -> Result<(usize, usize), ServerError> {
        let path = path.into();
        let catalog = self.clone();

        tokio::task::spawn_blocking(move || -> Result<(usize, usize), ServerError> {
            let seed = CatalogSeed::load(&path)?;
            match catalog {
                CatalogHandle::Sqlite(catalog) => Ok(catalog.load_seed(&seed)?),
                CatalogHandle::Memory(catalog) => {
                    let counts = (seed.locations.len(), seed.vouchers.len());
                    catalog.load(seed);
                    Ok(counts)
                }
            }
        })
        .await
        .map_err(|e| ServerError::Internal(format!("catalog load task failed: {}", e)))?
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration wrapped in RwLock for hot-reload support
    pub config: Arc<RwLock<Settings>>,
    /// Query orchestrator
    pub pipeline: Arc<QueryPipeline>,
    /// Catalog behind the pipeline's store
    pub catalog: CatalogHandle,
    /// Related-product suggestions
    pub recommender: Arc<Recommender>,
}

impl AppState {
    pub fn new(config: Settings, pipeline: Arc<QueryPipeline>, catalog: CatalogHandle) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            pipeline,
            catalog,
            recommender: Arc::new(Recommender::default()),
        }
    }

    /// Bulk reload of the catalog from `catalog.seed_path`
    pub async fn reload_catalog(&self) -> Result<(usize, usize), ServerError> {
        let seed_path = self.config.read().catalog.seed_path.clone();
        let Some(seed_path) = seed_path else {
            return Err(ServerError::InvalidRequest(
                "catalog.seed_path is not configured".to_string(),
            ));
        };

        let (locations, vouchers) = self.catalog.load_seed_file(&seed_path).await?;
        tracing::info!(path = %seed_path, locations, vouchers, "Catalog reloaded");
        Ok((locations, vouchers))
    }

    /// Start the artifact retention sweeper when a retention window is set
    pub fn spawn_retention_sweeper(&self) -> Option<JoinHandle<()>> {
        let (retention, every) = {
            let config = self.config.read();
            (config.artifacts.retention_secs?, config.artifacts.sweep_interval_secs)
        };

        Some(spawn_sweeper(
            self.pipeline.clone(),
            Duration::from_secs(retention),
            Duration::from_secs(every),
        ))
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
