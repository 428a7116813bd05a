//! In-memory catalog for tests and local runs without a database

use async_trait::async_trait;
use parking_lot::RwLock;
use store_assistant_core::{Error, ProductRecord, ProductStore, Result, VoucherRecord};

use crate::seed::CatalogSeed;

/// Catalog held in process memory
///
/// Starts unloaded; lookups fail with `StoreUnavailable` until `load` runs.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    data: RwLock<Option<CatalogSeed>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with `seed`
    pub fn with_seed(seed: CatalogSeed) -> Self {
        Self {
            data: RwLock::new(Some(seed)),
        }
    }

    /// Replace the full catalog
    pub fn load(&self, seed: CatalogSeed) {
        *self.data.write() = Some(seed);
    }

    /// Drop all data, returning to the unloaded state
    pub fn unload(&self) {
        *self.data.write() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.data.read().is_some()
    }
}

fn not_loaded() -> Error {
    Error::StoreUnavailable("catalog not loaded".to_string())
}

#[async_trait]
impl ProductStore for InMemoryCatalog {
    async fn find_locations(&self, query: &str) -> Result<Vec<ProductRecord>> {
        let needle = query.trim().to_lowercase();
        let data = self.data.read();
        let seed = data.as_ref().ok_or_else(not_loaded)?;
        Ok(seed
            .locations
            .iter()
            .filter(|r| r.matches(&needle))
            .cloned()
            .collect())
    }

    async fn find_vouchers(&self, query: &str) -> Result<Vec<VoucherRecord>> {
        let needle = query.trim().to_lowercase();
        let data = self.data.read();
        let seed = data.as_ref().ok_or_else(not_loaded)?;
        Ok(seed
            .vouchers
            .iter()
            .filter(|v| v.matches(&needle))
            .cloned()
            .collect())
    }
}
