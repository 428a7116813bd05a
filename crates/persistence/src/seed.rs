//! Catalog seed files
//!
//! A seed holds the full contents of both tables. Loading one replaces the
//! current catalog wholesale.

use serde::{Deserialize, Serialize};
use std::path::Path;
use store_assistant_core::{ProductRecord, VoucherRecord};

use crate::error::PersistenceError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub locations: Vec<ProductRecord>,
    #[serde(default)]
    pub vouchers: Vec<VoucherRecord>,
}

impl CatalogSeed {
    /// Read a `.json`, `.yaml` or `.yml` seed file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PersistenceError::Seed(format!("{}: {}", path.display(), e)))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Self::from_json(&raw),
            Some("yaml") | Some("yml") => Self::from_yaml(&raw),
            other => Err(PersistenceError::Seed(format!(
                "unsupported seed format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(raw).map_err(|e| PersistenceError::Seed(e.to_string()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self, PersistenceError> {
        serde_yaml::from_str(raw).map_err(|e| PersistenceError::Seed(e.to_string()))
    }
}
