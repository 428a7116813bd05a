//! Grounding context from catalog matches

use std::sync::Arc;
use store_assistant_core::{ProductRecord, ProductStore, ResolvedContext, Result};

/// One grounding sentence per matched product
pub fn describe_record(record: &ProductRecord) -> String {
    format!(
        "Sản phẩm {} thuộc danh mục {}, nằm ở tọa độ ({}, {}) tại {}.",
        record.name, record.category, record.x, record.y, record.zone
    )
}

/// Terse location answer for a single product
pub fn summarize_record(record: &ProductRecord) -> String {
    format!(
        "{} nằm ở {}, tọa độ ({}, {}).",
        record.name, record.zone, record.x, record.y
    )
}

/// Builds a `ResolvedContext` from store lookups
///
/// Every match goes into the grounding text, unranked and untruncated. The
/// fallback sentence is built from the first match in store order only.
#[derive(Clone)]
pub struct ContextAssembler {
    store: Arc<dyn ProductStore>,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Look up `keyword` and assemble the grounding context
    ///
    /// An empty keyword resolves to an empty context without touching the
    /// store, since an empty substring would match every row.
    pub async fn assemble(&self, keyword: &str) -> Result<ResolvedContext> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            tracing::debug!("Empty keyword, skipping catalog lookup");
            return Ok(ResolvedContext::empty(keyword));
        }

        let records = self.store.find_locations(keyword).await?;
        tracing::debug!(keyword, matches = records.len(), "Catalog lookup");

        if records.is_empty() {
            return Ok(ResolvedContext::empty(keyword));
        }

        Ok(ResolvedContext::from_matches(
            keyword,
            records,
            describe_record,
            summarize_record,
        ))
    }
}
