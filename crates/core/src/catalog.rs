//! Catalog records served by the structured store

use serde::{Deserialize, Serialize};

/// Where a product sits on the shop floor
///
/// Identity is `name`, but names are not unique: a lookup can legitimately
/// return several rows for the same product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub category: String,
    pub x: i64,
    pub y: i64,
    pub zone: String,
}

impl ProductRecord {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        x: i64,
        y: i64,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            x,
            y,
            zone: zone.into(),
        }
    }

    /// Case-insensitive substring match against the product name
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
    }
}

/// Discount voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherRecord {
    pub id: i64,
    pub name: String,
    pub discount: f64,
    pub min_price: f64,
    pub expired_date: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl VoucherRecord {
    /// Case-insensitive substring match against name or category.
    /// An empty needle matches every voucher.
    pub fn matches(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(needle_lower)
            || self
                .category
                .as_deref()
                .map(|c| c.to_lowercase().contains(needle_lower))
                .unwrap_or(false)
    }
}
