//! Structured store trait

use crate::{ProductRecord, Result, VoucherRecord};
use async_trait::async_trait;

/// Read-only view over product locations and vouchers
///
/// Matching is case-insensitive substring containment. Results come back in
/// insertion order with no ranking. Implementations fail with
/// `Error::StoreUnavailable` when their data has not been loaded.
#[async_trait]
pub trait ProductStore: Send + Sync + 'static {
    /// Products whose name contains `query`
    async fn find_locations(&self, query: &str) -> Result<Vec<ProductRecord>>;

    /// Vouchers whose name or category contains `query`; empty returns all
    async fn find_vouchers(&self, query: &str) -> Result<Vec<VoucherRecord>>;

    async fn all_vouchers(&self) -> Result<Vec<VoucherRecord>> {
        self.find_vouchers("").await
    }
}
