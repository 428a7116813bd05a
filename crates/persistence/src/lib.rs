//! Storage for the store assistant
//!
//! Provides:
//! - Product/voucher catalog (SQLite, or in-memory for tests)
//! - Catalog seed loading for administrative bulk reload
//! - Generated audio artifact lifecycle

pub mod artifacts;
pub mod catalog;
pub mod error;
pub mod memory;
pub mod schema;
pub mod seed;

pub use artifacts::AudioArtifactStore;
pub use catalog::SqliteCatalog;
pub use error::PersistenceError;
pub use memory::InMemoryCatalog;
pub use seed::CatalogSeed;
