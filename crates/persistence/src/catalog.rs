//! SQLite-backed product catalog
//!
//! One long-lived connection behind a mutex. Reads run on the blocking pool
//! so a slow query never stalls the async runtime. All caller input goes
//! through bound parameters.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use std::sync::Arc;
use store_assistant_core::{ProductRecord, ProductStore, Result, VoucherRecord};

use crate::error::PersistenceError;
use crate::schema::{self, LOCATION_TABLE, VOUCHER_TABLE};
use crate::seed::CatalogSeed;

const SELECT_LOCATIONS: &str = r#"
    SELECT name, category, x, y, zone
    FROM location
    WHERE instr(unicode_lower(name), ?1) > 0
    ORDER BY rowid
"#;

const SELECT_VOUCHERS: &str = r#"
    SELECT id, name, discount, min_price, expired_date, category
    FROM voucher
    WHERE ?1 = ''
       OR instr(unicode_lower(name), ?1) > 0
       OR instr(unicode_lower(category), ?1) > 0
    ORDER BY rowid
"#;

/// SQLite catalog
#[derive(Clone)]
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    /// Open (or create) the database file
    ///
    /// Tables are only created by a bulk load; until then lookups fail with
    /// `StoreUnavailable`.
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PersistenceError::SchemaError(format!("{}: {}", parent.display(), e)))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        tracing::info!(path = %path.display(), "Opened catalog database");
        Self::from_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> std::result::Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> std::result::Result<Self, PersistenceError> {
        schema::register_functions(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Whether both tables have been loaded
    pub fn is_loaded(&self) -> std::result::Result<bool, PersistenceError> {
        let conn = self.conn.lock();
        Ok(schema::table_exists(&conn, LOCATION_TABLE)? && schema::table_exists(&conn, VOUCHER_TABLE)?)
    }

    /// Replace the location table
    pub fn replace_locations(&self, records: &[ProductRecord]) -> std::result::Result<usize, PersistenceError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let count = write_locations(&tx, records)?;
        tx.commit()?;
        tracing::info!(count, "Replaced location table");
        Ok(count)
    }

    /// Replace the voucher table
    pub fn replace_vouchers(&self, records: &[VoucherRecord]) -> std::result::Result<usize, PersistenceError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let count = write_vouchers(&tx, records)?;
        tx.commit()?;
        tracing::info!(count, "Replaced voucher table");
        Ok(count)
    }

    /// Replace both tables atomically from a seed
    pub fn load_seed(&self, seed: &CatalogSeed) -> std::result::Result<(usize, usize), PersistenceError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let locations = write_locations(&tx, &seed.locations)?;
        let vouchers = write_vouchers(&tx, &seed.vouchers)?;
        tx.commit()?;
        tracing::info!(locations, vouchers, "Catalog reloaded");
        Ok((locations, vouchers))
    }

    fn query_locations(&self, needle: &str) -> std::result::Result<Vec<ProductRecord>, PersistenceError> {
        let conn = self.conn.lock();
        schema::require_table(&conn, LOCATION_TABLE)?;

        let mut stmt = conn.prepare_cached(SELECT_LOCATIONS)?;
        let rows = stmt.query_map([needle], |row| {
            Ok(ProductRecord {
                name: row.get(0)?,
                category: row.get(1)?,
                x: row.get(2)?,
                y: row.get(3)?,
                zone: row.get(4)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(PersistenceError::from)
    }

    fn query_vouchers(&self, needle: &str) -> std::result::Result<Vec<VoucherRecord>, PersistenceError> {
        let conn = self.conn.lock();
        schema::require_table(&conn, VOUCHER_TABLE)?;

        let mut stmt = conn.prepare_cached(SELECT_VOUCHERS)?;
        let rows = stmt.query_map([needle], |row| {
            Ok(VoucherRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                discount: row.get(2)?,
                min_price: row.get(3)?,
                expired_date: row.get(4)?,
                category: row.get(5)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(PersistenceError::from)
    }
}

fn write_locations(tx: &Transaction<'_>, records: &[ProductRecord]) -> std::result::Result<usize, PersistenceError> {
    tx.execute_batch("DROP TABLE IF EXISTS location;")?;
    tx.execute_batch(schema::CREATE_LOCATION)?;

    let mut stmt = tx.prepare("INSERT INTO location (name, category, x, y, zone) VALUES (?1, ?2, ?3, ?4, ?5)")?;
    for r in records {
        stmt.execute(params![r.name, r.category, r.x, r.y, r.zone])?;
    }
    Ok(records.len())
}

fn write_vouchers(tx: &Transaction<'_>, records: &[VoucherRecord]) -> std::result::Result<usize, PersistenceError> {
    tx.execute_batch("DROP TABLE IF EXISTS voucher;")?;
    tx.execute_batch(schema::CREATE_VOUCHER)?;

    let mut stmt = tx.prepare(
        "INSERT INTO voucher (id, name, discount, min_price, expired_date, category) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for v in records {
        stmt.execute(params![v.id, v.name, v.discount, v.min_price, v.expired_date, v.category])?;
    }
    Ok(records.len())
}

#[async_trait]
impl ProductStore for SqliteCatalog {
    async fn find_locations(&self, query: &str) -> Result<Vec<ProductRecord>> {
        let catalog = self.clone();
        let needle = query.trim().to_lowercase();
        let records = tokio::task::spawn_blocking(move || catalog.query_locations(&needle))
            .await
            .map_err(PersistenceError::from)??;
        Ok(records)
    }

    async fn find_vouchers(&self, query: &str) -> Result<Vec<VoucherRecord>> {
        let catalog = self.clone();
        let needle = query.trim().to_lowercase();
        let records = tokio::task::spawn_blocking(move || catalog.query_vouchers(&needle))
            .await
            .map_err(PersistenceError::from)??;
        Ok(records)
    }
}
