//! Record store for floorwatch
//!
//! This module defines the store trait and its SQLite implementation.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{CollectionRecord, NewCollectionRecord, PassStatus};

/// Store of persisted collection records, keyed by slug
///
/// The sync pipeline only needs `upsert_floor_price` and the pass-status
/// operations; the remaining operations back the CRUD surface. The store
/// guarantees at most one record per slug, and every operation is
/// independently atomic (no cross-record transactions).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the record for `slug` if absent, otherwise overwrite only its
    /// floor price, leaving other fields untouched. Idempotent.
    async fn upsert_floor_price(&self, slug: &str, price: f64) -> Result<(), StoreError>;

    /// Look up the record for a slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<CollectionRecord>, StoreError>;

    /// List every record, ordered by slug
    async fn list_all(&self) -> Result<Vec<CollectionRecord>, StoreError>;

    /// Insert a new record; a duplicate slug is a constraint violation
    ///
    /// Returns the handle of the inserted record
    async fn insert(&self, record: &NewCollectionRecord) -> Result<i64, StoreError>;

    /// Delete one record by its opaque handle
    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;

    /// Persist the summary of the most recent sync pass
    async fn update_pass_status(&self, status: &PassStatus) -> Result<(), StoreError>;

    /// Read the summary of the most recent sync pass
    async fn get_pass_status(&self) -> Result<PassStatus, StoreError>;
}
