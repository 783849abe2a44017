//! SQLite implementation of the RecordStore trait
//!
//! This module provides a SQLite-based implementation of the store using
//! rusqlite and tokio-rusqlite for async operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::migrations::CREATE_SCHEMA;
use super::RecordStore;
use crate::error::StoreError;
use crate::models::{CollectionRecord, NewCollectionRecord, PassState, PassStatus};

/// SQLite record store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SQLite store
    ///
    /// Use `:memory:` for an in-memory database or a file path for
    /// persistent storage.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;

        // Run migrations
        conn.call(|conn| {
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Create a new in-memory store (useful for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:").await
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn upsert_floor_price(&self, slug: &str, price: f64) -> Result<(), StoreError> {
        let slug = slug.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO collections (slug, floor_price)
                    VALUES (?1, ?2)
                    ON CONFLICT(slug) DO UPDATE SET floor_price = excluded.floor_price
                    "#,
                    rusqlite::params![slug, price],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<CollectionRecord>, StoreError> {
        let slug = slug.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, slug, floor_price, item_count
                    FROM collections
                    WHERE slug = ?1
                    "#,
                )?;

                let result = stmt
                    .query_row([&slug], |row| {
                        Ok(CollectionRecord {
                            id: Some(row.get(0)?),
                            slug: row.get(1)?,
                            floor_price: row.get(2)?,
                            item_count: row.get(3)?,
                        })
                    })
                    .optional()?;

                Ok(result)
            })
            .await
            .map_err(Into::into)
    }

    async fn list_all(&self) -> Result<Vec<CollectionRecord>, StoreError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, slug, floor_price, item_count
                    FROM collections
                    ORDER BY slug
                    "#,
                )?;

                let records = stmt
                    .query_map([], |row| {
                        Ok(CollectionRecord {
                            id: Some(row.get(0)?),
                            slug: row.get(1)?,
                            floor_price: row.get(2)?,
                            item_count: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(records)
            })
            .await
            .map_err(Into::into)
    }

    async fn insert(&self, record: &NewCollectionRecord) -> Result<i64, StoreError> {
        let slug = record.slug.clone();
        let floor_price = record.floor_price;
        let item_count = record.item_count;

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO collections (slug, floor_price, item_count)
                    VALUES (?1, ?2, ?3)
                    "#,
                    rusqlite::params![slug, floor_price, item_count],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Into::into)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let rows_affected = self
            .conn
            .call(move |conn| {
                let count = conn.execute("DELETE FROM collections WHERE id = ?1", [id])?;
                Ok(count)
            })
            .await?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn update_pass_status(&self, status: &PassStatus) -> Result<(), StoreError> {
        let last_pass_at = status.last_pass_at.map(|dt| dt.to_rfc3339());
        let state = status.state.to_string();
        let error_message = status.error_message.clone();
        let succeeded = status.succeeded as i64;
        let failed = status.failed as i64;

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT OR REPLACE INTO pass_status
                    (id, last_pass_at, state, error_message, succeeded, failed)
                    VALUES (1, ?1, ?2, ?3, ?4, ?5)
                    "#,
                    rusqlite::params![last_pass_at, state, error_message, succeeded, failed],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn get_pass_status(&self) -> Result<PassStatus, StoreError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT last_pass_at, state, error_message, succeeded, failed
                    FROM pass_status
                    WHERE id = 1
                    "#,
                )?;

                let result = stmt
                    .query_row([], |row| {
                        Ok(PassStatus {
                            last_pass_at: parse_datetime(row.get::<_, Option<String>>(0)?),
                            state: parse_pass_state(row.get::<_, String>(1)?),
                            error_message: row.get(2)?,
                            succeeded: row.get::<_, i64>(3)? as u64,
                            failed: row.get::<_, i64>(4)? as u64,
                        })
                    })
                    .optional()?;

                Ok(result.unwrap_or_default())
            })
            .await
            .map_err(Into::into)
    }
}

/// Parse an RFC 3339 datetime string from the database
fn parse_datetime(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Parse a stored pass state, falling back to pending for unknown values
fn parse_pass_state(value: String) -> PassState {
    value.parse().unwrap_or(PassState::Pending)
}
