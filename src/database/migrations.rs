//! Database migrations for floorwatch
//!
//! This module contains SQL migrations for the SQLite database schema.

/// SQL statement to create the initial database schema
pub const CREATE_SCHEMA: &str = r#"
-- Tracked collections, one row per slug
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    floor_price REAL,
    item_count INTEGER
);

-- Single-row summary of the most recent sync pass
CREATE TABLE IF NOT EXISTS pass_status (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_pass_at DATETIME,
    state TEXT NOT NULL DEFAULT 'pending',
    error_message TEXT,
    succeeded INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0
);
"#;

/// Get the migration version
pub fn migration_version() -> i32 {
    1
}
