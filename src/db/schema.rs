// Database schema: table creation and migrations.
//
// A `schema_version` table records the schema version each database was
// created with, so later changes can be applied as numbered migrations.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// Idempotent, safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per classified post; re-storing an id replaces it
        CREATE TABLE IF NOT EXISTS classified_posts (
            id TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL,
            cleaned_text TEXT NOT NULL,
            hashtags TEXT NOT NULL DEFAULT '[]', -- JSON array
            source_context TEXT,                 -- subreddit / channel
            profile TEXT NOT NULL,
            category TEXT NOT NULL,              -- rule name or 'General'
            confidence REAL NOT NULL,            -- 0.0 to 1.0
            urgency TEXT NOT NULL,               -- low / medium / high
            sentiment REAL NOT NULL,             -- -1.0 to 1.0
            risk REAL NOT NULL,                  -- 0.0 to 1.0
            verified INTEGER NOT NULL DEFAULT 0,
            criticality TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            posted_at TEXT,
            stored_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Summary of each extraction batch
        CREATE TABLE IF NOT EXISTS extraction_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile TEXT,
            total_posts INTEGER NOT NULL,
            hazard_posts INTEGER NOT NULL,
            verified INTEGER NOT NULL,
            stored INTEGER NOT NULL DEFAULT 0,
            failed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_category
            ON classified_posts(category);

        CREATE INDEX IF NOT EXISTS idx_posts_confidence
            ON classified_posts(confidence);

        CREATE INDEX IF NOT EXISTS idx_posts_urgency
            ON classified_posts(urgency);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (used for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
