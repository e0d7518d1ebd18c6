// Database layer: SQLite storage for classified posts and extraction runs.
//
// rusqlite with the "bundled" feature, so there's no system SQLite
// dependency. The database file lives wherever COASTWATCH_DB_PATH points
// (defaults to ./coastwatch.db). Storage is best-effort from the point of
// view of classification: nothing in classify/ or pipeline/extract depends
// on it.

pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use traits::PostStore;

#[cfg(feature = "sqlite")]
use std::path::Path;
#[cfg(feature = "sqlite")]
use std::sync::Arc;

#[cfg(feature = "sqlite")]
use anyhow::{Context, Result};
#[cfg(feature = "sqlite")]
use rusqlite::Connection;

/// Open (or create) the database and run migrations.
///
/// Called by `coastwatch init` and by any command that may create the file.
#[cfg(feature = "sqlite")]
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // WAL for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
#[cfg(feature = "sqlite")]
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `coastwatch init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Pick up migrations added since the file was created
    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database as a shareable PostStore.
#[cfg(feature = "sqlite")]
pub fn open_store(db_path: &str) -> Result<Arc<dyn PostStore>> {
    let conn = open(db_path)?;
    Ok(Arc::new(sqlite::SqliteStore::new(conn)))
}

/// Open (or create) the database as a shareable PostStore.
#[cfg(feature = "sqlite")]
pub fn initialize_store(db_path: &str) -> Result<Arc<dyn PostStore>> {
    let conn = initialize(db_path)?;
    Ok(Arc::new(sqlite::SqliteStore::new(conn)))
}
