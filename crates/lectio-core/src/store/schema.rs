//! SQLite schema for the reading catalog
//!
//! The column layout of `readings`, `favorites`, and `search_history` is a
//! compatibility contract with existing exports; do not reorder or rename.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Catalog of readings
        CREATE TABLE IF NOT EXISTS readings (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            type TEXT NOT NULL,
            reference TEXT NOT NULL,
            difficulty INTEGER NOT NULL,
            language TEXT NOT NULL,
            word_count INTEGER NOT NULL,
            is_favorite INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Favorites index (one row per favorited reading)
        CREATE TABLE IF NOT EXISTS favorites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reading_id TEXT UNIQUE NOT NULL,
            user_id TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (reading_id) REFERENCES readings(id) ON DELETE CASCADE
        );

        -- Bounded search history
        CREATE TABLE IF NOT EXISTS search_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            query TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            results_count INTEGER NOT NULL
        );

        -- Indexes for the filtered-search query patterns
        CREATE INDEX IF NOT EXISTS idx_readings_date ON readings(date);
        CREATE INDEX IF NOT EXISTS idx_readings_type ON readings(type);
        CREATE INDEX IF NOT EXISTS idx_readings_difficulty ON readings(difficulty);
        CREATE INDEX IF NOT EXISTS idx_readings_language ON readings(language);
        CREATE INDEX IF NOT EXISTS idx_readings_is_favorite ON readings(is_favorite);

        CREATE INDEX IF NOT EXISTS idx_favorites_reading_id ON favorites(reading_id);
        CREATE INDEX IF NOT EXISTS idx_search_history_created_at ON search_history(created_at);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    // Check if schema_info table exists
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}
