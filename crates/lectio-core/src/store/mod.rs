//! Durable, indexed persistence for the reading catalog
//!
//! The `ReadingStore` owns the single SQLite connection, the schema, and
//! every raw query in the system. Services above it compose these calls
//! and never touch SQL themselves.
//!
//! ## Tables
//!
//! - `readings` - the catalog, upserted by id
//! - `favorites` - side table mirroring the denormalized `is_favorite` flag
//! - `search_history` - bounded FIFO of recorded searches
//!
//! All writes are durable immediately (no write-behind). `add_readings` and
//! `toggle_favorite` run in a single transaction.

pub mod error;
pub mod schema;

use std::sync::Arc;

use rusqlite::{params, Connection, Row, ToSql, Transaction};

use crate::config::Config;
use crate::models::{now_millis, ContentStats, Reading, ReadingType, SearchFilters, SearchRecord};

pub use error::{StoreError, StoreResult};

/// Maximum rows kept in `search_history` (FIFO eviction of oldest)
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Store shared across services on the same runtime
///
/// The single connection is serialized by the async mutex; there is no
/// cross-call exclusion on logical operations beyond it.
pub type SharedStore = Arc<tokio::sync::Mutex<ReadingStore>>;

/// Wrap a store for sharing between services
pub fn into_shared(store: ReadingStore) -> SharedStore {
    Arc::new(tokio::sync::Mutex::new(store))
}

/// Durable reading catalog over a single SQLite connection
pub struct ReadingStore {
    conn: Connection,
}

impl ReadingStore {
    /// Open or create the catalog database at the configured path
    pub fn open(config: &Config) -> StoreResult<Self> {
        let path = config.sqlite_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if schema::needs_init(&conn) {
            schema::init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ==================== Reading Operations ====================

    /// Upsert a single reading by id
    ///
    /// The favorites side table is kept consistent with the reading's
    /// `is_favorite` flag in the same transaction.
    pub fn add_reading(&mut self, reading: &Reading) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        upsert_reading(&tx, reading)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of readings in a single transaction
    ///
    /// Either every reading lands or none does; returns the number written.
    pub fn add_readings(&mut self, readings: &[Reading]) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        for reading in readings {
            upsert_reading(&tx, reading)?;
        }
        tx.commit()?;
        Ok(readings.len())
    }

    /// Get a reading by id; `None` when absent
    pub fn get_reading(&self, id: &str) -> StoreResult<Option<Reading>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?", SELECT_READING))?;
        let mut rows = stmt.query(params![id])?;

        match rows.next()? {
            Some(row) => Ok(Some(read_reading_row(row)?)),
            None => Ok(None),
        }
    }

    /// Get all readings for an exact date, in creation order
    pub fn get_readings_for_date(&self, date: &str) -> StoreResult<Vec<Reading>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE date = ? ORDER BY created_at",
            SELECT_READING
        ))?;
        let rows = stmt.query_map(params![date], read_reading_row)?;
        collect_readings(rows)
    }

    /// Search the catalog with conjunctive filters
    ///
    /// Results are ordered by `date` descending; `limit`/`offset` apply
    /// after ordering.
    pub fn search_readings(&self, filters: &SearchFilters) -> StoreResult<Vec<Reading>> {
        let (clause, mut params) = build_filter_clause(filters);
        let mut sql = format!("{}{} ORDER BY date DESC", SELECT_READING, clause);

        if let Some(limit) = filters.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        } else if filters.offset.is_some() {
            // SQLite only honors OFFSET alongside LIMIT; -1 means unlimited
            sql.push_str(" LIMIT -1");
        }
        if let Some(offset) = filters.offset {
            sql.push_str(" OFFSET ?");
            params.push(Box::new(offset as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            read_reading_row,
        )?;
        collect_readings(rows)
    }

    /// Count readings matching the filters, ignoring limit/offset
    pub fn count_readings(&self, filters: &SearchFilters) -> StoreResult<i64> {
        let (clause, params) = build_filter_clause(filters);
        let sql = format!("SELECT COUNT(*) FROM readings{}", clause);

        let count = self.conn.query_row(
            &sql,
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get every reading, ordered by date descending
    pub fn all_readings(&self) -> StoreResult<Vec<Reading>> {
        self.search_readings(&SearchFilters::default())
    }

    /// Readings ordered favorites-first, then newest
    pub fn get_popular(&self, limit: usize) -> StoreResult<Vec<Reading>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY is_favorite DESC, date DESC LIMIT ?",
            SELECT_READING
        ))?;
        let rows = stmt.query_map(params![limit as i64], read_reading_row)?;
        collect_readings(rows)
    }

    /// Total number of readings
    pub fn reading_count(&self) -> StoreResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Favorite Operations ====================

    /// Set or clear a reading's favorite flag
    ///
    /// Updates the reading row and the favorites side table in the same
    /// transaction so the denormalized flag and the index never disagree.
    pub fn toggle_favorite(&mut self, id: &str, flag: bool) -> StoreResult<()> {
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE readings SET is_favorite = ?, updated_at = ? WHERE id = ?",
            params![flag as i64, now_millis(), id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }

        if flag {
            tx.execute(
                "INSERT OR IGNORE INTO favorites (reading_id, user_id, created_at) VALUES (?, NULL, ?)",
                params![id, now_millis()],
            )?;
        } else {
            tx.execute("DELETE FROM favorites WHERE reading_id = ?", params![id])?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Ids of all favorited readings
    pub fn get_favorite_ids(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT reading_id FROM favorites ORDER BY created_at DESC, id DESC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Favorited readings, most recently added first
    pub fn get_favorites(&self) -> StoreResult<Vec<Reading>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.date, r.title, r.content, r.type, r.reference, r.difficulty,
                    r.language, r.word_count, r.is_favorite, r.created_at, r.updated_at
             FROM readings r
             JOIN favorites f ON r.id = f.reading_id
             ORDER BY f.created_at DESC, f.id DESC",
        )?;
        let rows = stmt.query_map([], read_reading_row)?;
        collect_readings(rows)
    }

    /// Most recently favorited readings, capped at `limit`
    pub fn recent_favorites(&self, limit: usize) -> StoreResult<Vec<Reading>> {
        let mut favorites = self.get_favorites()?;
        favorites.truncate(limit);
        Ok(favorites)
    }

    // ==================== Search History ====================

    /// Record a search, evicting the oldest rows beyond the cap
    pub fn record_search(&mut self, query: &str, results_count: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO search_history (query, created_at, results_count) VALUES (?, ?, ?)",
            params![query, now_millis(), results_count],
        )?;
        tx.execute(
            "DELETE FROM search_history WHERE id NOT IN
             (SELECT id FROM search_history ORDER BY id DESC LIMIT ?)",
            params![MAX_HISTORY_ENTRIES as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Search history, newest first
    pub fn search_history(&self, limit: Option<usize>) -> StoreResult<Vec<SearchRecord>> {
        let limit = limit.unwrap_or(MAX_HISTORY_ENTRIES);
        let mut stmt = self.conn.prepare(
            "SELECT id, query, created_at, results_count FROM search_history
             ORDER BY id DESC LIMIT ?",
        )?;
        let records = stmt
            .query_map(params![limit as i64], |row| {
                Ok(SearchRecord {
                    id: row.get(0)?,
                    query: row.get(1)?,
                    created_at: row.get(2)?,
                    results_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // ==================== Stats ====================

    /// Aggregate catalog statistics
    pub fn get_stats(&self) -> StoreResult<ContentStats> {
        let total_readings = self.reading_count()?;
        let total_favorites: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT language FROM readings ORDER BY language")?;
        let languages = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let (earliest_date, latest_date): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM readings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let average_difficulty: Option<f64> =
            self.conn
                .query_row("SELECT AVG(difficulty) FROM readings", [], |row| row.get(0))?;

        Ok(ContentStats {
            total_readings,
            total_favorites,
            languages,
            earliest_date,
            latest_date,
            average_difficulty: average_difficulty.unwrap_or(0.0),
        })
    }

    /// Empty all tables
    pub fn clear_all(&mut self) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        // Order matters due to foreign keys
        tx.execute("DELETE FROM favorites", [])?;
        tx.execute("DELETE FROM search_history", [])?;
        tx.execute("DELETE FROM readings", [])?;
        tx.commit()?;
        Ok(())
    }
}

// ==================== Row mapping ====================

const SELECT_READING: &str = "SELECT id, date, title, content, type, reference, difficulty, \
     language, word_count, is_favorite, created_at, updated_at FROM readings";

fn read_reading_row(row: &Row) -> rusqlite::Result<Reading> {
    let type_str: String = row.get(4)?;
    let reading_type = ReadingType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown reading type '{}'", type_str).into(),
        )
    })?;

    Ok(Reading {
        id: row.get(0)?,
        date: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        reading_type,
        reference: row.get(5)?,
        difficulty: row.get::<_, i64>(6)? as u8,
        language: row.get(7)?,
        word_count: row.get::<_, i64>(8)? as u32,
        is_favorite: row.get::<_, i64>(9)? != 0,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn collect_readings(
    rows: impl Iterator<Item = rusqlite::Result<Reading>>,
) -> StoreResult<Vec<Reading>> {
    let mut readings = Vec::new();
    for row in rows {
        readings.push(row?);
    }
    Ok(readings)
}

/// Build the conjunctive WHERE clause for a filter set
///
/// Adding a filter clause only ever narrows the result set (monotonicity).
fn build_filter_clause(filters: &SearchFilters) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(ref query) = filters.query {
        let pattern = format!("%{}%", query.to_lowercase());
        clauses.push("(LOWER(title) LIKE ? OR LOWER(content) LIKE ?)".to_string());
        params.push(Box::new(pattern.clone()));
        params.push(Box::new(pattern));
    }

    if let Some((min, max)) = filters.difficulty {
        clauses.push("difficulty BETWEEN ? AND ?".to_string());
        params.push(Box::new(min as i64));
        params.push(Box::new(max as i64));
    }

    if let Some(ref language) = filters.language {
        clauses.push("language = ?".to_string());
        params.push(Box::new(language.clone()));
    }

    if let Some(reading_type) = filters.reading_type {
        clauses.push("type = ?".to_string());
        params.push(Box::new(reading_type.as_str().to_string()));
    }

    if filters.favorites_only {
        clauses.push("is_favorite = 1".to_string());
    }

    if let Some(ref from) = filters.date_from {
        clauses.push("date >= ?".to_string());
        params.push(Box::new(from.clone()));
    }

    if let Some(ref to) = filters.date_to {
        clauses.push("date <= ?".to_string());
        params.push(Box::new(to.clone()));
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    (clause, params)
}

/// Upsert a reading and sync the favorites side table
///
/// Uses ON CONFLICT DO UPDATE rather than INSERT OR REPLACE so the row is
/// never deleted (a replace would cascade-delete the favorites entry).
fn upsert_reading(tx: &Transaction, reading: &Reading) -> StoreResult<()> {
    tx.execute(
        r#"
        INSERT INTO readings
            (id, date, title, content, type, reference, difficulty, language,
             word_count, is_favorite, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            date = excluded.date,
            title = excluded.title,
            content = excluded.content,
            type = excluded.type,
            reference = excluded.reference,
            difficulty = excluded.difficulty,
            language = excluded.language,
            word_count = excluded.word_count,
            is_favorite = excluded.is_favorite,
            updated_at = excluded.updated_at
        "#,
        params![
            reading.id,
            reading.date,
            reading.title,
            reading.content,
            reading.reading_type.as_str(),
            reading.reference,
            reading.difficulty as i64,
            reading.language,
            reading.word_count as i64,
            reading.is_favorite as i64,
            reading.created_at,
            reading.updated_at,
        ],
    )?;

    if reading.is_favorite {
        tx.execute(
            "INSERT OR IGNORE INTO favorites (reading_id, user_id, created_at) VALUES (?, NULL, ?)",
            params![reading.id, now_millis()],
        )?;
    } else {
        tx.execute(
            "DELETE FROM favorites WHERE reading_id = ?",
            params![reading.id],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, date: &str, difficulty: u8) -> Reading {
        let mut reading = Reading::with_id(
            id,
            date,
            format!("Reading {}", id),
            "And he said unto them",
            ReadingType::Gospel,
        );
        reading.difficulty = difficulty;
        reading
    }

    #[test]
    fn test_add_and_get_reading() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        let reading = sample("r1", "2026-01-04", 2);

        store.add_reading(&reading).unwrap();

        let found = store.get_reading("r1").unwrap().unwrap();
        assert_eq!(found.title, "Reading r1");
        assert_eq!(found.difficulty, 2);
        assert_eq!(found.reading_type, ReadingType::Gospel);
    }

    #[test]
    fn test_get_missing_reading_is_none() {
        let store = ReadingStore::open_in_memory().unwrap();
        assert!(store.get_reading("nope").unwrap().is_none());
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        let mut reading = sample("r1", "2026-01-04", 2);

        store.add_reading(&reading).unwrap();
        reading.title = "Replaced".to_string();
        store.add_reading(&reading).unwrap();

        assert_eq!(store.reading_count().unwrap(), 1);
        assert_eq!(store.get_reading("r1").unwrap().unwrap().title, "Replaced");
    }

    #[test]
    fn test_upsert_preserves_favorite_row() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        let mut reading = sample("r1", "2026-01-04", 2);
        store.add_reading(&reading).unwrap();
        store.toggle_favorite("r1", true).unwrap();

        // Re-upsert with the flag carried over
        reading.is_favorite = true;
        reading.title = "Updated".to_string();
        store.add_reading(&reading).unwrap();

        assert_eq!(store.get_favorite_ids().unwrap(), vec!["r1"]);
        assert!(store.get_reading("r1").unwrap().unwrap().is_favorite);
    }

    #[test]
    fn test_add_readings_batch() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        let readings: Vec<Reading> = (1..=5)
            .map(|i| sample(&format!("r{}", i), "2026-01-04", i as u8))
            .collect();

        let written = store.add_readings(&readings).unwrap();
        assert_eq!(written, 5);
        assert_eq!(store.reading_count().unwrap(), 5);
    }

    #[test]
    fn test_toggle_favorite_consistency() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        store.add_reading(&sample("r1", "2026-01-04", 1)).unwrap();

        store.toggle_favorite("r1", true).unwrap();
        assert!(store.get_reading("r1").unwrap().unwrap().is_favorite);
        assert!(store.get_favorite_ids().unwrap().contains(&"r1".to_string()));

        store.toggle_favorite("r1", false).unwrap();
        assert!(!store.get_reading("r1").unwrap().unwrap().is_favorite);
        assert!(store.get_favorite_ids().unwrap().is_empty());
    }

    #[test]
    fn test_toggle_favorite_missing_reading() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        let err = store.toggle_favorite("ghost", true).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_toggle_favorite_is_idempotent() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        store.add_reading(&sample("r1", "2026-01-04", 1)).unwrap();

        store.toggle_favorite("r1", true).unwrap();
        store.toggle_favorite("r1", true).unwrap();
        assert_eq!(store.get_favorite_ids().unwrap().len(), 1);
    }

    #[test]
    fn test_search_difficulty_range() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        for i in 1..=5u8 {
            store
                .add_reading(&sample(&format!("r{}", i), &format!("2026-01-0{}", i), i))
                .unwrap();
        }

        let filters = SearchFilters {
            difficulty: Some((2, 4)),
            ..Default::default()
        };
        let results = store.search_readings(&filters).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        // Ordered by date descending
        assert_eq!(ids, vec!["r4", "r3", "r2"]);
    }

    #[test]
    fn test_search_text_matches_title_or_content() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        let mut by_title = sample("r1", "2026-01-01", 1);
        by_title.title = "The Good Shepherd".to_string();
        let mut by_content = sample("r2", "2026-01-02", 1);
        by_content.content = "I am the good shepherd".to_string();
        let neither = sample("r3", "2026-01-03", 1);
        store
            .add_readings(&[by_title, by_content, neither])
            .unwrap();

        let filters = SearchFilters {
            query: Some("SHEPHERD".to_string()),
            ..Default::default()
        };
        let results = store.search_readings(&filters).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_search_filter_monotonicity() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        for i in 1..=5u8 {
            let mut reading = sample(&format!("r{}", i), &format!("2026-01-0{}", i), i);
            reading.language = if i % 2 == 0 { "la" } else { "en" }.to_string();
            store.add_reading(&reading).unwrap();
        }

        let base = SearchFilters::default();
        let narrowed = SearchFilters {
            difficulty: Some((2, 4)),
            ..Default::default()
        };
        let narrower = SearchFilters {
            difficulty: Some((2, 4)),
            language: Some("la".to_string()),
            ..Default::default()
        };

        let n0 = store.search_readings(&base).unwrap().len();
        let n1 = store.search_readings(&narrowed).unwrap().len();
        let n2 = store.search_readings(&narrower).unwrap().len();
        assert!(n1 <= n0);
        assert!(n2 <= n1);
    }

    #[test]
    fn test_search_favorites_only() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        store.add_reading(&sample("r1", "2026-01-01", 1)).unwrap();
        store.add_reading(&sample("r2", "2026-01-02", 1)).unwrap();
        store.toggle_favorite("r2", true).unwrap();

        let filters = SearchFilters {
            favorites_only: true,
            ..Default::default()
        };
        let results = store.search_readings(&filters).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "r2");
    }

    #[test]
    fn test_search_limit_offset() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        for i in 1..=5u8 {
            store
                .add_reading(&sample(&format!("r{}", i), &format!("2026-01-0{}", i), 1))
                .unwrap();
        }

        let filters = SearchFilters {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        };
        let results = store.search_readings(&filters).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        // date desc is r5..r1; offset 1 skips r5
        assert_eq!(ids, vec!["r4", "r3"]);
    }

    #[test]
    fn test_search_offset_without_limit() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        for i in 1..=5u8 {
            store
                .add_reading(&sample(&format!("r{}", i), &format!("2026-01-0{}", i), 1))
                .unwrap();
        }

        let filters = SearchFilters {
            offset: Some(2),
            ..Default::default()
        };
        let results = store.search_readings(&filters).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        // date desc is r5..r1; offset 2 drops r5 and r4
        assert_eq!(ids, vec!["r3", "r2", "r1"]);
    }

    #[test]
    fn test_count_ignores_limit() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        for i in 1..=5u8 {
            store
                .add_reading(&sample(&format!("r{}", i), "2026-01-01", 1))
                .unwrap();
        }

        let filters = SearchFilters {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(store.count_readings(&filters).unwrap(), 5);
    }

    #[test]
    fn test_date_range_filter() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        for i in 1..=5u8 {
            store
                .add_reading(&sample(&format!("r{}", i), &format!("2026-01-0{}", i), 1))
                .unwrap();
        }

        let filters = SearchFilters {
            date_from: Some("2026-01-02".to_string()),
            date_to: Some("2026-01-04".to_string()),
            ..Default::default()
        };
        let results = store.search_readings(&filters).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_record_search_bounded() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        for i in 0..(MAX_HISTORY_ENTRIES + 10) {
            store.record_search(&format!("query {}", i), 1).unwrap();
        }

        let history = store.search_history(None).unwrap();
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        // Newest first; the oldest 10 were evicted
        assert_eq!(history[0].query, format!("query {}", MAX_HISTORY_ENTRIES + 9));
        assert!(history.iter().all(|r| r.query != "query 0"));
    }

    #[test]
    fn test_get_stats() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        let mut r1 = sample("r1", "2026-01-01", 1);
        r1.language = "en".to_string();
        let mut r2 = sample("r2", "2026-02-01", 5);
        r2.language = "la".to_string();
        store.add_readings(&[r1, r2]).unwrap();
        store.toggle_favorite("r1", true).unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_readings, 2);
        assert_eq!(stats.total_favorites, 1);
        assert_eq!(stats.languages, vec!["en", "la"]);
        assert_eq!(stats.earliest_date.as_deref(), Some("2026-01-01"));
        assert_eq!(stats.latest_date.as_deref(), Some("2026-02-01"));
        assert!((stats.average_difficulty - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_empty_catalog() {
        let store = ReadingStore::open_in_memory().unwrap();
        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_readings, 0);
        assert_eq!(stats.average_difficulty, 0.0);
        assert!(stats.earliest_date.is_none());
    }

    #[test]
    fn test_clear_all() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        store.add_reading(&sample("r1", "2026-01-01", 1)).unwrap();
        store.toggle_favorite("r1", true).unwrap();
        store.record_search("kyrie", 3).unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.reading_count().unwrap(), 0);
        assert!(store.get_favorite_ids().unwrap().is_empty());
        assert!(store.search_history(None).unwrap().is_empty());
    }

    #[test]
    fn test_get_popular_orders_favorites_first() {
        let mut store = ReadingStore::open_in_memory().unwrap();
        store.add_reading(&sample("r1", "2026-01-05", 1)).unwrap();
        store.add_reading(&sample("r2", "2026-01-01", 1)).unwrap();
        store.toggle_favorite("r2", true).unwrap();

        let popular = store.get_popular(2).unwrap();
        assert_eq!(popular[0].id, "r2");
        assert_eq!(popular[1].id, "r1");
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            sync_enabled: false,
            sync_interval_secs: 300,
        };

        {
            let mut store = ReadingStore::open(&config).unwrap();
            store.add_reading(&sample("r1", "2026-01-01", 2)).unwrap();
        }

        let store = ReadingStore::open(&config).unwrap();
        assert_eq!(store.reading_count().unwrap(), 1);
        assert_eq!(store.get_reading("r1").unwrap().unwrap().difficulty, 2);
    }
}
