//! Content service
//!
//! Composes the reading store with cache-aside read paths: date-scoped
//! reads, filtered search with pagination metadata, popular selection, and
//! heuristic recommendations behind a pluggable ranking strategy.
//!
//! Read paths degrade to empty results on store failure (logged, not
//! raised); favorite mutations propagate errors and invalidate
//! favorites-scoped cache entries.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::time::Instant;
use tracing::warn;

use crate::cache::TtlCache;
use crate::models::{ContentStats, Reading, SearchFilters};
use crate::store::SharedStore;

/// Number of readings in featured/popular selections
pub const FEATURED_COUNT: usize = 5;

/// A page of search results with pagination metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub readings: Vec<Reading>,
    /// Total matches ignoring limit/offset
    pub total: i64,
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
    /// Wall-clock time of the underlying query
    pub execution_time_ms: u64,
}

impl SearchResults {
    /// An empty result page (used for rejected/failed searches)
    pub fn empty(limit: u32) -> Self {
        Self {
            readings: Vec::new(),
            total: 0,
            offset: 0,
            limit,
            has_more: false,
            execution_time_ms: 0,
        }
    }
}

/// A recommended reading with its ranking score
///
/// The score orders recommendations; its precision carries no meaning
/// beyond that ordering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredReading {
    pub reading: Reading,
    pub score: f64,
}

/// Ranking strategy for recommendations
pub trait RankingStrategy: Send + Sync {
    /// Select and order recommendations from the candidate pool
    fn rank(&self, candidates: Vec<Reading>) -> Vec<ScoredReading>;
}

/// Default strategy: one reading per difficulty level 2-4, scored
/// uniformly in [0.7, 1.0), sorted descending
pub struct StratifiedSampler;

impl RankingStrategy for StratifiedSampler {
    fn rank(&self, candidates: Vec<Reading>) -> Vec<ScoredReading> {
        let mut rng = rand::thread_rng();
        let mut picks = Vec::new();

        for level in 2..=4u8 {
            let pool: Vec<&Reading> = candidates
                .iter()
                .filter(|r| r.difficulty == level)
                .collect();
            if let Some(chosen) = pool.choose(&mut rng) {
                picks.push(ScoredReading {
                    reading: (*chosen).clone(),
                    score: rng.gen_range(0.70..1.0),
                });
            }
        }

        picks.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        picks
    }
}

/// Cache-aside content access over the shared store
pub struct ContentService {
    store: SharedStore,
    date_cache: TtlCache<Vec<Reading>>,
    search_cache: TtlCache<SearchResults>,
    popular_cache: TtlCache<Vec<Reading>>,
    recommend_cache: TtlCache<Vec<ScoredReading>>,
    ranker: Box<dyn RankingStrategy>,
}

impl ContentService {
    /// Create a service with the default stratified-sampling ranker
    pub fn new(store: SharedStore) -> Self {
        Self::with_ranker(store, Box::new(StratifiedSampler))
    }

    /// Create a service with a custom ranking strategy
    pub fn with_ranker(store: SharedStore, ranker: Box<dyn RankingStrategy>) -> Self {
        Self {
            store,
            date_cache: TtlCache::new(),
            search_cache: TtlCache::new(),
            popular_cache: TtlCache::new(),
            recommend_cache: TtlCache::new(),
            ranker,
        }
    }

    /// Readings for an exact date, cached by date
    pub async fn get_readings_for_date(&self, date: &str) -> Vec<Reading> {
        let key = format!("date:{}", date);
        if let Some(cached) = self.date_cache.get(&key) {
            return cached;
        }

        match self.store.lock().await.get_readings_for_date(date) {
            Ok(readings) => {
                self.date_cache.insert(key, readings.clone());
                readings
            }
            Err(e) => {
                warn!(date, error = %e, "failed to load readings for date");
                Vec::new()
            }
        }
    }

    /// Filtered search with pagination metadata
    ///
    /// Cached by the deterministic filter key; `execution_time_ms` reflects
    /// the query that populated the entry.
    pub async fn search_readings(&self, filters: &SearchFilters) -> Result<SearchResults> {
        let key = filters.cache_key();
        if let Some(cached) = self.search_cache.get(&key) {
            return Ok(cached);
        }

        let started = Instant::now();
        let (readings, total) = {
            let store = self.store.lock().await;
            let readings = store
                .search_readings(filters)
                .context("Failed to search readings")?;
            let total = store
                .count_readings(filters)
                .context("Failed to count search results")?;
            (readings, total)
        };

        let offset = filters.offset.unwrap_or(0);
        let limit = filters.limit.unwrap_or(readings.len() as u32);
        let results = SearchResults {
            has_more: (offset as i64 + readings.len() as i64) < total,
            total,
            offset,
            limit,
            execution_time_ms: started.elapsed().as_millis() as u64,
            readings,
        };

        self.search_cache.insert(key, results.clone());
        Ok(results)
    }

    /// Popular readings: favorites first, then newest
    pub async fn get_popular_readings(&self, limit: usize) -> Vec<Reading> {
        let key = format!("popular:{}", limit);
        if let Some(cached) = self.popular_cache.get(&key) {
            return cached;
        }

        match self.store.lock().await.get_popular(limit) {
            Ok(readings) => {
                self.popular_cache.insert(key, readings.clone());
                readings
            }
            Err(e) => {
                warn!(error = %e, "failed to load popular readings");
                Vec::new()
            }
        }
    }

    /// Recommendations via the configured ranking strategy
    pub async fn get_recommendations(&self, user_id: Option<&str>) -> Vec<ScoredReading> {
        let key = format!("rec:{}", user_id.unwrap_or("anonymous"));
        if let Some(cached) = self.recommend_cache.get(&key) {
            return cached;
        }

        let candidates = match self.store.lock().await.all_readings() {
            Ok(readings) => readings,
            Err(e) => {
                warn!(error = %e, "failed to load recommendation candidates");
                return Vec::new();
            }
        };

        let ranked = self.ranker.rank(candidates);
        self.recommend_cache.insert(key, ranked.clone());
        ranked
    }

    /// Aggregate catalog statistics (uncached; cheap aggregate queries)
    pub async fn get_stats(&self) -> Result<ContentStats> {
        self.store
            .lock()
            .await
            .get_stats()
            .context("Failed to load catalog stats")
    }

    /// Mark a reading as favorite
    pub async fn add_to_favorites(&self, id: &str) -> Result<()> {
        self.store
            .lock()
            .await
            .toggle_favorite(id, true)
            .with_context(|| format!("Failed to favorite reading '{}'", id))?;
        self.invalidate_favorites_scoped();
        Ok(())
    }

    /// Clear a reading's favorite flag
    pub async fn remove_from_favorites(&self, id: &str) -> Result<()> {
        self.store
            .lock()
            .await
            .toggle_favorite(id, false)
            .with_context(|| format!("Failed to unfavorite reading '{}'", id))?;
        self.invalidate_favorites_scoped();
        Ok(())
    }

    /// Drop cache entries whose contents depend on favorite state
    ///
    /// Date-scoped entries keep the stale flag until their TTL lapses.
    fn invalidate_favorites_scoped(&self) {
        self.search_cache.invalidate_where(|key| key.contains("fav=1"));
        self.popular_cache.clear();
        self.recommend_cache.clear();
    }

    /// Drop every cached entry
    pub fn clear_caches(&self) {
        self.date_cache.clear();
        self.search_cache.clear();
        self.popular_cache.clear();
        self.recommend_cache.clear();
    }
}
