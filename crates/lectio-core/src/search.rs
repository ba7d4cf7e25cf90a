//! Search service
//!
//! Debounced real-time search, bounded search-history tracking, suggestion
//! ranking, and search analytics on top of the content service.
//!
//! History tracking is a best-effort side channel: failures are logged and
//! never reach the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::content::{ContentService, SearchResults};
use crate::models::SearchFilters;
use crate::store::SharedStore;

/// Trailing-edge debounce window for real-time search
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Default result cap when the caller does not pass one
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Number of terms reported by analytics
const TOP_TERMS: usize = 10;

/// Aggregate search analytics derived from the bounded history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalytics {
    pub total_searches: i64,
    pub average_results: f64,
    /// Top terms by frequency, descending
    pub top_terms: Vec<(String, i64)>,
    /// Fraction of searches that produced at least one result
    pub success_rate: f64,
}

/// Debounced search over the content service
pub struct SearchService {
    content: Arc<ContentService>,
    store: SharedStore,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchService {
    pub fn new(content: Arc<ContentService>, store: SharedStore) -> Self {
        Self {
            content,
            store,
            pending: Mutex::new(None),
        }
    }

    /// Search the catalog
    ///
    /// Empty or whitespace-only queries return an empty result without
    /// touching the store. Failures degrade to an empty result.
    pub async fn search(&self, query: &str, limit: u32) -> SearchResults {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return SearchResults::empty(limit);
        }

        match run_search(
            self.content.clone(),
            self.store.clone(),
            trimmed.to_string(),
            limit,
        )
        .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(query = trimmed, error = %e, "search failed");
                SearchResults::empty(limit)
            }
        }
    }

    /// Debounced search: only the last call within the window executes
    ///
    /// Each call cancels any pending (not yet started) search and schedules
    /// a new one after the debounce delay. An in-flight search is not
    /// cancelled.
    pub fn realtime_search<F, E>(&self, query: &str, limit: u32, on_results: F, on_error: E)
    where
        F: FnOnce(SearchResults) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        let content = self.content.clone();
        let store = self.store.clone();
        let query = query.trim().to_string();

        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_DELAY).await;

            if query.is_empty() {
                on_results(SearchResults::empty(limit));
                return;
            }

            match run_search(content, store, query, limit).await {
                Ok(results) => on_results(results),
                Err(e) => on_error(e.to_string()),
            }
        }));
    }

    /// Cancel a pending (not yet executed) debounced search, if any
    pub fn cancel_pending(&self) {
        if let Some(handle) = self.pending.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Record a search in the bounded history, best-effort
    pub async fn track_search(&self, query: &str, results_count: i64) {
        if let Err(e) = self.store.lock().await.record_search(query, results_count) {
            warn!(query, error = %e, "failed to record search history");
        }
    }

    /// Suggest terms for a partial query
    ///
    /// Matches from history ranked by frequency, excluding an exact match
    /// of the query itself, backfilled with overall popular terms.
    pub async fn get_suggestions(&self, query: &str, limit: usize) -> Vec<String> {
        let history = match self.store.lock().await.search_history(None) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "failed to load search history");
                return Vec::new();
            }
        };

        let query_lower = query.trim().to_lowercase();
        let frequencies = term_frequencies(history.iter().map(|r| r.query.as_str()));
        let mut ranked: Vec<(String, i64)> = frequencies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut suggestions: Vec<String> = ranked
            .iter()
            .filter(|(term, _)| {
                term.to_lowercase().contains(&query_lower) && term.to_lowercase() != query_lower
            })
            .map(|(term, _)| term.clone())
            .take(limit)
            .collect();

        // Backfill with popular terms when matches run short
        if suggestions.len() < limit {
            for (term, _) in &ranked {
                if suggestions.len() >= limit {
                    break;
                }
                if term.to_lowercase() != query_lower && !suggestions.contains(term) {
                    suggestions.push(term.clone());
                }
            }
        }

        suggestions
    }

    /// Analytics over the bounded search history
    pub async fn get_analytics(&self) -> SearchAnalytics {
        let history = match self.store.lock().await.search_history(None) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "failed to load search history");
                Vec::new()
            }
        };

        let total = history.len() as i64;
        if total == 0 {
            return SearchAnalytics {
                total_searches: 0,
                average_results: 0.0,
                top_terms: Vec::new(),
                success_rate: 0.0,
            };
        }

        let result_sum: i64 = history.iter().map(|r| r.results_count).sum();
        let successes = history.iter().filter(|r| r.results_count > 0).count() as f64;

        let frequencies = term_frequencies(history.iter().map(|r| r.query.as_str()));
        let mut top_terms: Vec<(String, i64)> = frequencies.into_iter().collect();
        top_terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_terms.truncate(TOP_TERMS);

        SearchAnalytics {
            total_searches: total,
            average_results: result_sum as f64 / total as f64,
            top_terms,
            success_rate: successes / total as f64,
        }
    }
}

/// Execute a search and record it in history (best-effort)
async fn run_search(
    content: Arc<ContentService>,
    store: SharedStore,
    query: String,
    limit: u32,
) -> anyhow::Result<SearchResults> {
    let filters = SearchFilters {
        query: Some(query.clone()),
        limit: Some(limit),
        ..Default::default()
    };
    let results = content.search_readings(&filters).await?;

    if let Err(e) = store.lock().await.record_search(&query, results.total) {
        warn!(query, error = %e, "failed to record search history");
    }

    Ok(results)
}

fn term_frequencies<'a>(terms: impl Iterator<Item = &'a str>) -> HashMap<String, i64> {
    let mut frequencies = HashMap::new();
    for term in terms {
        *frequencies.entry(term.to_string()).or_insert(0) += 1;
    }
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Reading, ReadingType};
    use crate::store::{into_shared, ReadingStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample(id: &str, title: &str) -> Reading {
        Reading::with_id(id, "2026-01-04", title, "the word was with God", ReadingType::Gospel)
    }

    async fn service_with(readings: &[Reading]) -> SearchService {
        let mut store = ReadingStore::open_in_memory().unwrap();
        store.add_readings(readings).unwrap();
        let shared = into_shared(store);
        let content = Arc::new(ContentService::new(shared.clone()));
        SearchService::new(content, shared)
    }

    #[tokio::test]
    async fn test_empty_query_is_zero_cost() {
        let service = service_with(&[sample("r1", "Magnificat")]).await;

        let results = service.search("   ", 10).await;
        assert!(results.readings.is_empty());
        assert_eq!(results.total, 0);

        // No store hit: nothing was recorded in history
        let history = service.store.lock().await.search_history(None).unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_search_records_history() {
        let service = service_with(&[sample("r1", "Magnificat")]).await;

        let results = service.search("magnificat", 10).await;
        assert_eq!(results.total, 1);

        let history = service.store.lock().await.search_history(None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "magnificat");
        assert_eq!(history[0].results_count, 1);
    }

    #[tokio::test]
    async fn test_debounce_collapses_burst() {
        let service = service_with(&[sample("r1", "Benedictus"), sample("r2", "Magnificat")]).await;
        let executed = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        for query in ["b", "be", "magnificat"] {
            let executed = executed.clone();
            let tx = tx.clone();
            service.realtime_search(
                query,
                10,
                move |results| {
                    executed.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(results);
                },
                |_err| {},
            );
        }

        let results = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();

        // Only the last call in the burst executed, with its query string
        assert_eq!(executed.load(Ordering::SeqCst), 1);
        assert_eq!(results.total, 1);
        assert_eq!(results.readings[0].title, "Magnificat");

        // The collapsed searches never reached the history
        tokio::time::sleep(Duration::from_millis(50)).await;
        let history = service.store.lock().await.search_history(None).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_pending_debounce() {
        let service = service_with(&[sample("r1", "Benedictus")]).await;
        let executed = Arc::new(AtomicUsize::new(0));

        {
            let executed = executed.clone();
            service.realtime_search(
                "bene",
                10,
                move |_| {
                    executed.fetch_add(1, Ordering::SeqCst);
                },
                |_err| {},
            );
        }
        service.cancel_pending();

        tokio::time::sleep(DEBOUNCE_DELAY + Duration::from_millis(100)).await;
        assert_eq!(executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_suggestions_ranked_by_frequency() {
        let service = service_with(&[]).await;
        {
            let mut store = service.store.lock().await;
            store.record_search("psalm 23", 3).unwrap();
            store.record_search("psalm 23", 3).unwrap();
            store.record_search("psalm 91", 1).unwrap();
            store.record_search("gloria", 2).unwrap();
        }

        let suggestions = service.get_suggestions("psalm", 5).await;
        assert_eq!(suggestions[0], "psalm 23");
        assert_eq!(suggestions[1], "psalm 91");
        // Backfilled with popular non-matching terms
        assert!(suggestions.contains(&"gloria".to_string()));
    }

    #[tokio::test]
    async fn test_suggestions_exclude_exact_match() {
        let service = service_with(&[]).await;
        {
            let mut store = service.store.lock().await;
            store.record_search("gloria", 2).unwrap();
            store.record_search("gloria patri", 1).unwrap();
        }

        let suggestions = service.get_suggestions("gloria", 5).await;
        assert!(!suggestions.contains(&"gloria".to_string()));
        assert!(suggestions.contains(&"gloria patri".to_string()));
    }

    #[tokio::test]
    async fn test_analytics() {
        let service = service_with(&[]).await;
        {
            let mut store = service.store.lock().await;
            store.record_search("kyrie", 4).unwrap();
            store.record_search("kyrie", 2).unwrap();
            store.record_search("credo", 0).unwrap();
        }

        let analytics = service.get_analytics().await;
        assert_eq!(analytics.total_searches, 3);
        assert!((analytics.average_results - 2.0).abs() < f64::EPSILON);
        assert_eq!(analytics.top_terms[0], ("kyrie".to_string(), 2));
        assert!((analytics.success_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analytics_empty_history() {
        let service = service_with(&[]).await;
        let analytics = service.get_analytics().await;
        assert_eq!(analytics.total_searches, 0);
        assert_eq!(analytics.success_rate, 0.0);
        assert!(analytics.top_terms.is_empty());
    }
}
