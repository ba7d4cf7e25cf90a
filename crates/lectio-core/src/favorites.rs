//! Favorites service
//!
//! Enforces the favorite-consistency invariant: the denormalized flag on
//! the reading row and membership in the default collection move together.
//! Named collections beyond `default` are a user-organizational layer;
//! the default collection can never be deleted.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::models::{now_millis, FavoritesCollection, Reading};
use crate::store::SharedStore;

/// Id of the built-in collection that always exists
pub const DEFAULT_COLLECTION_ID: &str = "default";

/// Cap on "recently added" and "most viewed" statistics lists
pub const STATS_CAP: usize = 10;

/// Favorites statistics snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesStatistics {
    pub total_favorites: i64,
    pub total_collections: usize,
    /// Most recently favorited readings, newest first
    pub recently_added: Vec<Reading>,
    /// (reading id, view count), most viewed first
    pub most_viewed: Vec<(String, u64)>,
}

/// Versioned favorites export snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesExport {
    pub version: String,
    pub export_date: String,
    pub favorites: Vec<Reading>,
    pub collections: Vec<FavoritesCollection>,
}

/// Favorite membership and named collections
pub struct FavoritesService {
    store: SharedStore,
    collections: Mutex<HashMap<String, FavoritesCollection>>,
    views: Mutex<HashMap<String, u64>>,
}

impl FavoritesService {
    pub fn new(store: SharedStore) -> Self {
        let mut collections = HashMap::new();
        collections.insert(DEFAULT_COLLECTION_ID.to_string(), default_collection());

        Self {
            store,
            collections: Mutex::new(collections),
            views: Mutex::new(HashMap::new()),
        }
    }

    // ==================== Favorite Membership ====================

    /// Favorite a reading: sets the flag and joins the default collection
    pub async fn add_favorite(&self, reading_id: &str) -> Result<()> {
        self.store
            .lock()
            .await
            .toggle_favorite(reading_id, true)
            .with_context(|| format!("Failed to favorite reading '{}'", reading_id))?;

        let mut collections = self.collections.lock().unwrap();
        if let Some(default) = collections.get_mut(DEFAULT_COLLECTION_ID) {
            default.add_reading(reading_id);
        }
        Ok(())
    }

    /// Unfavorite a reading: clears the flag and leaves the default collection
    pub async fn remove_favorite(&self, reading_id: &str) -> Result<()> {
        self.store
            .lock()
            .await
            .toggle_favorite(reading_id, false)
            .with_context(|| format!("Failed to unfavorite reading '{}'", reading_id))?;

        let mut collections = self.collections.lock().unwrap();
        if let Some(default) = collections.get_mut(DEFAULT_COLLECTION_ID) {
            default.remove_reading(reading_id);
        }
        Ok(())
    }

    /// All favorited readings, most recently added first (degrades to empty)
    pub async fn get_favorites(&self) -> Vec<Reading> {
        match self.store.lock().await.get_favorites() {
            Ok(readings) => readings,
            Err(e) => {
                warn!(error = %e, "failed to load favorites");
                Vec::new()
            }
        }
    }

    /// Whether a reading is currently favorited
    pub async fn is_favorite(&self, reading_id: &str) -> bool {
        match self.store.lock().await.get_reading(reading_id) {
            Ok(Some(reading)) => reading.is_favorite,
            Ok(None) => false,
            Err(e) => {
                warn!(reading_id, error = %e, "failed to check favorite flag");
                false
            }
        }
    }

    /// Rebuild the default collection from the favorites index
    ///
    /// Called at startup so membership survives restarts.
    pub async fn reload_default_collection(&self) -> Result<()> {
        let ids = self
            .store
            .lock()
            .await
            .get_favorite_ids()
            .context("Failed to load favorite ids")?;

        let mut collections = self.collections.lock().unwrap();
        let default = collections
            .entry(DEFAULT_COLLECTION_ID.to_string())
            .or_insert_with(default_collection);
        default.reading_ids = ids;
        Ok(())
    }

    // ==================== Collections ====================

    /// Create a named collection
    pub fn create_collection(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<FavoritesCollection> {
        if name.trim().is_empty() {
            bail!("Collection name cannot be empty");
        }

        let collection = FavoritesCollection::new(name, description);
        self.collections
            .lock()
            .unwrap()
            .insert(collection.id.clone(), collection.clone());
        Ok(collection)
    }

    /// Delete a collection; the default collection cannot be deleted
    pub fn delete_collection(&self, collection_id: &str) -> Result<()> {
        if collection_id == DEFAULT_COLLECTION_ID {
            bail!("The default collection cannot be deleted");
        }

        if self
            .collections
            .lock()
            .unwrap()
            .remove(collection_id)
            .is_none()
        {
            bail!("Collection not found: '{}'", collection_id);
        }
        Ok(())
    }

    /// Add a reading to a collection (no duplicates)
    pub fn add_to_collection(&self, collection_id: &str, reading_id: &str) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .get_mut(collection_id)
            .with_context(|| format!("Collection not found: '{}'", collection_id))?;
        collection.add_reading(reading_id);
        Ok(())
    }

    /// Remove a reading from a collection
    pub fn remove_from_collection(&self, collection_id: &str, reading_id: &str) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .get_mut(collection_id)
            .with_context(|| format!("Collection not found: '{}'", collection_id))?;
        collection.remove_reading(reading_id);
        Ok(())
    }

    /// All collections, default first then by creation time
    pub fn get_collections(&self) -> Vec<FavoritesCollection> {
        let collections = self.collections.lock().unwrap();
        let mut all: Vec<FavoritesCollection> = collections.values().cloned().collect();
        all.sort_by(|a, b| {
            (a.id != DEFAULT_COLLECTION_ID)
                .cmp(&(b.id != DEFAULT_COLLECTION_ID))
                .then(a.created_at.cmp(&b.created_at))
        });
        all
    }

    /// A single collection by id
    pub fn get_collection(&self, collection_id: &str) -> Option<FavoritesCollection> {
        self.collections.lock().unwrap().get(collection_id).cloned()
    }

    // ==================== Statistics & Export ====================

    /// Count a view of a favorited reading
    pub fn track_favorite_view(&self, reading_id: &str) {
        *self
            .views
            .lock()
            .unwrap()
            .entry(reading_id.to_string())
            .or_insert(0) += 1;
    }

    /// Favorites statistics: totals, recently added, most viewed
    pub async fn get_statistics(&self) -> FavoritesStatistics {
        let (total_favorites, recently_added) = {
            let store = self.store.lock().await;
            let total = store.get_favorite_ids().map(|ids| ids.len() as i64);
            let recent = store.recent_favorites(STATS_CAP);
            match (total, recent) {
                (Ok(total), Ok(recent)) => (total, recent),
                (total, recent) => {
                    if let Err(e) = &total {
                        warn!(error = %e, "failed to count favorites");
                    }
                    if let Err(e) = &recent {
                        warn!(error = %e, "failed to load recent favorites");
                    }
                    (total.unwrap_or(0), recent.unwrap_or_default())
                }
            }
        };

        let mut most_viewed: Vec<(String, u64)> = self
            .views
            .lock()
            .unwrap()
            .iter()
            .map(|(id, count)| (id.clone(), *count))
            .collect();
        most_viewed.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_viewed.truncate(STATS_CAP);

        FavoritesStatistics {
            total_favorites,
            total_collections: self.collections.lock().unwrap().len(),
            recently_added,
            most_viewed,
        }
    }

    /// Versioned JSON snapshot of favorites and collections
    pub async fn export_favorites(&self) -> Result<FavoritesExport> {
        let favorites = self
            .store
            .lock()
            .await
            .get_favorites()
            .context("Failed to load favorites for export")?;

        Ok(FavoritesExport {
            version: "1.0".to_string(),
            export_date: chrono::Utc::now().to_rfc3339(),
            favorites,
            collections: self.get_collections(),
        })
    }

    /// Restore collections from an import (default collection is merged)
    pub fn restore_collections(&self, imported: Vec<FavoritesCollection>) {
        let mut collections = self.collections.lock().unwrap();
        for collection in imported {
            if collection.id == DEFAULT_COLLECTION_ID {
                let default = collections
                    .entry(DEFAULT_COLLECTION_ID.to_string())
                    .or_insert_with(default_collection);
                for id in &collection.reading_ids {
                    default.add_reading(id);
                }
            } else {
                collections.insert(collection.id.clone(), collection);
            }
        }
    }
}

fn default_collection() -> FavoritesCollection {
    let now = now_millis();
    FavoritesCollection {
        id: DEFAULT_COLLECTION_ID.to_string(),
        name: "Favorites".to_string(),
        description: None,
        reading_ids: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
