//! Export, import, and backups
//!
//! Exports are versioned JSON bundles (or CSV for spreadsheets). Backups
//! are content-addressed: the backup id is the SHA-256 of the catalog
//! content (readings, favorites, stats), used as identity, not
//! cryptographic integrity. At most `MAX_BACKUPS` are kept; creating one
//! past the cap evicts the oldest.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::favorites::FavoritesService;
use crate::models::{now_millis, ContentStats, FavoritesCollection, Reading};
use crate::store::SharedStore;

/// Maximum number of backups kept on disk
pub const MAX_BACKUPS: usize = 10;

/// Current export bundle version
pub const EXPORT_VERSION: &str = "1.0";

const INDEX_FILE: &str = "index.json";

/// What an export bundle carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Readings, favorites, and stats
    Full,
    /// Readings only
    Readings,
    /// Favorites only
    Favorites,
    /// Readings and favorites, no stats
    Custom,
}

/// Summary block embedded in every export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub total_readings: usize,
    pub total_favorites: usize,
    pub reading_types: Vec<String>,
    pub languages: Vec<String>,
    pub date_range: Option<(String, String)>,
}

/// Versioned export bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub export_date: String,
    pub format: String,
    pub data_type: DataType,
    pub readings: Vec<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<FavoritesCollection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ContentStats>,
    pub metadata: ExportMetadata,
}

/// How an import applies the bundle
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Clear the catalog before importing
    pub overwrite: bool,
    /// Skip readings whose id already exists
    pub skip_duplicates: bool,
    /// Re-add favorite membership from the bundle
    pub import_favorites: bool,
}

/// Outcome of an import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub favorites_restored: usize,
}

/// Metadata for one stored backup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    /// SHA-256 of the backup payload
    pub id: String,
    /// User-supplied label
    pub name: String,
    /// Created timestamp, epoch milliseconds
    pub created_at: i64,
    /// Payload size in bytes
    pub size_bytes: u64,
    /// Number of readings in the backup
    pub reading_count: usize,
}

/// JSON/CSV export, import, and content-addressed backups
pub struct ExportImportService {
    store: SharedStore,
    favorites: Arc<FavoritesService>,
    backups_dir: PathBuf,
    index: Mutex<Vec<BackupMetadata>>,
}

impl ExportImportService {
    /// Create the service, loading any existing backup index from disk
    pub fn new(store: SharedStore, favorites: Arc<FavoritesService>, backups_dir: PathBuf) -> Self {
        let index = load_index(&backups_dir);
        Self {
            store,
            favorites,
            backups_dir,
            index: Mutex::new(index),
        }
    }

    // ==================== Export ====================

    /// Build an export bundle of the requested shape
    pub async fn export_bundle(&self, data_type: DataType) -> Result<ExportBundle> {
        let (readings, stats) = {
            let store = self.store.lock().await;
            let readings = store.all_readings().context("Failed to load catalog")?;
            let stats = store.get_stats().context("Failed to load stats")?;
            (readings, stats)
        };

        let collections = self.favorites.get_collections();
        let favorite_readings: Vec<Reading> =
            readings.iter().filter(|r| r.is_favorite).cloned().collect();

        let metadata = build_metadata(&readings, &stats);

        let bundle_readings = match data_type {
            DataType::Favorites => favorite_readings,
            _ => readings,
        };

        Ok(ExportBundle {
            version: EXPORT_VERSION.to_string(),
            export_date: chrono::Utc::now().to_rfc3339(),
            format: "json".to_string(),
            data_type,
            readings: bundle_readings,
            favorites: match data_type {
                DataType::Readings => None,
                _ => Some(collections),
            },
            stats: match data_type {
                DataType::Full => Some(stats),
                _ => None,
            },
            metadata,
        })
    }

    /// Export as pretty-printed JSON
    pub async fn export_to_json(&self, data_type: DataType) -> Result<String> {
        let bundle = self.export_bundle(data_type).await?;
        serde_json::to_string_pretty(&bundle).context("Failed to serialize export")
    }

    /// Export the catalog as CSV
    pub async fn export_to_csv(&self) -> Result<String> {
        let readings = self
            .store
            .lock()
            .await
            .all_readings()
            .context("Failed to load catalog")?;

        let mut csv = String::from(
            "ID,Date,Title,Type,Reference,Difficulty,Language,Word Count,Is Favorite\n",
        );
        for r in &readings {
            csv.push_str(&format!(
                "{},{},\"{}\",{},{},{},{},{},{}\n",
                r.id,
                r.date,
                r.title.replace('"', "\"\""),
                r.reading_type,
                r.reference,
                r.difficulty,
                r.language,
                r.word_count,
                r.is_favorite,
            ));
        }
        Ok(csv)
    }

    // ==================== Import ====================

    /// Import a JSON export bundle
    ///
    /// The bundle shape is validated before anything is written.
    pub async fn import_from_json(&self, json: &str, options: ImportOptions) -> Result<ImportReport> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("Import payload is not valid JSON")?;
        validate_bundle_shape(&value)?;

        let bundle: ExportBundle =
            serde_json::from_value(value).context("Import payload does not match the export format")?;

        let (imported, skipped) = {
            let mut store = self.store.lock().await;

            if options.overwrite {
                store.clear_all().context("Failed to clear catalog for overwrite")?;
            }

            let mut to_insert = Vec::with_capacity(bundle.readings.len());
            let mut skipped = 0usize;
            for reading in bundle.readings.iter() {
                if options.skip_duplicates
                    && store
                        .get_reading(&reading.id)
                        .context("Failed duplicate check")?
                        .is_some()
                {
                    skipped += 1;
                    continue;
                }
                to_insert.push(reading.clone());
            }

            let imported = store
                .add_readings(&to_insert)
                .context("Failed to import readings")?;
            (imported, skipped)
        };

        let mut favorites_restored = 0usize;
        if options.import_favorites {
            for reading in bundle.readings.iter().filter(|r| r.is_favorite) {
                match self.favorites.add_favorite(&reading.id).await {
                    Ok(()) => favorites_restored += 1,
                    Err(e) => warn!(reading_id = %reading.id, error = %e, "failed to restore favorite"),
                }
            }
            if let Some(collections) = bundle.favorites {
                self.favorites.restore_collections(collections);
            }
        }

        info!(imported, skipped, favorites_restored, "import complete");
        Ok(ImportReport {
            imported,
            skipped,
            favorites_restored,
        })
    }

    // ==================== Backups ====================

    /// Create a named backup of the full catalog
    ///
    /// Returns the metadata for the new backup. Exceeding `MAX_BACKUPS`
    /// evicts the oldest backup by creation time.
    pub async fn create_backup(&self, name: &str) -> Result<BackupMetadata> {
        let bundle = self.export_bundle(DataType::Full).await?;
        let reading_count = bundle.readings.len();

        let id = content_hash(&bundle)?;
        let payload =
            serde_json::to_string_pretty(&bundle).context("Failed to serialize export")?;

        fs::create_dir_all(&self.backups_dir).with_context(|| {
            format!("Failed to create backups directory {}", self.backups_dir.display())
        })?;
        let path = self.payload_path(&id);
        fs::write(&path, &payload)
            .with_context(|| format!("Failed to write backup {}", path.display()))?;

        let metadata = BackupMetadata {
            id: id.clone(),
            name: name.to_string(),
            created_at: now_millis(),
            size_bytes: payload.len() as u64,
            reading_count,
        };

        let evicted = {
            let mut index = self.index.lock().unwrap();
            // Same content hashes to the same id: refresh instead of duplicating
            index.retain(|b| b.id != id);
            index.push(metadata.clone());
            index.sort_by_key(|b| b.created_at);

            let mut evicted = Vec::new();
            while index.len() > MAX_BACKUPS {
                evicted.push(index.remove(0));
            }
            self.persist_index(&index)?;
            evicted
        };

        for old in evicted {
            info!(backup_id = %old.id, name = %old.name, "evicting oldest backup");
            if let Err(e) = fs::remove_file(self.payload_path(&old.id)) {
                warn!(backup_id = %old.id, error = %e, "failed to remove evicted backup file");
            }
        }

        Ok(metadata)
    }

    /// All backups, oldest first
    pub fn list_backups(&self) -> Vec<BackupMetadata> {
        self.index.lock().unwrap().clone()
    }

    /// Delete a backup and its payload
    pub fn delete_backup(&self, id: &str) -> Result<()> {
        let mut index = self.index.lock().unwrap();
        let before = index.len();
        index.retain(|b| b.id != id);
        if index.len() == before {
            bail!("Backup not found: '{}'", id);
        }
        self.persist_index(&index)?;
        drop(index);

        fs::remove_file(self.payload_path(id))
            .with_context(|| format!("Failed to remove backup payload '{}'", id))?;
        Ok(())
    }

    /// Restore a backup, replacing the current catalog
    pub async fn restore_backup(&self, id: &str) -> Result<ImportReport> {
        if !self.index.lock().unwrap().iter().any(|b| b.id == id) {
            bail!("Backup not found: '{}'", id);
        }

        let path = self.payload_path(id);
        let payload = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read backup {}", path.display()))?;

        self.import_from_json(
            &payload,
            ImportOptions {
                overwrite: true,
                skip_duplicates: false,
                import_favorites: true,
            },
        )
        .await
    }

    fn payload_path(&self, id: &str) -> PathBuf {
        self.backups_dir.join(format!("{}.json", id))
    }

    fn persist_index(&self, index: &[BackupMetadata]) -> Result<()> {
        fs::create_dir_all(&self.backups_dir).with_context(|| {
            format!("Failed to create backups directory {}", self.backups_dir.display())
        })?;
        let json = serde_json::to_string_pretty(index).context("Failed to serialize backup index")?;
        fs::write(self.backups_dir.join(INDEX_FILE), json).context("Failed to write backup index")?;
        Ok(())
    }
}

/// Identity hash over the catalog content, skipping the export timestamp
/// so backing up an unchanged catalog yields the same id.
fn content_hash(bundle: &ExportBundle) -> Result<String> {
    let canonical = serde_json::to_vec(&(&bundle.readings, &bundle.favorites, &bundle.stats))
        .context("Failed to serialize backup content")?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

fn build_metadata(readings: &[Reading], stats: &ContentStats) -> ExportMetadata {
    let mut reading_types: Vec<String> = readings
        .iter()
        .map(|r| r.reading_type.as_str().to_string())
        .collect();
    reading_types.sort();
    reading_types.dedup();

    let date_range = match (&stats.earliest_date, &stats.latest_date) {
        (Some(from), Some(to)) => Some((from.clone(), to.clone())),
        _ => None,
    };

    ExportMetadata {
        total_readings: stats.total_readings as usize,
        total_favorites: stats.total_favorites as usize,
        reading_types,
        languages: stats.languages.clone(),
        date_range,
    }
}

/// Reject payloads that do not look like an export bundle
fn validate_bundle_shape(value: &serde_json::Value) -> Result<()> {
    let obj = value
        .as_object()
        .context("Import payload must be a JSON object")?;

    for field in ["version", "exportDate", "format"] {
        if !obj.get(field).map(|v| v.is_string()).unwrap_or(false) {
            bail!("Import payload is missing string field '{}'", field);
        }
    }
    if !obj.get("readings").map(|v| v.is_array()).unwrap_or(false) {
        bail!("Import payload is missing array field 'readings'");
    }
    if !obj.get("metadata").map(|v| v.is_object()).unwrap_or(false) {
        bail!("Import payload is missing object field 'metadata'");
    }
    Ok(())
}

fn load_index(backups_dir: &PathBuf) -> Vec<BackupMetadata> {
    let path = backups_dir.join(INDEX_FILE);
    match fs::read_to_string(&path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "backup index is corrupt, starting empty");
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    }
}
