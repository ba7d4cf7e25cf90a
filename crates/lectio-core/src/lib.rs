//! Lectio Core Library
//!
//! This crate provides the content library engine for Lectio, a local-first
//! reading practice application backed by SQLite.
//!
//! # Architecture
//!
//! - **ReadingStore**: single SQLite connection, source of truth
//! - **Services**: content, search, favorites, validation, export, sync —
//!   explicit instances wired by a composition root, supervised by
//!   `IntegrationService`
//!
//! Read paths go through a TTL cache (cache-aside); mutations write
//! through to the store and invalidate favorites-scoped cache entries.
//!
//! # Quick Start
//!
//! ```text
//! let store = into_shared(ReadingStore::open(&config)?);
//! let content = Arc::new(ContentService::new(store.clone()));
//!
//! let reading = Reading::new("2026-01-04", "Prologue", "In the beginning...", ReadingType::Gospel);
//! store.lock().await.add_reading(&reading)?;
//!
//! let today = content.get_readings_for_date("2026-01-04").await;
//! ```
//!
//! # Modules
//!
//! - `store`: SQLite persistence (main entry point)
//! - `models`: readings, filters, collections, statistics
//! - `cache`: generic TTL cache-aside helper
//! - `content`: date reads, search, popular, recommendations
//! - `search`: debounced search, history, suggestions, analytics
//! - `favorites`: favorite membership and named collections
//! - `validation`: field, batch, and integrity validation
//! - `export`: JSON/CSV export, import, content-addressed backups
//! - `sync`: cloud push sync with conflict detection
//! - `integration`: lifecycle supervision and composite workflows
//! - `config`: application configuration

pub mod cache;
pub mod config;
pub mod content;
pub mod export;
pub mod favorites;
pub mod integration;
pub mod models;
pub mod search;
pub mod store;
pub mod sync;
pub mod validation;

pub use cache::TtlCache;
pub use config::Config;
pub use content::{ContentService, RankingStrategy, ScoredReading, SearchResults, StratifiedSampler};
pub use export::{DataType, ExportImportService, ImportOptions, ImportReport};
pub use favorites::{FavoritesService, FavoritesStatistics};
pub use integration::{IntegrationService, ManagedService, OverallStatus, ServiceStatus};
pub use models::{ContentStats, FavoritesCollection, Reading, ReadingType, SearchFilters, SearchRecord};
pub use search::{SearchAnalytics, SearchService};
pub use store::{into_shared, ReadingStore, SharedStore, StoreError};
pub use sync::{
    CloudEndpoint, NetworkMonitor, ResolutionPolicy, SyncConflict, SyncReport, SyncStatus,
    SyncToCloudService,
};
pub use validation::{IntegrityIssue, IntegrityReport, ValidationReport, ValidationService};
