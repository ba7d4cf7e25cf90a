//! Composition root
//!
//! Builds every service as an explicit instance, wires dependencies by
//! hand, and hands the ordered list to the lifecycle supervisor. Nothing
//! in the core crate knows about this wiring.

use std::sync::Arc;

use anyhow::{Context, Result};

use lectio_core::sync::{AlwaysOnline, InMemoryCloud};
use lectio_core::{
    into_shared, Config, ContentService, ExportImportService, FavoritesService, IntegrationService,
    ManagedService, ReadingStore, SearchService, SharedStore, SyncToCloudService, ValidationService,
};

/// All wired services, ready for command dispatch
pub struct Engine {
    pub config: Config,
    pub store: SharedStore,
    pub content: Arc<ContentService>,
    pub search: Arc<SearchService>,
    pub favorites: Arc<FavoritesService>,
    pub validation: Arc<ValidationService>,
    pub export: Arc<ExportImportService>,
    pub sync: Arc<SyncToCloudService>,
    pub integration: IntegrationService,
}

impl Engine {
    /// Open the store and wire every service
    pub fn bootstrap(config: Config) -> Result<Self> {
        let store = into_shared(ReadingStore::open(&config).context("Failed to open database")?);

        let content = Arc::new(ContentService::new(store.clone()));
        let favorites = Arc::new(FavoritesService::new(store.clone()));
        let search = Arc::new(SearchService::new(content.clone(), store.clone()));
        let validation = Arc::new(ValidationService::new());
        let export = Arc::new(ExportImportService::new(
            store.clone(),
            favorites.clone(),
            config.backups_dir(),
        ));
        // The remote endpoint is a local stub until a real backend lands
        let sync = Arc::new(SyncToCloudService::new(
            store.clone(),
            Arc::new(InMemoryCloud::new()),
            Arc::new(AlwaysOnline),
        ));

        let services: Vec<Arc<dyn ManagedService>> = vec![
            content.clone(),
            favorites.clone(),
            search.clone(),
            export.clone(),
            sync.clone(),
            validation.clone(),
        ];
        let integration =
            IntegrationService::new(services, store.clone(), validation.clone(), sync.clone());

        Ok(Self {
            config,
            store,
            content,
            search,
            favorites,
            validation,
            export,
            sync,
            integration,
        })
    }

    /// Initialize all services; returns names of any that failed
    pub async fn start(&self) -> Vec<String> {
        let failures = self.integration.initialize().await;
        if self.config.sync_enabled {
            self.sync.start_auto_sync(self.config.sync_interval());
        }
        failures
    }

    /// Shut everything down in reverse order
    pub async fn stop(&self) {
        self.integration.shutdown().await;
    }
}
