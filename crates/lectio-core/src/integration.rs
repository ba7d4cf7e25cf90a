//! Lifecycle orchestration
//!
//! Services implement `ManagedService` explicitly; the orchestrator calls
//! the trait methods unconditionally on an injected, ordered list.
//! Initialization continues past individual failures and records a status
//! per service; shutdown walks the list in reverse and swallows errors.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::content::ContentService;
use crate::export::ExportImportService;
use crate::favorites::FavoritesService;
use crate::search::SearchService;
use crate::store::SharedStore;
use crate::sync::{SyncReport, SyncToCloudService};
use crate::validation::{BatchValidationReport, ValidationService};

/// A service participating in the managed lifecycle
#[async_trait]
pub trait ManagedService: Send + Sync {
    /// Stable service name for status reporting
    fn name(&self) -> &'static str;

    /// Bring the service up; failures are recorded, not fatal
    async fn initialize(&self) -> Result<()>;

    /// Release timers and in-flight work
    async fn shutdown(&self) -> Result<()>;
}

/// Recorded lifecycle state of one service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub name: String,
    pub ready: bool,
    pub last_error: Option<String>,
}

/// Derived health of the whole engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// No service is ready yet
    Initializing,
    /// Some services are ready, some are not
    Partial,
    /// Every service is ready but at least one carries an error
    Error,
    Ready,
}

/// Engine-wide status snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub overall: OverallStatus,
    pub services: Vec<ServiceStatus>,
}

/// Combined outcome of the validate-then-sync workflow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    pub validation: BatchValidationReport,
    pub sync: SyncReport,
    pub success: bool,
}

/// Supervisor over an ordered list of managed services
pub struct IntegrationService {
    services: Vec<Arc<dyn ManagedService>>,
    statuses: Mutex<Vec<ServiceStatus>>,
    store: SharedStore,
    validation: Arc<ValidationService>,
    sync: Arc<SyncToCloudService>,
}

impl IntegrationService {
    /// Build the supervisor over an explicit, ordered service list
    ///
    /// Initialization runs in list order; shutdown runs in reverse.
    pub fn new(
        services: Vec<Arc<dyn ManagedService>>,
        store: SharedStore,
        validation: Arc<ValidationService>,
        sync: Arc<SyncToCloudService>,
    ) -> Self {
        let statuses = services
            .iter()
            .map(|s| ServiceStatus {
                name: s.name().to_string(),
                ready: false,
                last_error: None,
            })
            .collect();
        Self {
            services,
            statuses: Mutex::new(statuses),
            store,
            validation,
            sync,
        }
    }

    /// Initialize every service in order, collecting failures
    ///
    /// Returns the names of services that failed to come up.
    pub async fn initialize(&self) -> Vec<String> {
        let mut failures = Vec::new();
        for (idx, service) in self.services.iter().enumerate() {
            let name = service.name();
            match service.initialize().await {
                Ok(()) => {
                    info!(service = name, "service initialized");
                    let mut statuses = self.statuses.lock().unwrap();
                    statuses[idx].ready = true;
                    statuses[idx].last_error = None;
                }
                Err(e) => {
                    error!(service = name, error = %e, "service failed to initialize");
                    let mut statuses = self.statuses.lock().unwrap();
                    statuses[idx].ready = false;
                    statuses[idx].last_error = Some(e.to_string());
                    failures.push(name.to_string());
                }
            }
        }
        failures
    }

    /// Shut down every service in reverse order, swallowing errors
    pub async fn shutdown(&self) {
        for (idx, service) in self.services.iter().enumerate().rev() {
            let name = service.name();
            if let Err(e) = service.shutdown().await {
                warn!(service = name, error = %e, "service failed to shut down");
            }
            let mut statuses = self.statuses.lock().unwrap();
            statuses[idx].ready = false;
        }
        info!("engine shut down");
    }

    /// Record a runtime error against a named service
    pub fn record_error(&self, service_name: &str, message: impl Into<String>) {
        let mut statuses = self.statuses.lock().unwrap();
        if let Some(status) = statuses.iter_mut().find(|s| s.name == service_name) {
            status.last_error = Some(message.into());
        }
    }

    /// Per-service statuses plus the derived overall status
    pub fn get_status(&self) -> EngineStatus {
        let services = self.statuses.lock().unwrap().clone();
        let ready_count = services.iter().filter(|s| s.ready).count();
        let any_error = services.iter().any(|s| s.last_error.is_some());

        let overall = if ready_count == 0 {
            OverallStatus::Initializing
        } else if ready_count < services.len() {
            OverallStatus::Partial
        } else if any_error {
            OverallStatus::Error
        } else {
            OverallStatus::Ready
        };

        EngineStatus { overall, services }
    }

    /// Validate the whole catalog, then sync it, as one operation
    pub async fn perform_complete_workflow(&self) -> Result<WorkflowReport> {
        let readings = self
            .store
            .lock()
            .await
            .all_readings()
            .context("Failed to load catalog for workflow")?;

        let validation = self.validation.validate_batch(&readings);
        let sync = self.sync.sync_now().await;
        let success = validation.invalid_count == 0 && sync.success;

        info!(
            validated = validation.total,
            invalid = validation.invalid_count,
            synced = sync.items_synced,
            "complete workflow finished"
        );
        Ok(WorkflowReport {
            validation,
            sync,
            success,
        })
    }
}

// ==================== ManagedService Implementations ====================

#[async_trait]
impl ManagedService for ContentService {
    fn name(&self) -> &'static str {
        "content"
    }

    async fn initialize(&self) -> Result<()> {
        // Touching stats proves the store is reachable
        self.get_stats().await.map(|_| ())
    }

    async fn shutdown(&self) -> Result<()> {
        self.clear_caches();
        Ok(())
    }
}

#[async_trait]
impl ManagedService for SearchService {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.cancel_pending();
        Ok(())
    }
}

#[async_trait]
impl ManagedService for FavoritesService {
    fn name(&self) -> &'static str {
        "favorites"
    }

    async fn initialize(&self) -> Result<()> {
        self.reload_default_collection().await
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ManagedService for ExportImportService {
    fn name(&self) -> &'static str {
        "export-import"
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ManagedService for SyncToCloudService {
    fn name(&self) -> &'static str {
        "sync"
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.stop_auto_sync();
        Ok(())
    }
}

#[async_trait]
impl ManagedService for ValidationService {
    fn name(&self) -> &'static str {
        "validation"
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
