//! Remote sync collaborators
//!
//! The engine talks to the outside world through two seams: a network
//! status provider and a cloud endpoint. Production wiring supplies real
//! implementations; the in-memory endpoint here backs tests and offline
//! development, including injectable per-id failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::Reading;

/// Network status provider
pub trait NetworkMonitor: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Monitor that always reports online
#[derive(Debug, Default)]
pub struct AlwaysOnline;

impl NetworkMonitor for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Monitor whose status can be flipped at runtime
#[derive(Debug)]
pub struct ToggleMonitor {
    online: AtomicBool,
}

impl ToggleMonitor {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl NetworkMonitor for ToggleMonitor {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Remote storage for the catalog
#[async_trait]
pub trait CloudEndpoint: Send + Sync {
    /// Upload or overwrite a reading
    async fn push(&self, reading: &Reading) -> Result<()>;

    /// Fetch the cloud copy of a reading, if any
    async fn fetch(&self, id: &str) -> Result<Option<Reading>>;

    /// Delete a reading remotely
    async fn delete(&self, id: &str) -> Result<()>;

    /// List every remote reading
    async fn list(&self) -> Result<Vec<Reading>>;
}

/// In-memory cloud endpoint for tests and offline development
#[derive(Default)]
pub struct InMemoryCloud {
    records: Mutex<HashMap<String, Reading>>,
    failing_ids: Mutex<HashSet<String>>,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cloud-side record directly
    pub fn seed(&self, reading: Reading) {
        self.records
            .lock()
            .unwrap()
            .insert(reading.id.clone(), reading);
    }

    /// Make operations on the given id fail until cleared
    pub fn fail_id(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    /// Clear all injected failures
    pub fn clear_failures(&self) {
        self.failing_ids.lock().unwrap().clear();
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, id: &str) -> Result<()> {
        if self.failing_ids.lock().unwrap().contains(id) {
            bail!("Cloud rejected operation on '{}'", id);
        }
        Ok(())
    }
}

#[async_trait]
impl CloudEndpoint for InMemoryCloud {
    async fn push(&self, reading: &Reading) -> Result<()> {
        self.check(&reading.id)?;
        self.records
            .lock()
            .unwrap()
            .insert(reading.id.clone(), reading.clone());
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<Reading>> {
        self.check(id)?;
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check(id)?;
        self.records.lock().unwrap().remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Reading>> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReadingType;

    #[tokio::test]
    async fn test_in_memory_cloud_round_trip() {
        let cloud = InMemoryCloud::new();
        let reading = Reading::with_id("r1", "2026-01-04", "Title", "body", ReadingType::Gospel);

        cloud.push(&reading).await.unwrap();
        assert_eq!(cloud.fetch("r1").await.unwrap().unwrap().id, "r1");
        assert_eq!(cloud.list().await.unwrap().len(), 1);

        cloud.delete("r1").await.unwrap();
        assert!(cloud.fetch("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let cloud = InMemoryCloud::new();
        let reading = Reading::with_id("r1", "2026-01-04", "Title", "body", ReadingType::Gospel);

        cloud.fail_id("r1");
        assert!(cloud.push(&reading).await.is_err());
        assert!(cloud.fetch("r1").await.is_err());

        cloud.clear_failures();
        assert!(cloud.push(&reading).await.is_ok());
    }

    #[test]
    fn test_toggle_monitor() {
        let monitor = ToggleMonitor::new(true);
        assert!(monitor.is_online());
        monitor.set_online(false);
        assert!(!monitor.is_online());
    }
}
