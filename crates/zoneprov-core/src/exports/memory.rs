// # Memory Export Store
//
// In-memory implementation of ExportStore.
//
// Exports live only as long as the process. The binary still prints them,
// so this is the default when no exports file is configured.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::export_store::{ExportRecord, ExportStore, ExportStoreFactory, ZoneExports};

/// In-memory export store
///
/// # Example
///
/// ```rust,no_run
/// use zoneprov_core::exports::MemoryExportStore;
/// use zoneprov_core::traits::{ExportStore, ZoneExports};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryExportStore::new();
///
///     store
///         .set_exports(&ZoneExports {
///             id: "example-com".into(),
///             name: "example.com.".into(),
///             nameservers: vec!["ns-cloud-a1.googledomains.com.".into()],
///         })
///         .await?;
///
///     assert!(store.get_exports("example-com").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryExportStore {
    inner: Arc<RwLock<HashMap<String, ExportRecord>>>,
}

impl MemoryExportStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl ExportStore for MemoryExportStore {
    async fn get_exports(&self, zone_id: &str) -> Result<Option<ExportRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(zone_id).cloned())
    }

    async fn set_exports(&self, exports: &ZoneExports) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(exports.id.clone(), ExportRecord::new(exports.clone()));
        Ok(())
    }

    async fn delete_exports(&self, zone_id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(zone_id);
        Ok(())
    }

    async fn list_exports(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Factory for in-memory export stores
pub struct MemoryExportStoreFactory;

#[async_trait]
impl ExportStoreFactory for MemoryExportStoreFactory {
    async fn create(&self, _config: &serde_json::Value) -> Result<Box<dyn ExportStore>, Error> {
        Ok(Box::new(MemoryExportStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exports(id: &str, name: &str) -> ZoneExports {
        ZoneExports {
            id: id.to_string(),
            name: name.to_string(),
            nameservers: vec!["ns-cloud-a1.googledomains.com.".to_string()],
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryExportStore::new();
        assert!(store.is_empty().await);

        store
            .set_exports(&exports("example-com", "example.com."))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        let record = store.get_exports("example-com").await.unwrap().unwrap();
        assert_eq!(record.exports.name, "example.com.");

        store.delete_exports("example-com").await.unwrap();
        assert!(store.is_empty().await);

        // Deleting again is a no-op
        store.delete_exports("example-com").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_replaces_by_id() {
        let store = MemoryExportStore::new();
        store.set_exports(&exports("a-com", "a.com.")).await.unwrap();
        store.set_exports(&exports("b-com", "b.com.")).await.unwrap();

        let mut replacement = exports("a-com", "a.com.");
        replacement.nameservers.push("ns-cloud-a2.googledomains.com.".into());
        store.set_exports(&replacement).await.unwrap();

        let mut ids = store.list_exports().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a-com".to_string(), "b-com".to_string()]);

        let record = store.get_exports("a-com").await.unwrap().unwrap();
        assert_eq!(record.exports.nameservers.len(), 2);
    }
}
