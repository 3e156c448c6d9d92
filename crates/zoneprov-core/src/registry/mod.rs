//! Plugin-based provider registry
//!
//! The registry allows zone providers and export stores to be registered
//! at runtime, so the binary never hard-codes provider construction.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zoneprov_core::registry::ProviderRegistry;
//! use zoneprov_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::with_builtin_stores();
//! zoneprov_provider_gcp::register(&registry);
//!
//! let provider = registry.create_provider(&ProviderConfig::gcp("my-project", None))?;
//! ```

use crate::config::{ExportStoreConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::exports::{FileExportStoreFactory, MemoryExportStoreFactory};
use crate::traits::{ExportStore, ExportStoreFactory, ZoneProvider, ZoneProviderFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of provider and export store factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn ZoneProviderFactory>>>,
    export_stores: RwLock<HashMap<String, Arc<dyn ExportStoreFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` export stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_export_store("memory", Box::new(MemoryExportStoreFactory));
        registry.register_export_store("file", Box::new(FileExportStoreFactory));
        registry
    }

    /// Register a zone provider factory under a type name (e.g. "gcp")
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ZoneProviderFactory>) {
        let name = name.into();
        tracing::debug!("Registering zone provider: {}", name);
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name, factory);
    }

    /// Register an export store factory under a type name (e.g. "file")
    pub fn register_export_store(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ExportStoreFactory>,
    ) {
        let name = name.into();
        tracing::debug!("Registering export store: {}", name);
        let mut stores = self
            .export_stores
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stores.insert(name, Arc::from(factory));
    }

    /// Create a zone provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneProvider>)`: Created provider instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create an export store from configuration
    pub async fn create_export_store(
        &self,
        config: &ExportStoreConfig,
    ) -> Result<Box<dyn ExportStore>> {
        let store_type = config.type_name();

        // Clone the Arc so the lock is not held across the await
        let factory = {
            let stores = self
                .export_stores
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            stores
                .get(store_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown export store type: {}", store_type)))?
        };

        factory.create(&config.settings()).await
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(name)
    }

    /// Get a sorted list of registered provider types
    pub fn provider_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ManagedZone, ServiceActivation, ZoneSpec};
    use async_trait::async_trait;

    struct NullProvider;

    #[async_trait]
    impl ZoneProvider for NullProvider {
        async fn enable_service(&self, _service: &str) -> Result<ServiceActivation> {
            Ok(ServiceActivation::Ready)
        }

        async fn activation_status(&self, _operation: &str) -> Result<ServiceActivation> {
            Ok(ServiceActivation::Ready)
        }

        async fn create_zone(&self, spec: &ZoneSpec) -> Result<ManagedZone> {
            Ok(ManagedZone {
                resource_name: spec.resource_name.clone(),
                dns_name: spec.dns_name.clone(),
                nameservers: Vec::new(),
                id: None,
            })
        }

        async fn get_zone(&self, zone: &str) -> Result<ManagedZone> {
            Err(Error::not_found(zone))
        }

        async fn list_zones(&self) -> Result<Vec<ManagedZone>> {
            Ok(Vec::new())
        }

        async fn delete_zone(&self, _zone: &str) -> Result<()> {
            Ok(())
        }

        async fn check_credentials(&self) -> Result<bool> {
            Ok(true)
        }

        fn provider_name(&self) -> &'static str {
            "null"
        }
    }

    struct NullFactory;

    impl ZoneProviderFactory for NullFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
            Ok(Box::new(NullProvider))
        }
    }

    fn custom_config(factory: &str) -> ProviderConfig {
        ProviderConfig::Custom {
            factory: factory.to_string(),
            config: serde_json::json!({}),
        }
    }

    #[test]
    fn test_registry_creates_registered_provider() {
        let registry = ProviderRegistry::new();
        registry.register_provider("null", Box::new(NullFactory));

        assert!(registry.has_provider("null"));
        assert_eq!(registry.provider_types(), vec!["null".to_string()]);

        let provider = registry.create_provider(&custom_config("null")).unwrap();
        assert_eq!(provider.provider_name(), "null");
    }

    #[test]
    fn test_registry_unknown_provider() {
        let registry = ProviderRegistry::new();
        let err = registry
            .create_provider(&ProviderConfig::gcp("p", None))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_builtin_export_stores() {
        let registry = ProviderRegistry::with_builtin_stores();
        let store = registry
            .create_export_store(&ExportStoreConfig::Memory)
            .await
            .unwrap();
        assert!(store.list_exports().await.unwrap().is_empty());

        let missing = registry
            .create_export_store(&ExportStoreConfig::Custom {
                factory: "redis".into(),
                config: serde_json::Value::Null,
            })
            .await;
        assert!(missing.is_err());
    }
}
