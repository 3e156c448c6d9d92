// # Export Store Trait
//
// Defines where provisioning outputs are published for downstream
// consumption.
//
// ## Purpose
//
// Every successful run exports three values for its zone:
// - `id`: the zone resource name
// - `name`: the zone DNS name
// - `nameservers`: the provider-assigned nameservers
//
// Stores keep the latest exports per zone id so other tools (or a later
// `destroy`) can read them back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::traits::zone_provider::ManagedZone;

/// Outputs published for a managed zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneExports {
    /// Zone resource name
    pub id: String,
    /// Zone DNS name
    pub name: String,
    /// Provider-assigned nameservers
    pub nameservers: Vec<String>,
}

impl From<ManagedZone> for ZoneExports {
    fn from(zone: ManagedZone) -> Self {
        Self {
            id: zone.resource_name,
            name: zone.dns_name,
            nameservers: zone.nameservers,
        }
    }
}

/// A stored export entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// The exported values
    pub exports: ZoneExports,
    /// When the values were exported
    pub exported_at: chrono::DateTime<chrono::Utc>,
}

impl ExportRecord {
    /// Stamp exports with the current time
    pub fn new(exports: ZoneExports) -> Self {
        Self {
            exports,
            exported_at: chrono::Utc::now(),
        }
    }
}

/// Trait for export store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait ExportStore: Send + Sync {
    /// Get the stored record for a zone id
    async fn get_exports(&self, zone_id: &str) -> Result<Option<ExportRecord>, crate::Error>;

    /// Publish exports, replacing any earlier record for the same zone id
    async fn set_exports(&self, exports: &ZoneExports) -> Result<(), crate::Error>;

    /// Remove the record for a zone id (no-op if absent)
    async fn delete_exports(&self, zone_id: &str) -> Result<(), crate::Error>;

    /// List all zone ids in the store
    async fn list_exports(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing export stores from configuration
///
/// Construction is async because file-backed stores load existing exports.
#[async_trait]
pub trait ExportStoreFactory: Send + Sync {
    /// Create an ExportStore from store-specific settings
    async fn create(&self, config: &serde_json::Value) -> Result<Box<dyn ExportStore>, crate::Error>;
}
