// # Zone Provider Trait
//
// Defines the interface for activating cloud services and managing DNS
// managed zones via provider APIs.
//
// ## Implementations
//
// - Google Cloud: `zoneprov-provider-gcp` crate
//
// ## Usage
//
// ```rust,ignore
// use zoneprov_core::traits::{ZoneProvider, ZoneSpec};
//
// let provider = /* ZoneProvider implementation */;
//
// provider.enable_service("dns.googleapis.com").await?;
// let zone = provider
//     .create_zone(&ZoneSpec::new("example-com", "example.com."))
//     .await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// State of a service activation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceActivation {
    /// The service is active; dependent resources may be created
    Ready,
    /// Activation was accepted but has not finished yet
    Pending {
        /// Provider-specific handle to poll with [`ZoneProvider::activation_status`]
        operation: String,
    },
}

/// Request for a new managed zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Provider resource name (e.g. `example-com`)
    pub resource_name: String,
    /// DNS name served by the zone (e.g. `example.com.`)
    pub dns_name: String,
    /// Human-readable description
    pub description: String,
}

impl ZoneSpec {
    /// Create a zone request with the default description
    pub fn new(resource_name: impl Into<String>, dns_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            dns_name: dns_name.into(),
            description: "Managed by zoneprov".to_string(),
        }
    }
}

/// A managed zone as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedZone {
    /// Provider resource name
    pub resource_name: String,
    /// DNS name served by the zone
    pub dns_name: String,
    /// Provider-assigned nameservers
    pub nameservers: Vec<String>,
    /// Provider-internal numeric or opaque id, if any
    pub id: Option<String>,
}

/// Trait for zone provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Single-shot
///
/// Each method performs the API call(s) for one request and returns the
/// outcome. Providers do not retry, back off, sleep or spawn tasks. Waiting
/// for a pending activation is owned by `ZoneProvisioner`, which polls
/// [`activation_status`](ZoneProvider::activation_status).
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Request activation of a service for the configured project
    ///
    /// Activating a service that is already active must succeed.
    async fn enable_service(&self, service: &str) -> Result<ServiceActivation, crate::Error>;

    /// Check the state of a pending activation
    async fn activation_status(&self, operation: &str)
    -> Result<ServiceActivation, crate::Error>;

    /// Create a managed zone
    ///
    /// # Returns
    ///
    /// - `Ok(ManagedZone)`: The created zone, including assigned nameservers
    /// - `Err(Error)`: If the provider rejected the request (name collision,
    ///   invalid characters, permission denied, ...)
    async fn create_zone(&self, spec: &ZoneSpec) -> Result<ManagedZone, crate::Error>;

    /// Get a managed zone by resource name or provider id
    ///
    /// Returns `Error::NotFound` when the zone does not exist.
    async fn get_zone(&self, zone: &str) -> Result<ManagedZone, crate::Error>;

    /// List all managed zones in the project
    async fn list_zones(&self) -> Result<Vec<ManagedZone>, crate::Error>;

    /// Delete a managed zone
    ///
    /// Returns `Error::NotFound` when the zone does not exist.
    async fn delete_zone(&self, zone: &str) -> Result<(), crate::Error>;

    /// Check that the configured credentials are accepted
    async fn check_credentials(&self) -> Result<bool, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone providers from configuration
pub trait ZoneProviderFactory: Send + Sync {
    /// Create a ZoneProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneProvider>, crate::Error>;
}
