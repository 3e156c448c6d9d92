//! Zone provisioner
//!
//! The ZoneProvisioner is responsible for:
//! - Turning the requested DNS name into a zone request
//! - Activating the DNS service before the zone is requested
//! - Creating, importing, reading and deleting managed zones via ZoneProvider
//! - Publishing zone exports to the ExportStore
//!
//! ## Flow
//!
//! ```text
//! ZoneInputs ──▶ validate + normalize ──▶ derive resource name
//!                                                 │
//!                                                 ▼
//!                          enable_service ──▶ (poll until Ready)
//!                                                 │
//!                                                 ▼
//!                                           create_zone
//!                                                 │
//!                                                 ▼
//!                                   ExportStore::set_exports
//! ```
//!
//! Every step runs only after the previous one succeeded. The first error
//! aborts the run; nothing is retried and nothing is rolled back.

use crate::config::{ActivationConfig, ProvisionConfig, ZoneInputs};
use crate::error::{Error, Result};
use crate::naming::{derive_zone_resource_name, normalize_dns_name, validate_dns_name};
use crate::traits::{ExportStore, ServiceActivation, ZoneExports, ZoneProvider, ZoneSpec};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Events emitted by the ZoneProvisioner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionEvent {
    /// Service activation requested
    ActivationRequested { service: String },

    /// Activation accepted, waiting for the provider to finish
    ActivationPending { service: String, operation: String },

    /// Service is active
    ActivationReady { service: String },

    /// Zone creation requested
    ZoneRequested {
        resource_name: String,
        dns_name: String,
    },

    /// Zone created by the provider
    ZoneCreated {
        resource_name: String,
        nameservers: Vec<String>,
    },

    /// Exports published
    Exported { zone_id: String },

    /// Zone deleted (or already absent)
    ZoneDeleted { resource_name: String },

    /// The run failed
    Failed { error: String },
}

/// Provisions one managed zone per call
///
/// ## Lifecycle
///
/// 1. Create with [`ZoneProvisioner::new()`]
/// 2. Call [`provision()`](ZoneProvisioner::provision),
///    [`destroy()`](ZoneProvisioner::destroy) or one of the read operations
/// 3. Drop
pub struct ZoneProvisioner {
    /// Provider for service activation and zone requests
    provider: Box<dyn ZoneProvider>,

    /// Where exports are published
    exports: Box<dyn ExportStore>,

    /// Activation settings
    activation: ActivationConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ProvisionEvent>,
}

impl ZoneProvisioner {
    /// Create a new provisioner
    ///
    /// # Returns
    ///
    /// A tuple of (provisioner, event_receiver) where event_receiver yields
    /// provisioning events
    pub fn new(
        provider: Box<dyn ZoneProvider>,
        exports: Box<dyn ExportStore>,
        config: &ProvisionConfig,
    ) -> Result<(Self, mpsc::Receiver<ProvisionEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.activation.event_channel_capacity);

        let provisioner = Self {
            provider,
            exports,
            activation: config.activation.clone(),
            event_tx: tx,
        };

        Ok((provisioner, rx))
    }

    /// Build the zone request for the given inputs without contacting the provider
    ///
    /// The DNS name is validated and given a trailing dot if it lacks one,
    /// then the resource name is derived from it.
    pub fn zone_spec(inputs: &ZoneInputs) -> Result<ZoneSpec> {
        validate_dns_name(&inputs.name)?;

        let dns_name = normalize_dns_name(&inputs.name);
        if dns_name != inputs.name {
            warn!(
                "Zone name '{}' has no trailing dot, using '{}'",
                inputs.name, dns_name
            );
        }

        let resource_name = derive_zone_resource_name(&dns_name);
        Ok(ZoneSpec::new(resource_name, dns_name))
    }

    /// Provision the managed zone described by `inputs`
    ///
    /// Validates the inputs, activates the DNS service, creates the zone and
    /// publishes its exports.
    ///
    /// # Errors
    ///
    /// - `ConfigurationMissing` / `InvalidInput`: bad inputs, no provider call made
    /// - `ProviderRequestFailed`: activation or zone creation was rejected
    pub async fn provision(&self, inputs: &ZoneInputs) -> Result<ZoneExports> {
        match self.provision_inner(inputs).await {
            Ok(exports) => Ok(exports),
            Err(e) => {
                error!("Provisioning failed: {}", e);
                self.emit_event(ProvisionEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn provision_inner(&self, inputs: &ZoneInputs) -> Result<ZoneExports> {
        let spec = Self::zone_spec(inputs)?;

        info!(
            "Provisioning zone {} ({}) with provider {}",
            spec.resource_name,
            spec.dns_name,
            self.provider.provider_name()
        );

        self.activate().await?;

        self.emit_event(ProvisionEvent::ZoneRequested {
            resource_name: spec.resource_name.clone(),
            dns_name: spec.dns_name.clone(),
        });

        let zone = self
            .provider
            .create_zone(&spec)
            .await
            .map_err(|e| self.provider_error(e))?;

        info!(
            "Created zone {} with {} nameserver(s)",
            zone.resource_name,
            zone.nameservers.len()
        );
        self.emit_event(ProvisionEvent::ZoneCreated {
            resource_name: zone.resource_name.clone(),
            nameservers: zone.nameservers.clone(),
        });

        self.publish(zone.into()).await
    }

    /// Delete the managed zone described by `inputs`
    ///
    /// The service activation is left in place. A zone that no longer exists
    /// counts as deleted.
    ///
    /// # Returns
    ///
    /// The resource name of the deleted zone
    pub async fn destroy(&self, inputs: &ZoneInputs) -> Result<String> {
        let spec = Self::zone_spec(inputs)?;

        info!("Deleting zone {}", spec.resource_name);

        match self.provider.delete_zone(&spec.resource_name).await {
            Ok(()) => info!("Deleted zone {}", spec.resource_name),
            Err(e) if e.is_not_found() => {
                info!("Zone {} does not exist, nothing to delete", spec.resource_name)
            }
            Err(e) => {
                let e = self.provider_error(e);
                error!("Failed to delete zone {}: {}", spec.resource_name, e);
                self.emit_event(ProvisionEvent::Failed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        }

        self.exports.delete_exports(&spec.resource_name).await?;
        self.exports.flush().await?;

        self.emit_event(ProvisionEvent::ZoneDeleted {
            resource_name: spec.resource_name.clone(),
        });
        Ok(spec.resource_name)
    }

    /// Adopt an existing zone and publish its exports
    ///
    /// `resource_id` may be the zone resource name or the provider id.
    pub async fn import(&self, resource_id: &str) -> Result<ZoneExports> {
        if resource_id.trim().is_empty() {
            return Err(Error::missing("zone id to import"));
        }

        let zone = self
            .provider
            .get_zone(resource_id)
            .await
            .map_err(|e| self.provider_error(e))?;

        info!("Importing zone {} ({})", zone.resource_name, zone.dns_name);
        self.publish(zone.into()).await
    }

    /// Read the exports of a zone from the provider
    ///
    /// Returns `Ok(None)` when the zone does not exist.
    pub async fn get(&self, resource_id: &str) -> Result<Option<ZoneExports>> {
        match self.provider.get_zone(resource_id).await {
            Ok(zone) => Ok(Some(zone.into())),
            Err(e) if e.is_not_found() => {
                debug!("Zone {} not found", resource_id);
                Ok(None)
            }
            Err(e) => Err(self.provider_error(e)),
        }
    }

    /// List the exports of every zone in the project
    pub async fn list(&self) -> Result<Vec<ZoneExports>> {
        let zones = self
            .provider
            .list_zones()
            .await
            .map_err(|e| self.provider_error(e))?;

        debug!("Provider returned {} zone(s)", zones.len());
        Ok(zones.into_iter().map(ZoneExports::from).collect())
    }

    /// Verify the provider accepts the configured credentials
    pub async fn check_credentials(&self) -> Result<()> {
        let accepted = self
            .provider
            .check_credentials()
            .await
            .map_err(|e| self.provider_error(e))?;

        if accepted {
            info!("Credentials accepted by {}", self.provider.provider_name());
            Ok(())
        } else {
            Err(Error::auth(format!(
                "credentials rejected by {}",
                self.provider.provider_name()
            )))
        }
    }

    /// Activate the configured service and wait until it is ready
    async fn activate(&self) -> Result<()> {
        let service = self.activation.service.as_str();

        info!("Requesting activation of {}", service);
        self.emit_event(ProvisionEvent::ActivationRequested {
            service: service.to_string(),
        });

        let mut state = self
            .provider
            .enable_service(service)
            .await
            .map_err(|e| self.provider_error(e))?;

        // A timeout beyond what the clock can represent means no deadline
        let deadline = tokio::time::Instant::now().checked_add(self.activation.timeout());

        while let ServiceActivation::Pending { operation } = state {
            if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                return Err(Error::provider(
                    self.provider.provider_name(),
                    format!(
                        "Timed out after {}s waiting for {} activation (operation {})",
                        self.activation.timeout_secs, service, operation
                    ),
                ));
            }

            debug!("Activation of {} pending: {}", service, operation);
            self.emit_event(ProvisionEvent::ActivationPending {
                service: service.to_string(),
                operation: operation.clone(),
            });

            tokio::time::sleep(self.activation.poll_interval()).await;

            state = self
                .provider
                .activation_status(&operation)
                .await
                .map_err(|e| self.provider_error(e))?;
        }

        info!("Service {} is active", service);
        self.emit_event(ProvisionEvent::ActivationReady {
            service: service.to_string(),
        });
        Ok(())
    }

    async fn publish(&self, exports: ZoneExports) -> Result<ZoneExports> {
        self.exports.set_exports(&exports).await?;
        self.exports.flush().await?;

        debug!("Exported id={} name={}", exports.id, exports.name);
        self.emit_event(ProvisionEvent::Exported {
            zone_id: exports.id.clone(),
        });
        Ok(exports)
    }

    /// Wrap a provider error, keeping its message verbatim
    fn provider_error(&self, err: Error) -> Error {
        match err {
            e @ Error::ProviderRequestFailed { .. } => e,
            e => Error::provider(self.provider.provider_name(), e.to_string()),
        }
    }

    fn emit_event(&self, event: ProvisionEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_spec_fully_qualified() {
        let spec = ZoneProvisioner::zone_spec(&ZoneInputs::new("example.com.")).unwrap();
        assert_eq!(spec.resource_name, "example-com");
        assert_eq!(spec.dns_name, "example.com.");
    }

    #[test]
    fn test_zone_spec_adds_trailing_dot() {
        let spec = ZoneProvisioner::zone_spec(&ZoneInputs::new("example.com")).unwrap();
        assert_eq!(spec.resource_name, "example-com");
        assert_eq!(spec.dns_name, "example.com.");
    }

    #[test]
    fn test_zone_spec_rejects_blank() {
        let err = ZoneProvisioner::zone_spec(&ZoneInputs::new("")).unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }
}
