//! Test doubles and common utilities for provisioning contract tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use zoneprov_core::config::{ActivationConfig, ProviderConfig, ProvisionConfig};
use zoneprov_core::error::{Error, Result};
use zoneprov_core::provisioner::ProvisionEvent;
use zoneprov_core::traits::{ManagedZone, ServiceActivation, ZoneProvider, ZoneSpec};

/// Nameservers handed out by the mock provider
pub const MOCK_NAMESERVERS: [&str; 2] = [
    "ns-cloud-a1.googledomains.com.",
    "ns-cloud-a2.googledomains.com.",
];

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    zones: HashMap<String, ManagedZone>,
    pending_polls: usize,
    fail_activation: Option<String>,
    fail_create: Option<String>,
    credentials_ok: bool,
}

/// A zone provider that records every call in order
#[derive(Clone)]
pub struct MockZoneProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockZoneProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                credentials_ok: true,
                ..MockState::default()
            })),
        }
    }

    /// Answer `Pending` for the first `polls` activation checks
    pub fn with_pending_polls(self, polls: usize) -> Self {
        self.state.lock().unwrap().pending_polls = polls;
        self
    }

    pub fn failing_activation(self, message: &str) -> Self {
        self.state.lock().unwrap().fail_activation = Some(message.to_string());
        self
    }

    pub fn failing_create(self, message: &str) -> Self {
        self.state.lock().unwrap().fail_create = Some(message.to_string());
        self
    }

    pub fn rejecting_credentials(self) -> Self {
        self.state.lock().unwrap().credentials_ok = false;
        self
    }

    pub fn with_zone(self, resource_name: &str, dns_name: &str) -> Self {
        self.state.lock().unwrap().zones.insert(
            resource_name.to_string(),
            zone(resource_name, dns_name),
        );
        self
    }

    /// Every call made so far, e.g. `["enable_service:dns.googleapis.com", "create_zone:example-com"]`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(method))
            .count()
    }

    pub fn has_zone(&self, resource_name: &str) -> bool {
        self.state.lock().unwrap().zones.contains_key(resource_name)
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn zone(resource_name: &str, dns_name: &str) -> ManagedZone {
    ManagedZone {
        resource_name: resource_name.to_string(),
        dns_name: dns_name.to_string(),
        nameservers: MOCK_NAMESERVERS.iter().map(|s| s.to_string()).collect(),
        id: Some("1234567890".to_string()),
    }
}

#[async_trait::async_trait]
impl ZoneProvider for MockZoneProvider {
    async fn enable_service(&self, service: &str) -> Result<ServiceActivation> {
        self.record(format!("enable_service:{service}"));
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.fail_activation {
            return Err(Error::auth(message.clone()));
        }
        if state.pending_polls > 0 {
            Ok(ServiceActivation::Pending {
                operation: "operations/acf.mock".to_string(),
            })
        } else {
            Ok(ServiceActivation::Ready)
        }
    }

    async fn activation_status(&self, operation: &str) -> Result<ServiceActivation> {
        self.record(format!("activation_status:{operation}"));
        let mut state = self.state.lock().unwrap();
        if state.pending_polls > 1 {
            state.pending_polls -= 1;
            Ok(ServiceActivation::Pending {
                operation: operation.to_string(),
            })
        } else {
            state.pending_polls = 0;
            Ok(ServiceActivation::Ready)
        }
    }

    async fn create_zone(&self, spec: &ZoneSpec) -> Result<ManagedZone> {
        self.record(format!("create_zone:{}", spec.resource_name));
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.fail_create {
            return Err(Error::provider("mock", message.clone()));
        }
        if state.zones.contains_key(&spec.resource_name) {
            return Err(Error::provider(
                "mock",
                format!("The resource '{}' already exists", spec.resource_name),
            ));
        }
        let created = zone(&spec.resource_name, &spec.dns_name);
        state
            .zones
            .insert(spec.resource_name.clone(), created.clone());
        Ok(created)
    }

    async fn get_zone(&self, zone: &str) -> Result<ManagedZone> {
        self.record(format!("get_zone:{zone}"));
        self.state
            .lock()
            .unwrap()
            .zones
            .get(zone)
            .cloned()
            .ok_or_else(|| Error::not_found(zone.to_string()))
    }

    async fn list_zones(&self) -> Result<Vec<ManagedZone>> {
        self.record("list_zones".to_string());
        let mut zones: Vec<ManagedZone> =
            self.state.lock().unwrap().zones.values().cloned().collect();
        zones.sort_by(|a, b| a.resource_name.cmp(&b.resource_name));
        Ok(zones)
    }

    async fn delete_zone(&self, zone: &str) -> Result<()> {
        self.record(format!("delete_zone:{zone}"));
        self.state
            .lock()
            .unwrap()
            .zones
            .remove(zone)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(zone.to_string()))
    }

    async fn check_credentials(&self) -> Result<bool> {
        self.record("check_credentials".to_string());
        Ok(self.state.lock().unwrap().credentials_ok)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Configuration with a fast activation poll for tests
pub fn test_config() -> ProvisionConfig {
    let mut config = ProvisionConfig::new(ProviderConfig::Custom {
        factory: "mock".to_string(),
        config: serde_json::json!({}),
    });
    config.activation = ActivationConfig {
        poll_interval_ms: 1,
        timeout_secs: 5,
        ..ActivationConfig::default()
    };
    config
}

/// Drain all events currently queued
pub fn drain_events(rx: &mut mpsc::Receiver<ProvisionEvent>) -> Vec<ProvisionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
