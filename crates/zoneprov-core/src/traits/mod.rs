//! Core traits for zone provisioning
//!
//! - [`ZoneProvider`]: Activate services and manage zones via provider APIs
//! - [`ExportStore`]: Publish zone outputs for downstream consumers

pub mod export_store;
pub mod zone_provider;

pub use export_store::{ExportRecord, ExportStore, ExportStoreFactory, ZoneExports};
pub use zone_provider::{ManagedZone, ServiceActivation, ZoneProvider, ZoneProviderFactory, ZoneSpec};
