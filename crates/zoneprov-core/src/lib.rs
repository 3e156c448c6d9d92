// # zoneprov-core
//
// Core library for provisioning cloud DNS managed zones.
//
// ## Architecture Overview
//
// - **ZoneProvider**: Trait for activating services and managing zones via provider APIs
// - **ExportStore**: Trait for publishing zone outputs (`id`, `name`, `nameservers`)
// - **ZoneProvisioner**: Runs the linear inputs → activation → zone → exports flow
// - **ProviderRegistry**: Plugin-based registry for providers and export stores
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Provisioning flow is separate from provider APIs
// 2. **Ordered**: The zone is only requested once its service activation is established
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: Everything the binary does is available as a library
// 5. **Fail Fast**: The first error aborts the run; no retries, no rollback

pub mod config;
pub mod error;
pub mod exports;
pub mod naming;
pub mod provisioner;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{InputSource, ProviderConfig, ProvisionConfig, ZoneInputs};
pub use error::{Error, Result};
pub use exports::{FileExportStore, MemoryExportStore};
pub use provisioner::{ProvisionEvent, ZoneProvisioner};
pub use registry::ProviderRegistry;
pub use traits::{ExportStore, ManagedZone, ZoneExports, ZoneProvider, ZoneSpec};
