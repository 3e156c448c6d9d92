//! Configuration types for zone provisioning
//!
//! This module defines the inputs record and all configuration structures
//! used throughout the crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable carrying the JSON-encoded inputs object
pub const INPUTS_ENV_VAR: &str = "ZONEPROV_INPUTS";

/// Service that must be active before managed zones can be created
pub const DNS_SERVICE: &str = "dns.googleapis.com";

/// Where the zone inputs come from
///
/// All variants produce the same [`ZoneInputs`] shape: `{ "name": "<domain>." }`.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// A structured configuration object, read by key
    Structured(Value),
    /// A raw JSON object, typically the contents of [`INPUTS_ENV_VAR`]
    EnvJson(String),
    /// A name given directly (e.g. on the command line)
    Direct(String),
}

impl InputSource {
    /// Read the raw JSON variant from the process environment
    ///
    /// Returns `None` when the variable is not set.
    pub fn from_env() -> Option<Self> {
        std::env::var(INPUTS_ENV_VAR).ok().map(Self::EnvJson)
    }
}

/// The configuration record for one managed zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInputs {
    /// Desired DNS name, e.g. `example.com.`
    pub name: String,
}

impl ZoneInputs {
    /// Create inputs for a DNS name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Resolve inputs from a source
    ///
    /// # Errors
    ///
    /// - `ConfigurationMissing`: `name` is absent, `null` or blank
    /// - `Config`: the JSON does not parse, is not an object, or `name` is not a string
    pub fn load(source: &InputSource) -> Result<Self> {
        let name = match source {
            InputSource::Structured(value) => require_str(value, "name")?,
            InputSource::EnvJson(raw) => {
                if raw.trim().is_empty() {
                    return Err(Error::missing(format!("{INPUTS_ENV_VAR} is empty")));
                }
                let value: Value = serde_json::from_str(raw).map_err(|e| {
                    Error::config(format!("{INPUTS_ENV_VAR} is not valid JSON: {e}"))
                })?;
                require_str(&value, "name")?
            }
            InputSource::Direct(name) => name.clone(),
        };

        if name.trim().is_empty() {
            return Err(Error::missing("name"));
        }

        Ok(Self { name })
    }

    /// Resolve inputs from the first source that is present
    pub fn load_first(sources: impl IntoIterator<Item = Option<InputSource>>) -> Result<Self> {
        let source = sources
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| Error::missing("name (no inputs supplied)"))?;
        Self::load(&source)
    }
}

/// Read a required string field from a configuration object
fn require_str(value: &Value, key: &str) -> Result<String> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::config("inputs must be a JSON object"))?;

    match object.get(key) {
        None | Some(Value::Null) => Err(Error::missing(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::config(format!(
            "'{key}' must be a string, got {other}"
        ))),
    }
}

/// Full provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Provider configuration
    pub provider: ProviderConfig,

    /// Where exports are published
    #[serde(default)]
    pub exports: ExportStoreConfig,

    /// Service activation settings
    #[serde(default)]
    pub activation: ActivationConfig,
}

impl ProvisionConfig {
    /// Create a configuration for a provider with default settings
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            exports: ExportStoreConfig::default(),
            activation: ActivationConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.exports.validate()?;
        self.activation.validate()?;
        Ok(())
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Google Cloud (Service Usage + Cloud DNS)
    Gcp {
        /// Target project id
        project: String,
        /// OAuth2 access token; the metadata server is used when absent
        #[serde(default)]
        access_token: Option<String>,
        /// Cloud DNS API base URL override
        #[serde(default)]
        dns_endpoint: Option<String>,
        /// Service Usage API base URL override
        #[serde(default)]
        service_usage_endpoint: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: Value,
    },
}

impl ProviderConfig {
    /// Create a Google Cloud provider configuration with default endpoints
    pub fn gcp(project: impl Into<String>, access_token: Option<String>) -> Self {
        ProviderConfig::Gcp {
            project: project.into(),
            access_token,
            dns_endpoint: None,
            service_usage_endpoint: None,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Gcp {
                project,
                access_token,
                ..
            } => {
                if project.trim().is_empty() {
                    return Err(Error::missing("GCP project"));
                }
                if access_token.as_ref().is_some_and(|t| t.trim().is_empty()) {
                    return Err(Error::config("GCP access token cannot be empty when set"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Gcp { .. } => "gcp",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Export store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportStoreConfig {
    /// In-memory store (exports only printed)
    #[default]
    Memory,

    /// JSON file store
    File {
        /// Path to the exports file
        path: String,
    },

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: Value,
    },
}

impl ExportStoreConfig {
    /// Validate the export store configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ExportStoreConfig::File { path } if path.is_empty() => {
                Err(Error::config("Export file path cannot be empty"))
            }
            ExportStoreConfig::Custom { factory, .. } if factory.is_empty() => {
                Err(Error::config("Custom export store factory cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            ExportStoreConfig::Memory => "memory",
            ExportStoreConfig::File { .. } => "file",
            ExportStoreConfig::Custom { factory, .. } => factory,
        }
    }

    /// Store-specific settings as handed to a factory
    pub fn settings(&self) -> Value {
        match self {
            ExportStoreConfig::Memory => Value::Null,
            ExportStoreConfig::File { path } => serde_json::json!({ "path": path }),
            ExportStoreConfig::Custom { config, .. } => config.clone(),
        }
    }
}

/// Service activation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Service to activate before creating the zone
    #[serde(default = "default_service")]
    pub service: String,

    /// Delay between activation status checks (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for activation after this long (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Capacity of the provisioning event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ActivationConfig {
    /// Validate the activation settings
    pub fn validate(&self) -> Result<()> {
        if self.service.is_empty() {
            return Err(Error::config("Activation service cannot be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("Activation poll interval must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("Activation timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_service() -> String {
    DNS_SERVICE.to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    64
}
