// # Google Cloud Zone Provider
//
// This crate provides a Google Cloud implementation of `ZoneProvider`:
//
// - Service activation via the Service Usage API
// - Managed zones via the Cloud DNS v1 API
//
// ## Constraints
//
// - One logical request per trait call (list follows page tokens)
// - Full error propagation; no retry, no backoff, no sleeping
// - Waiting for long-running activations is owned by `ZoneProvisioner`
// - HTTP timeout configured (30 seconds)
// - Dry-run mode for safe testing
//
// ## Security Requirements
//
// - Access token NEVER appears in logs or Debug output
// - Provider MUST fail fast if the project is empty
//
// ## API Reference
//
// - Enable service: POST `/v1/projects/:project/services/:service:enable`
// - Operation status: GET `/v1/:operation`
// - Create zone: POST `/dns/v1/projects/:project/managedZones`
// - Get zone: GET `/dns/v1/projects/:project/managedZones/:zone`
// - List zones: GET `/dns/v1/projects/:project/managedZones?pageToken=...`
// - Delete zone: DELETE `/dns/v1/projects/:project/managedZones/:zone`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use zoneprov_core::config::ProviderConfig;
use zoneprov_core::traits::{
    ManagedZone, ServiceActivation, ZoneProvider, ZoneProviderFactory, ZoneSpec,
};
use zoneprov_core::{Error, Result};

/// Cloud DNS API base URL
pub const DNS_API_BASE: &str = "https://dns.googleapis.com";

/// Service Usage API base URL
pub const SERVICE_USAGE_API_BASE: &str = "https://serviceusage.googleapis.com";

/// GCE metadata server endpoint for the default service account token
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "gcp";

/// Where the OAuth2 access token comes from
#[derive(Clone)]
pub enum TokenSource {
    /// A pre-issued token (e.g. `gcloud auth print-access-token`)
    Static(String),
    /// The GCE metadata server of the machine we run on
    MetadataServer {
        /// Token endpoint
        url: String,
    },
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("Static(<REDACTED>)"),
            TokenSource::MetadataServer { url } => {
                f.debug_struct("MetadataServer").field("url", url).finish()
            }
        }
    }
}

/// Google Cloud zone provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests
/// - Log the intended mutation and its payload
/// - **NOT** enable services, create or delete zones
#[derive(Debug)]
pub struct GcpProvider {
    /// Target project id
    project: String,

    /// Token source (redacted in Debug)
    token_source: TokenSource,

    /// Cloud DNS base URL
    dns_base: String,

    /// Service Usage base URL
    service_usage_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform reads but skip mutations
    dry_run: bool,
}

/// Managed zone resource as returned by Cloud DNS
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedZoneResource {
    name: String,
    dns_name: String,
    #[serde(default)]
    name_servers: Vec<String>,
    #[serde(default)]
    id: Option<String>,
}

impl From<ManagedZoneResource> for ManagedZone {
    fn from(zone: ManagedZoneResource) -> Self {
        ManagedZone {
            resource_name: zone.name,
            dns_name: zone.dns_name,
            nameservers: zone.name_servers,
            id: zone.id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedZonesPage {
    #[serde(default)]
    managed_zones: Vec<ManagedZoneResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl GcpProvider {
    /// Create a new Google Cloud provider
    ///
    /// # Parameters
    ///
    /// - `project`: Target project id
    /// - `access_token`: OAuth2 access token; the metadata server is used when `None`
    /// - `dry_run`: If true, perform reads but skip mutations
    pub fn new(
        project: impl Into<String>,
        access_token: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let project = project.into();
        if project.trim().is_empty() {
            return Err(Error::missing("GCP project"));
        }

        let token_source = match access_token {
            Some(token) if token.trim().is_empty() => {
                return Err(Error::config("GCP access token cannot be empty when set"));
            }
            Some(token) => TokenSource::Static(token),
            None => TokenSource::MetadataServer {
                url: METADATA_TOKEN_URL.to_string(),
            },
        };

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            project,
            token_source,
            dns_base: DNS_API_BASE.to_string(),
            service_usage_base: SERVICE_USAGE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Override the API base URLs (trailing slashes are ignored)
    pub fn with_endpoints(
        mut self,
        dns_base: impl Into<String>,
        service_usage_base: impl Into<String>,
    ) -> Self {
        self.dns_base = dns_base.into().trim_end_matches('/').to_string();
        self.service_usage_base = service_usage_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the token source
    pub fn with_token_source(mut self, token_source: TokenSource) -> Self {
        self.token_source = token_source;
        self
    }

    /// Whether mutations are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn zones_url(&self) -> String {
        format!(
            "{}/dns/v1/projects/{}/managedZones",
            self.dns_base, self.project
        )
    }

    fn zone_url(&self, zone: &str) -> String {
        format!("{}/{}", self.zones_url(), zone)
    }

    /// Get an access token for the next request
    ///
    /// # API Call (metadata source only)
    ///
    /// ```http
    /// GET /computeMetadata/v1/instance/service-accounts/default/token
    /// Metadata-Flavor: Google
    /// ```
    async fn access_token(&self) -> Result<String> {
        match &self.token_source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::MetadataServer { url } => {
                tracing::debug!("Fetching access token from metadata server");

                let response = self
                    .client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| {
                        Error::auth(format!(
                            "No access token configured and metadata server unreachable: {}",
                            e
                        ))
                    })?;

                if !response.status().is_success() {
                    return Err(Error::auth(format!(
                        "Metadata server refused token request. Status: {}",
                        response.status()
                    )));
                }

                let json: Value = response.json().await.map_err(|e| {
                    Error::auth(format!("Failed to parse metadata token response: {}", e))
                })?;

                json["access_token"]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::auth("Metadata token response has no access_token"))
            }
        }
    }

    /// Send an authenticated request and decode the JSON body
    ///
    /// An empty success body decodes to `Value::Null`.
    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<Value> {
        let token = self.access_token().await?;

        let response = request
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: HTTP request failed: {}", context, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body, context));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("{}: Failed to parse response: {}", context, e),
            )
        })
    }
}

/// Map a non-success status to an error, keeping the API's own message
fn status_error(status: u16, body: &str, context: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => Error::auth(format!(
            "{}: invalid access token or insufficient permissions. Status: {} - {}",
            context, status, message
        )),
        404 => Error::not_found(format!("{}: {}", context, message)),
        409 => Error::provider(
            PROVIDER_NAME,
            format!("{}: conflict. Status: {} - {}", context, status, message),
        ),
        429 => Error::rate_limited(format!(
            "{}: quota or rate limit exceeded. Status: {} - {}",
            context, status, message
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!(
                "{}: server error (transient). Status: {} - {}",
                context, status, message
            ),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{}: Status: {} - {}", context, status, message),
        ),
    }
}

/// Interpret a Service Usage long-running operation
fn parse_operation(operation: &Value) -> Result<ServiceActivation> {
    if let Some(message) = operation["error"]["message"].as_str() {
        return Err(Error::provider(
            PROVIDER_NAME,
            format!("Service activation failed: {}", message),
        ));
    }

    if operation["done"].as_bool().unwrap_or(false) {
        return Ok(ServiceActivation::Ready);
    }

    let name = operation["name"].as_str().ok_or_else(|| {
        Error::provider(
            PROVIDER_NAME,
            "Invalid response format: pending operation has no name",
        )
    })?;

    Ok(ServiceActivation::Pending {
        operation: name.to_string(),
    })
}

fn parse_zone(value: Value) -> Result<ManagedZone> {
    let zone: ManagedZoneResource = serde_json::from_value(value).map_err(|e| {
        Error::provider(
            PROVIDER_NAME,
            format!("Invalid managed zone in response: {}", e),
        )
    })?;
    Ok(zone.into())
}

#[async_trait]
impl ZoneProvider for GcpProvider {
    /// # API Call
    ///
    /// ```http
    /// POST /v1/projects/:project/services/dns.googleapis.com:enable
    /// ```
    async fn enable_service(&self, service: &str) -> Result<ServiceActivation> {
        let url = format!(
            "{}/v1/projects/{}/services/{}:enable",
            self.service_usage_base, self.project, service
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send POST request to {}", url);
            return Ok(ServiceActivation::Ready);
        }

        tracing::info!(
            "Enabling {} for project {}",
            service,
            self.project
        );

        let operation = self
            .send(
                self.client.post(&url).json(&serde_json::json!({})),
                "Service activation",
            )
            .await?;

        parse_operation(&operation)
    }

    async fn activation_status(&self, operation: &str) -> Result<ServiceActivation> {
        let url = format!("{}/v1/{}", self.service_usage_base, operation);
        let status = self
            .send(self.client.get(&url), "Activation status")
            .await?;
        parse_operation(&status)
    }

    /// # API Call
    ///
    /// ```http
    /// POST /dns/v1/projects/:project/managedZones
    /// {
    ///   "name": "example-com",
    ///   "dnsName": "example.com.",
    ///   "description": "Managed by zoneprov"
    /// }
    /// ```
    async fn create_zone(&self, spec: &ZoneSpec) -> Result<ManagedZone> {
        let payload = serde_json::json!({
            "name": spec.resource_name,
            "dnsName": spec.dns_name,
            "description": spec.description,
        });

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                self.zones_url(),
                payload
            );
            return Ok(ManagedZone {
                resource_name: spec.resource_name.clone(),
                dns_name: spec.dns_name.clone(),
                nameservers: Vec::new(),
                id: None,
            });
        }

        tracing::info!(
            "Creating managed zone {} ({})",
            spec.resource_name,
            spec.dns_name
        );

        let zone = self
            .send(
                self.client.post(self.zones_url()).json(&payload),
                "Zone creation",
            )
            .await?;

        parse_zone(zone)
    }

    async fn get_zone(&self, zone: &str) -> Result<ManagedZone> {
        tracing::debug!("Looking up managed zone {}", zone);
        let value = self
            .send(self.client.get(self.zone_url(zone)), "Zone lookup")
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found(zone.to_string()),
                other => other,
            })?;
        parse_zone(value)
    }

    async fn list_zones(&self) -> Result<Vec<ManagedZone>> {
        let mut zones = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(self.zones_url());
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let value = self.send(request, "Zone listing").await?;
            let page: ManagedZonesPage = serde_json::from_value(value).map_err(|e| {
                Error::provider(
                    PROVIDER_NAME,
                    format!("Invalid zone listing in response: {}", e),
                )
            })?;

            zones.extend(page.managed_zones.into_iter().map(ManagedZone::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("Listed {} managed zone(s)", zones.len());
        Ok(zones)
    }

    async fn delete_zone(&self, zone: &str) -> Result<()> {
        let url = self.zone_url(zone);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(());
        }

        tracing::info!("Deleting managed zone {}", zone);
        self.send(self.client.delete(&url), "Zone deletion")
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found(zone.to_string()),
                other => other,
            })?;
        Ok(())
    }

    async fn check_credentials(&self) -> Result<bool> {
        let request = self
            .client
            .get(self.zones_url())
            .query(&[("maxResults", "1")]);

        match self.send(request, "Credential check").await {
            Ok(_) => Ok(true),
            Err(Error::Authentication(reason)) => {
                tracing::warn!("Credential check rejected: {}", reason);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Google Cloud providers
pub struct GcpFactory;

impl ZoneProviderFactory for GcpFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
        match config {
            ProviderConfig::Gcp {
                project,
                access_token,
                dns_endpoint,
                service_usage_endpoint,
            } => {
                // Check for dry-run mode environment variable
                let dry_run = std::env::var("ZONEPROV_MODE")
                    .unwrap_or_default()
                    .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!("GCP provider running in DRY-RUN mode - no changes will be made");
                }

                let provider = GcpProvider::new(project.clone(), access_token.clone(), dry_run)?
                    .with_endpoints(
                        dns_endpoint.as_deref().unwrap_or(DNS_API_BASE),
                        service_usage_endpoint
                            .as_deref()
                            .unwrap_or(SERVICE_USAGE_API_BASE),
                    );

                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for GCP provider")),
        }
    }
}

/// Register the Google Cloud provider with a registry under `"gcp"`
pub fn register(registry: &zoneprov_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(GcpFactory));
}
