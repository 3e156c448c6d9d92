// # zoneprov - Managed Zone Provisioner
//
// A THIN integration layer: all provisioning logic lives in zoneprov-core.
//
// The binary is responsible for:
// 1. Reading configuration from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Registering providers and export stores
// 4. Running one command and printing its result
//
// ## Configuration
//
// Every flag falls back to an environment variable:
//
// - `ZONEPROV_PROJECT`: Target project id
// - `ZONEPROV_ACCESS_TOKEN`: OAuth2 access token (metadata server when unset)
// - `ZONEPROV_NAME`: DNS name of the zone (`up` / `destroy`)
// - `ZONEPROV_CONFIG`: Path to a JSON file holding `{ "name": ... }`
// - `ZONEPROV_INPUTS`: Raw JSON `{ "name": ... }`, used when neither of the above is set
// - `ZONEPROV_EXPORTS_PATH`: Persist exports to this JSON file
// - `ZONEPROV_LOG_LEVEL`: trace, debug, info, warn, error
// - `ZONEPROV_MODE=dry-run`: Perform reads only
//
// ## Example
//
// ```bash
// export ZONEPROV_PROJECT=my-project
// export ZONEPROV_ACCESS_TOKEN="$(gcloud auth print-access-token)"
//
// zoneprov up --name example.com.
// ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zoneprov_core::config::ExportStoreConfig;
use zoneprov_core::{
    InputSource, ProviderConfig, ProviderRegistry, ProvisionConfig, ZoneInputs, ZoneProvisioner,
};

/// Exit codes for different termination scenarios
///
/// - 0: Command succeeded
/// - 1: Configuration error (nothing was sent to the provider)
/// - 2: Provider or runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneprovExitCode {
    /// Command succeeded
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Provider request or runtime failure
    RuntimeError = 2,
}

impl From<ZoneprovExitCode> for ExitCode {
    fn from(code: ZoneprovExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl ZoneprovExitCode {
    /// Classify a failed command
    fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<zoneprov_core::Error>() {
            Some(e) if e.is_config() => ZoneprovExitCode::ConfigError,
            _ => ZoneprovExitCode::RuntimeError,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "zoneprov")]
#[command(about = "Activate Cloud DNS and provision a managed zone", long_about = None)]
#[command(version)]
struct Cli {
    /// Target project id
    #[arg(long, env = "ZONEPROV_PROJECT", global = true)]
    project: Option<String>,

    /// OAuth2 access token (the metadata server is used when unset)
    #[arg(long, env = "ZONEPROV_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Cloud DNS API base URL
    #[arg(long, env = "ZONEPROV_DNS_ENDPOINT", global = true)]
    dns_endpoint: Option<String>,

    /// Service Usage API base URL
    #[arg(long, env = "ZONEPROV_SERVICE_USAGE_ENDPOINT", global = true)]
    service_usage_endpoint: Option<String>,

    /// Persist exports to this JSON file
    #[arg(long, env = "ZONEPROV_EXPORTS_PATH", global = true)]
    exports_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ZONEPROV_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Activate the DNS service, create the zone and print its exports
    Up(InputArgs),

    /// Delete the zone derived from the inputs (the service stays enabled)
    Destroy(InputArgs),

    /// Print the exports of an existing zone
    Get {
        /// Zone resource name (e.g. example-com)
        id: String,
    },

    /// Print the exports of every zone in the project
    List,

    /// Adopt an existing zone and publish its exports
    Import {
        /// Zone resource name (e.g. example-com)
        id: String,
    },

    /// Verify that the credentials are accepted
    CheckCredentials,
}

#[derive(Args, Debug, Default)]
struct InputArgs {
    /// DNS name of the zone (e.g. example.com.)
    #[arg(long, env = "ZONEPROV_NAME")]
    name: Option<String>,

    /// JSON file with the zone inputs
    #[arg(long, env = "ZONEPROV_CONFIG")]
    config: Option<PathBuf>,
}

impl InputArgs {
    /// Resolve the zone inputs: `--name`, then `--config`, then `ZONEPROV_INPUTS`
    ///
    /// Blank values (e.g. `ZONEPROV_NAME=""`) count as unset.
    fn resolve(&self) -> Result<ZoneInputs> {
        let config = self
            .config
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty());
        let structured = match config {
            Some(path) => Some(InputSource::Structured(read_json(path)?)),
            None => None,
        };

        let name = self
            .name
            .clone()
            .filter(|name| !name.trim().is_empty());

        let inputs = ZoneInputs::load_first([
            name.map(InputSource::Direct),
            structured,
            InputSource::from_env(),
        ])?;
        Ok(inputs)
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        zoneprov_core::Error::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let value = serde_json::from_str(&raw).map_err(|e| {
        zoneprov_core::Error::config(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;
    Ok(value)
}

impl Cli {
    /// Build the provisioning configuration
    fn provision_config(&self) -> ProvisionConfig {
        let provider = ProviderConfig::Gcp {
            project: self.project.clone().unwrap_or_default(),
            access_token: self.access_token.clone(),
            dns_endpoint: self.dns_endpoint.clone(),
            service_usage_endpoint: self.service_usage_endpoint.clone(),
        };

        let mut config = ProvisionConfig::new(provider);
        if let Some(ref path) = self.exports_path {
            config.exports = ExportStoreConfig::File {
                path: path.display().to_string(),
            };
        }
        config
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_level) = parse_log_level(&cli.log_level) else {
        eprintln!(
            "ZONEPROV_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            cli.log_level
        );
        return ZoneprovExitCode::ConfigError.into();
    };

    // Logs go to stderr; stdout carries the exports only
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZoneprovExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZoneprovExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run(cli).await {
            Ok(()) => ZoneprovExitCode::Success,
            Err(e) => {
                let code = ZoneprovExitCode::from_error(&e);
                error!("{:#}", e);
                code
            }
        }
    });

    code.into()
}

/// Run a single command
async fn run(cli: Cli) -> Result<()> {
    let config = cli.provision_config();
    config.validate()?;

    // Inputs are resolved before any provider call
    let inputs = match &cli.command {
        Commands::Up(args) | Commands::Destroy(args) => Some(args.resolve()?),
        _ => None,
    };

    let registry = ProviderRegistry::with_builtin_stores();

    #[cfg(feature = "gcp")]
    {
        debug!("Registering Google Cloud provider");
        zoneprov_provider_gcp::register(&registry);
    }

    let provider = registry.create_provider(&config.provider)?;
    let exports = registry.create_export_store(&config.exports).await?;
    info!(
        "Using {} provider with {} export store",
        provider.provider_name(),
        config.exports.type_name()
    );

    let (provisioner, mut events) = ZoneProvisioner::new(provider, exports, &config)?;
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Event: {:?}", event);
        }
    });

    let result = execute(&provisioner, cli.command, inputs).await;

    drop(provisioner);
    if let Err(e) = event_log.await {
        warn!("Event log task failed: {}", e);
    }
    result
}

async fn execute(
    provisioner: &ZoneProvisioner,
    command: Commands,
    inputs: Option<ZoneInputs>,
) -> Result<()> {
    match (command, inputs) {
        (Commands::Up(_), Some(inputs)) => {
            let exports = provisioner.provision(&inputs).await?;
            print_json(&exports)?;
        }
        (Commands::Destroy(_), Some(inputs)) => {
            let id = provisioner.destroy(&inputs).await?;
            print_json(&serde_json::json!({ "destroyed": id }))?;
        }
        (Commands::Get { id }, _) => match provisioner.get(&id).await? {
            Some(exports) => print_json(&exports)?,
            None => return Err(zoneprov_core::Error::not_found(id).into()),
        },
        (Commands::List, _) => {
            let zones = provisioner.list().await?;
            print_json(&zones)?;
        }
        (Commands::Import { id }, _) => {
            let exports = provisioner.import(&id).await?;
            print_json(&exports)?;
        }
        (Commands::CheckCredentials, _) => {
            provisioner.check_credentials().await?;
            info!("Credentials accepted");
        }
        (Commands::Up(_) | Commands::Destroy(_), None) => {
            return Err(zoneprov_core::Error::missing("name").into());
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
