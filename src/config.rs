use log::{debug, warn};
use serde::Deserialize;
use std::fmt::Debug;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{ExporterError, Result};

/// Service principal used for the client-credentials grant
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    /// Application (client) id
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Directory (tenant) id
    pub tenant_id: String,
}

/// Elasticsearch log shipping settings
#[derive(Debug, Deserialize, Clone)]
pub struct LogShippingConfig {
    /// Whether records are shipped at all
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the Elasticsearch node
    #[serde(default = "default_shipping_host")]
    pub host: String,
    /// Index prefix
    #[serde(default = "default_shipping_index")]
    pub index: String,
    /// Deployment environment written on each event and into the index name
    #[serde(default = "default_shipping_environment")]
    pub environment: String,
    /// Release written on each event
    #[serde(default = "default_shipping_release")]
    pub release: String,
    /// Bounded queue size; events beyond it are dropped
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

impl Default for LogShippingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_shipping_host(),
            index: default_shipping_index(),
            environment: default_shipping_environment(),
            release: default_shipping_release(),
            queue_size: default_queue_size(),
        }
    }
}

fn default_shipping_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_shipping_index() -> String {
    "logger".to_string()
}

fn default_shipping_environment() -> String {
    "local".to_string()
}

fn default_shipping_release() -> String {
    "1.0.0".to_string()
}

fn default_queue_size() -> usize {
    1024
}

/// Exporter configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ExporterConfig {
    /// Service principal credentials
    pub credentials: CredentialsConfig,
    /// Subscription whose resources are listed
    pub subscription_id: String,
    /// Tag name used to filter the resource listing
    pub resource_query_tag_name: String,
    /// Aggregation selector passed to the metrics endpoint
    #[serde(default = "default_aggregation")]
    pub metric_aggregation: String,
    /// Identity authority host
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    /// Management resource the token is requested for
    #[serde(default = "default_management_resource")]
    pub management_resource: String,
    /// Address the HTTP server listens on
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,
    /// Log shipping
    #[serde(default)]
    pub log_shipping: LogShippingConfig,
}

fn default_aggregation() -> String {
    "Total,Average,Minimum,Maximum".to_string()
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_management_resource() -> String {
    "https://management.azure.com/".to_string()
}

fn default_listen_address() -> String {
    ":9276".to_string()
}

impl ExporterConfig {
    /// Reject configurations that cannot authenticate or list anything
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("credentials.client_id", &self.credentials.client_id),
            ("credentials.client_secret", &self.credentials.client_secret),
            ("credentials.tenant_id", &self.credentials.tenant_id),
            ("subscription_id", &self.subscription_id),
            ("resource_query_tag_name", &self.resource_query_tag_name),
            ("metric_aggregation", &self.metric_aggregation),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ExporterError::Config(format!("{} must not be empty", key)));
            }
        }

        self.socket_addr().map(|_| ())
    }

    /// Parse the listen address; a bare `:port` binds all interfaces
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        parse_listen_address(&self.listen_address)
    }
}

/// Parse a listen address such as `:9276` or `127.0.0.1:9276`
pub fn parse_listen_address(address: &str) -> Result<SocketAddr> {
    let address = address.trim();
    let normalized = if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    };

    normalized
        .parse()
        .map_err(|e| ExporterError::Config(format!("Invalid listen address '{}': {}", address, e)))
}

/// Logging level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ExporterError::Config(format!("Unknown log level: {}", other))),
        }
    }
}

/// Source of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path (TOML format)
    File(PathBuf),
    /// Environment variables with a prefix
    Environment(String),
    /// TOML string
    Toml(String),
}

/// Load configuration from the given sources, later sources overriding earlier ones
pub fn load_config<T>(sources: Vec<ConfigSource>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    let mut builder = config::Config::builder();

    for source in sources {
        match source {
            ConfigSource::File(path) => {
                if !path.exists() {
                    warn!("Configuration file not found: {}", path.display());
                    continue;
                }

                debug!("Loading TOML configuration from file: {}", path.display());
                builder = builder.add_source(
                    config::File::from(path.as_path()).format(config::FileFormat::Toml),
                );
            }
            ConfigSource::Environment(prefix) => {
                debug!("Loading configuration from environment with prefix: {}", prefix);
                builder = builder.add_source(
                    config::Environment::with_prefix(&prefix)
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                );
            }
            ConfigSource::Toml(toml_str) => {
                debug!("Loading configuration from TOML string");
                builder =
                    builder.add_source(config::File::from_str(&toml_str, config::FileFormat::Toml));
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| ExporterError::Config(format!("Failed to build configuration: {}", e)))?;

    config
        .try_deserialize()
        .map_err(|e| ExporterError::Config(format!("Failed to deserialize configuration: {}", e)))
}

/// Configuration builder
pub struct ConfigBuilder {
    sources: Vec<ConfigSource>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Add a TOML file source
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(ConfigSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add environment variables
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment(prefix.into()));
        self
    }

    /// Add TOML string
    pub fn add_toml(mut self, toml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Toml(toml.into()));
        self
    }

    /// Load and validate the exporter configuration
    pub fn build(self) -> Result<ExporterConfig> {
        let config: ExporterConfig = load_config(self.sources)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
