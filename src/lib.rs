//! Prometheus exporter for Azure Monitor metrics

pub mod azure;
pub mod batcher;
pub mod config;
pub mod environment;
pub mod error;
pub mod exposition;
pub mod filter;
pub mod labels;
pub mod sanitizer;
pub mod scrape;
pub mod server;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::azure::{AzureClient, ClientCredentials, MonitorApi, Token, TokenCache, TokenExchange};
    pub use crate::config::{ConfigBuilder, ExporterConfig};
    pub use crate::error::{ExporterError, Result};
    pub use crate::exposition::{PrometheusSink, SampleSink};
    pub use crate::labels::ResourceLabelSet;
    pub use crate::sanitizer::NormalizedMetric;
    pub use crate::scrape::{ScrapeSummary, Scraper};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
