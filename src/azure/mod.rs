mod client;
pub mod models;
mod token;

pub use client::{AzureClient, MONITOR_API_VERSION, MonitorApi, RESOURCES_API_VERSION, management_url, query_timespan};
pub use token::{ClientCredentials, REFRESH_MARGIN_MINUTES, Token, TokenCache, TokenExchange};
