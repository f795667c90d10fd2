use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, error};
use serde::de::DeserializeOwned;

use crate::azure::models::{
    MetricDefinition, MetricDefinitionResponse, MetricValue, MetricValueResponse, ResourceDescriptor,
    ResourceListResponse,
};
use crate::azure::token::Token;
use crate::config::ExporterConfig;
use crate::error::{ExporterError, Result};

/// API version of the resources endpoint
pub const RESOURCES_API_VERSION: &str = "2018-05-01";
/// API version of the Monitor definitions and metrics endpoints
pub const MONITOR_API_VERSION: &str = "2018-01-01";

/// Minutes subtracted from now for the start and end of the query window
const WINDOW_START_DELAY: i64 = 4;
const WINDOW_END_DELAY: i64 = 3;

/// The Azure calls a scrape depends on
#[async_trait]
pub trait MonitorApi: Send + Sync + 'static {
    /// List the subscription's resources carrying the given tag value
    async fn list_resources(&self, token: &Token, tag_value: &str) -> Result<Vec<ResourceDescriptor>>;

    /// Metric definitions available on a resource, in API order
    async fn metric_definitions(&self, token: &Token, resource_id: &str) -> Result<Vec<MetricDefinition>>;

    /// Latest values for a comma-joined batch of metric names
    async fn metric_values(
        &self,
        token: &Token,
        resource_id: &str,
        metric_names: &str,
        aggregation: &str,
    ) -> Result<Vec<MetricValue>>;
}

/// `start/end` timespan for a query issued at `now`
pub fn query_timespan(now: DateTime<Utc>) -> String {
    let start = now - Duration::minutes(WINDOW_START_DELAY);
    let end = now - Duration::minutes(WINDOW_END_DELAY);
    format!(
        "{}/{}",
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Join the token audience with a resource path
pub fn management_url(audience: &str, path: &str) -> String {
    format!("{}/{}", audience.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// REST client for Azure Resource Manager and Monitor
#[derive(Clone)]
pub struct AzureClient {
    client: reqwest::Client,
    subscription_id: String,
    tag_name: String,
}

impl AzureClient {
    pub fn new(subscription_id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            subscription_id: subscription_id.into(),
            tag_name: tag_name.into(),
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::new(config.subscription_id.clone(), config.resource_query_tag_name.clone())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        context: &str,
        token: &Token,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("[{}] GET {}", context, url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&token.value)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("[{}] - Error in GET {}: {}", context, url, e);
                ExporterError::Transport(format!("GET {} failed: {}", url, e))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            ExporterError::Transport(format!("Error reading body of response from {}: {}", url, e))
        })?;

        if !status.is_success() {
            error!("[{}] - Error in GET {}: status {}", context, url, status);
            return Err(ExporterError::Transport(format!(
                "Unable to query {} with status code: {}",
                url,
                status.as_u16()
            )));
        }

        serde_json::from_slice(&body).map_err(|e| {
            error!("[{}] - Error decoding body of {}: {}", context, url, e);
            ExporterError::Decode(format!("Error unmarshalling response body from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl MonitorApi for AzureClient {
    async fn list_resources(&self, token: &Token, tag_value: &str) -> Result<Vec<ResourceDescriptor>> {
        if tag_value.trim().is_empty() {
            return Err(ExporterError::Validation("Tag value is empty".to_string()));
        }

        let url = management_url(
            &token.audience,
            &format!("subscriptions/{}/resources", self.subscription_id),
        );
        let filter = format!("tagName eq '{}' and tagValue eq '{}'", self.tag_name, tag_value);

        let response: ResourceListResponse = self
            .get_json(
                "GetResources",
                token,
                &url,
                &[("$filter", filter.as_str()), ("api-version", RESOURCES_API_VERSION)],
            )
            .await?;

        Ok(response.value)
    }

    async fn metric_definitions(&self, token: &Token, resource_id: &str) -> Result<Vec<MetricDefinition>> {
        let url = management_url(
            &token.audience,
            &format!("{}/providers/microsoft.insights/metricDefinitions", resource_id),
        );

        let response: MetricDefinitionResponse = self
            .get_json("GetMetricTypes", token, &url, &[("api-version", MONITOR_API_VERSION)])
            .await?;

        Ok(response.value)
    }

    async fn metric_values(
        &self,
        token: &Token,
        resource_id: &str,
        metric_names: &str,
        aggregation: &str,
    ) -> Result<Vec<MetricValue>> {
        let url = management_url(
            &token.audience,
            &format!("{}/providers/microsoft.insights/metrics", resource_id),
        );
        let timespan = query_timespan(Utc::now());

        let mut query = Vec::with_capacity(4);
        if !metric_names.is_empty() {
            query.push(("metricnames", metric_names));
        }
        query.push(("aggregation", aggregation));
        query.push(("timespan", timespan.as_str()));
        query.push(("api-version", MONITOR_API_VERSION));

        let response: MetricValueResponse = self.get_json("GetMetric", token, &url, &query).await?;

        if let Some(api_error) = response.error {
            if response.value.is_empty() {
                return Err(ExporterError::Transport(format!(
                    "Metrics API error {}: {}",
                    api_error.code, api_error.message
                )));
            }
        }

        Ok(response.value)
    }
}
