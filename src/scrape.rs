//! One scrape: list tagged resources, fetch their latest metrics and hand
//! normalized values to a [`SampleSink`].
//!
//! Failures are contained to the item they concern. Only a failure to get
//! the first token or to list resources ends the scrape early; a failing
//! resource, batch or value is logged and skipped while the rest of the
//! scrape continues.

use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;

use crate::azure::models::{MetricValue, ResourceDescriptor};
use crate::azure::{MonitorApi, TokenCache};
use crate::batcher::batch_metric_names;
use crate::exposition::SampleSink;
use crate::filter;
use crate::labels::ResourceLabelSet;
use crate::sanitizer;

/// Counts describing how a scrape went
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub resources_listed: usize,
    pub resources_unsupported: usize,
    pub resources_failed: usize,
    pub batches_fetched: usize,
    pub batches_failed: usize,
    pub values_emitted: usize,
    pub values_skipped: usize,
    pub values_failed: usize,
    /// Reason the scrape ended early, if it did
    pub aborted: Option<String>,
}

impl fmt::Display for ScrapeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resources={} unsupported={} failed={} batches={} failed_batches={} values={} skipped={} failed_values={}",
            self.resources_listed,
            self.resources_unsupported,
            self.resources_failed,
            self.batches_fetched,
            self.batches_failed,
            self.values_emitted,
            self.values_skipped,
            self.values_failed
        )?;
        if let Some(reason) = &self.aborted {
            write!(f, " aborted=\"{}\"", reason)?;
        }
        Ok(())
    }
}

/// Runs scrapes against a [`MonitorApi`]
pub struct Scraper<A: MonitorApi> {
    api: Arc<A>,
    tokens: Arc<TokenCache>,
    aggregation: String,
}

impl<A: MonitorApi> Scraper<A> {
    pub fn new(api: Arc<A>, tokens: Arc<TokenCache>, aggregation: impl Into<String>) -> Self {
        Self {
            api,
            tokens,
            aggregation: aggregation.into(),
        }
    }

    /// Scrape every supported resource tagged with `tag_value`.
    ///
    /// Never fails: problems are logged and reflected in the summary.
    pub async fn scrape(&self, tag_value: &str, sink: &mut dyn SampleSink) -> ScrapeSummary {
        let mut summary = ScrapeSummary::default();

        info!("Get all resources tagged with {}", tag_value);
        let token = match self.tokens.acquire().await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to get access token: {}", e);
                summary.aborted = Some(e.to_string());
                return finish(summary);
            }
        };

        let resources = match self.api.list_resources(&token, tag_value).await {
            Ok(resources) => resources,
            Err(e) => {
                error!("Failed to list resources tagged with {}: {}", tag_value, e);
                summary.aborted = Some(e.to_string());
                return finish(summary);
            }
        };
        summary.resources_listed = resources.len();

        for resource in &resources {
            if !filter::is_supported(&resource.resource_type) {
                debug!("Skipping {} of unsupported type {}", resource.name, resource.resource_type);
                summary.resources_unsupported += 1;
                continue;
            }
            self.scrape_resource(resource, sink, &mut summary).await;
        }

        finish(summary)
    }

    /// Scrape one resource; every failure is logged and counted here
    async fn scrape_resource(&self, resource: &ResourceDescriptor, sink: &mut dyn SampleSink, summary: &mut ScrapeSummary) {
        let token = match self.tokens.acquire().await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to get access token for resource {}: {}", resource.name, e);
                summary.resources_failed += 1;
                return;
            }
        };

        info!("Retrieving metric definitions of resource [ {} ]", resource.name);
        let definitions = match self.api.metric_definitions(&token, &resource.id).await {
            Ok(definitions) => definitions,
            Err(e) => {
                error!("Failed to get metric definitions for {} ({}): {}", resource.name, resource.id, e);
                summary.resources_failed += 1;
                return;
            }
        };

        for batch in batch_metric_names(&definitions) {
            debug!("Fetching metrics [{}] of {}", batch, resource.name);
            let values = match self.api.metric_values(&token, &resource.id, &batch, &self.aggregation).await {
                Ok(values) => values,
                Err(e) => {
                    error!("Failed to get metrics [{}] for {}: {}", batch, resource.name, e);
                    summary.batches_failed += 1;
                    continue;
                }
            };
            summary.batches_fetched += 1;

            for value in &values {
                emit_value(resource, value, sink, summary);
            }
        }
    }
}

fn emit_value(resource: &ResourceDescriptor, value: &MetricValue, sink: &mut dyn SampleSink, summary: &mut ScrapeSummary) {
    let Some(point) = value.latest_point() else {
        debug!("No metric data returned for {} at target {}", value.name.value, resource.name);
        summary.values_skipped += 1;
        return;
    };

    let metric = match sanitizer::normalize(&value.name.value, &value.unit, point, &resource.resource_type) {
        Ok(metric) => metric,
        Err(e) => {
            warn!("Skipping metric {:?} of {}: {}", value.name.value, resource.name, e);
            summary.values_failed += 1;
            return;
        }
    };

    let labels = ResourceLabelSet::derive(&value.id, resource);
    match sink.record(&metric, &labels) {
        Ok(()) => summary.values_emitted += 1,
        Err(e) => {
            error!("Failed to record {} for {}: {}", metric.name, resource.name, e);
            summary.values_failed += 1;
        }
    }
}

fn finish(summary: ScrapeSummary) -> ScrapeSummary {
    info!("Finished scrape: {}", summary);
    summary
}
