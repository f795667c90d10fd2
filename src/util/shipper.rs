//! Best-effort log shipping to Elasticsearch.
//!
//! Records are turned into [`LogEvent`]s and pushed onto a bounded queue with
//! `try_send`. A background task drains the queue and posts each event. A full
//! queue or an unreachable node drops events; neither ever reaches the caller.

use chrono::{DateTime, Utc};
use log::{LevelFilter, Log, Metadata, Record};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::LogShippingConfig;

/// Only records from this crate are shipped; the drain task's HTTP stack
/// (reqwest, hyper, h2, want, rustls, mio) must never feed the queue
const SHIPPED_TARGET: &str = "azure_exporter";

/// One shipped log document
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "requestID")]
    pub request_id: String,
    pub level: String,
    pub message: String,
    pub target: String,
    pub host: String,
    pub environment: String,
    pub release: String,
}

/// Fields shared by every event from this process
#[derive(Debug, Clone)]
struct EventBase {
    request_id: String,
    host: String,
    environment: String,
    release: String,
}

/// `log::Log` implementation feeding the shipping queue
pub struct ElasticShipper {
    sender: mpsc::Sender<LogEvent>,
    base: EventBase,
    level: LevelFilter,
    dropped: Arc<AtomicU64>,
}

impl ElasticShipper {
    /// Create the shipper and spawn its drain task on the current runtime
    pub fn spawn(config: &LogShippingConfig, level: LevelFilter) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));
        let shipper = Self::with_sender(tx, config, level);

        let client = reqwest::Client::new();
        let host = config.host.clone();
        let index = config.index.clone();
        let environment = config.environment.clone();
        tokio::spawn(drain(rx, client, host, index, environment));

        shipper
    }

    /// Build a shipper around an existing queue
    pub fn with_sender(sender: mpsc::Sender<LogEvent>, config: &LogShippingConfig, level: LevelFilter) -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            sender,
            base: EventBase {
                request_id: Uuid::new_v4().to_string(),
                host,
                environment: config.environment.clone(),
                release: config.release.clone(),
            },
            level,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of events dropped because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn event(&self, record: &Record<'_>) -> LogEvent {
        LogEvent {
            timestamp: Utc::now(),
            request_id: self.base.request_id.clone(),
            level: record.level().to_string(),
            message: record.args().to_string(),
            target: record.target().to_string(),
            host: self.base.host.clone(),
            environment: self.base.environment.clone(),
            release: self.base.release.clone(),
        }
    }
}

impl Log for ElasticShipper {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level && is_shipped_target(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if self.sender.try_send(self.event(record)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn flush(&self) {}
}

fn is_shipped_target(target: &str) -> bool {
    target
        .strip_prefix(SHIPPED_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Index URL for an event shipped at `at`
pub fn index_url(host: &str, index: &str, environment: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}/{}-{}-{}/logs",
        host.trim_end_matches('/'),
        index,
        environment,
        at.format("%Y-%m-%d")
    )
}

async fn drain(
    mut rx: mpsc::Receiver<LogEvent>,
    client: reqwest::Client,
    host: String,
    index: String,
    environment: String,
) {
    while let Some(event) = rx.recv().await {
        let url = index_url(&host, &index, &environment, event.timestamp);
        // The log facade would route back into this queue, so report on stderr.
        match client.post(&url).json(&event).send().await {
            Ok(resp) if resp.status().as_u16() != 201 => {
                eprintln!("Error sending logs to elasticsearch: status {}", resp.status());
            }
            Ok(_) => {}
            Err(e) => eprintln!("Error in post request to elasticsearch: {}", e),
        }
    }
}
