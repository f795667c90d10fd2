use crate::azure::models::MetricDefinition;

/// Most metric names the metrics endpoint accepts per request
pub const MAX_METRICS_PER_BATCH: usize = 20;

/// Split definitions into comma-joined batches of at most
/// [`MAX_METRICS_PER_BATCH`] names, preserving order.
///
/// Blank names are dropped and do not count toward a batch.
pub fn batch_metric_names(definitions: &[MetricDefinition]) -> Vec<String> {
    let names: Vec<&str> = definitions
        .iter()
        .map(|definition| definition.name.value.as_str())
        .filter(|name| !name.trim().is_empty())
        .collect();

    names
        .chunks(MAX_METRICS_PER_BATCH)
        .map(|chunk| chunk.join(","))
        .collect()
}
