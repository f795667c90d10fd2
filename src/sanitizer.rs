//! Azure metric naming to Prometheus naming.

use crate::azure::models::DataPoint;
use crate::error::{ExporterError, Result};

/// A metric value ready for emission: final name plus its latest aggregates
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetric {
    pub name: String,
    pub total: f64,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
}

pub fn convert_millis_to_seconds(millis: f64) -> f64 {
    millis / 1000.0
}

/// Build a Prometheus-safe metric name from an Azure name, unit and resource type.
///
/// The result only contains `[a-zA-Z0-9_:]`.
pub fn sanitize_metric_name(name: &str, unit: &str, resource_type: &str) -> Result<String> {
    if name.is_empty() || unit.is_empty() {
        return Err(ExporterError::Validation(
            "Metric name or metric unit not found".to_string(),
        ));
    }

    let mut unit = unit.to_lowercase();
    if unit == "total" || unit == "count" {
        unit = "amount".to_string();
    }

    let prefix = format!("azure_{}", resource_type.replace(['.', '/'], "_"));
    let candidate = format!("{}_{}", prefix, name.replace(' ', "_"));
    let metric_name = format!("{}_{}", candidate.to_lowercase(), unit).replace('/', "_per_");

    Ok(metric_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect())
}

/// Name a metric value and scale its aggregates.
///
/// Millisecond units are emitted as seconds: the name uses `seconds` and the
/// four aggregates are divided by 1000, always together.
pub fn normalize(name: &str, unit: &str, point: &DataPoint, resource_type: &str) -> Result<NormalizedMetric> {
    if unit.eq_ignore_ascii_case("milliseconds") {
        return Ok(NormalizedMetric {
            name: sanitize_metric_name(name, "seconds", resource_type)?,
            total: convert_millis_to_seconds(point.total),
            average: convert_millis_to_seconds(point.average),
            minimum: convert_millis_to_seconds(point.minimum),
            maximum: convert_millis_to_seconds(point.maximum),
        });
    }

    Ok(NormalizedMetric {
        name: sanitize_metric_name(name, unit, resource_type)?,
        total: point.total,
        average: point.average,
        minimum: point.minimum,
        maximum: point.maximum,
    })
}
