use log::debug;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;

use crate::error::Result;
use crate::labels::{LABEL_NAMES, ResourceLabelSet};
use crate::sanitizer::NormalizedMetric;

/// Receives normalized metric values during a scrape
pub trait SampleSink: Send {
    /// Record the four gauges of one metric value
    fn record(&mut self, metric: &NormalizedMetric, labels: &ResourceLabelSet) -> Result<()>;
}

/// Suffixes of the gauges emitted per metric value
pub const SAMPLE_SUFFIXES: [&str; 4] = ["_total", "_average", "_min", "_max"];

/// Sink backed by a per-scrape Prometheus registry
pub struct PrometheusSink {
    registry: Registry,
    gauges: HashMap<String, GaugeVec>,
}

impl PrometheusSink {
    /// Create a sink whose registry already carries the build info gauge
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let build_info = GaugeVec::new(
            Opts::new(
                "azure_exporter_build_info",
                "A metric with a constant '1' value labeled by version from which azure_exporter was built.",
            ),
            &["version"],
        )?;
        build_info.with_label_values(&[crate::VERSION]).set(1.0);
        registry.register(Box::new(build_info))?;

        Ok(Self {
            registry,
            gauges: HashMap::new(),
        })
    }

    fn gauge(&mut self, name: &str) -> Result<GaugeVec> {
        if let Some(gauge) = self.gauges.get(name) {
            return Ok(gauge.clone());
        }

        let gauge = GaugeVec::new(Opts::new(name, name), &LABEL_NAMES)?;
        self.registry.register(Box::new(gauge.clone()))?;
        debug!("Registered gauge {}", name);
        self.gauges.insert(name.to_string(), gauge.clone());
        Ok(gauge)
    }

    /// Encode everything recorded in the text exposition format
    pub fn render(&self) -> Result<(Vec<u8>, String)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((buffer, encoder.format_type().to_string()))
    }
}

impl SampleSink for PrometheusSink {
    fn record(&mut self, metric: &NormalizedMetric, labels: &ResourceLabelSet) -> Result<()> {
        let values = [metric.total, metric.average, metric.minimum, metric.maximum];

        // Resolve all four before setting any, so a value is emitted whole or not at all
        let mut gauges = Vec::with_capacity(SAMPLE_SUFFIXES.len());
        for suffix in SAMPLE_SUFFIXES {
            let gauge = self.gauge(&format!("{}{}", metric.name, suffix))?;
            gauges.push(gauge.get_metric_with_label_values(&labels.values())?);
        }

        for (gauge, value) in gauges.iter().zip(values) {
            gauge.set(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(name: &str, base: f64) -> NormalizedMetric {
        NormalizedMetric {
            name: name.to_string(),
            total: base,
            average: base / 2.0,
            minimum: 1.0,
            maximum: base * 2.0,
        }
    }

    fn labels(name: &str) -> ResourceLabelSet {
        ResourceLabelSet {
            resource_group: "rg".to_string(),
            resource_type: "Microsoft.Web/sites".to_string(),
            resource_name: name.to_string(),
            resource_environment: "dev".to_string(),
        }
    }

    fn render(sink: &PrometheusSink) -> String {
        String::from_utf8(sink.render().unwrap().0).unwrap()
    }

    #[test]
    fn test_four_gauges_per_value() {
        let mut sink = PrometheusSink::new().unwrap();
        sink.record(&metric("azure_microsoft_web_sites_requests_amount", 10.0), &labels("api-dev"))
            .unwrap();

        let text = render(&sink);
        for suffix in SAMPLE_SUFFIXES {
            assert!(text.contains(&format!("# TYPE azure_microsoft_web_sites_requests_amount{} gauge", suffix)));
        }
        assert!(text.contains(
            r#"azure_microsoft_web_sites_requests_amount_total{resource_environment="dev",resource_group="rg",resource_name="api-dev",resource_type="Microsoft.Web/sites"} 10"#
        ));
        assert!(text.contains(
            r#"azure_microsoft_web_sites_requests_amount_max{resource_environment="dev",resource_group="rg",resource_name="api-dev",resource_type="Microsoft.Web/sites"} 20"#
        ));
        assert!(text.contains(r#"azure_exporter_build_info{version=""#));
    }

    #[test]
    fn test_shared_name_across_resources_reuses_gauge() {
        let mut sink = PrometheusSink::new().unwrap();
        sink.record(&metric("azure_microsoft_web_sites_cputime_seconds", 1.0), &labels("api-dev"))
            .unwrap();
        sink.record(&metric("azure_microsoft_web_sites_cputime_seconds", 3.0), &labels("web-dev"))
            .unwrap();

        assert_eq!(sink.gauges.len(), 4);
        let text = render(&sink);
        assert!(text.contains(r#"resource_name="api-dev""#));
        assert!(text.contains(r#"resource_name="web-dev""#));
    }

    #[test]
    fn test_empty_sink_renders_build_info_only() {
        let sink = PrometheusSink::new().unwrap();
        let (body, content_type) = sink.render().unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert!(String::from_utf8(body).unwrap().contains("azure_exporter_build_info"));
    }
}
