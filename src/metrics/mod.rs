//! Metrics collection for outbound Vision API calls

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec,
    HistogramVec, Opts, Registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    pub vision_requests: CounterVec,
    pub vision_request_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let vision_requests = register_counter_vec_with_registry!(
            Opts::new("vision_api_requests_total", "Total Vision API requests"),
            &["operation", "status"],
            registry
        )?;

        let vision_request_duration = register_histogram_vec_with_registry!(
            "vision_api_request_duration_seconds",
            "Vision API request duration in seconds",
            &["operation"],
            registry
        )?;

        Ok(Self {
            registry,
            vision_requests,
            vision_request_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record the outcome of one operation; `status` is "success" or an error kind
    pub fn record(&self, operation: &str, status: &str, elapsed_secs: f64) {
        self.vision_requests
            .with_label_values(&[operation, status])
            .inc();
        self.vision_request_duration
            .with_label_values(&[operation])
            .observe(elapsed_secs);
    }

    /// Count for one operation/status pair
    pub fn request_count(&self, operation: &str, status: &str) -> f64 {
        self.vision_requests
            .with_label_values(&[operation, status])
            .get()
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_record_and_export() {
        let metrics = Metrics::new().unwrap();
        metrics.record("create_project", "success", 0.05);
        metrics.record("create_project", "request", 0.02);
        metrics.record("create_project", "success", 0.01);

        assert_eq!(metrics.request_count("create_project", "success"), 2.0);
        assert_eq!(metrics.request_count("create_project", "request"), 1.0);

        let text = metrics.export_prometheus();
        assert!(text.contains("vision_api_requests_total"));
        assert!(text.contains("operation=\"create_project\""));
    }
}
