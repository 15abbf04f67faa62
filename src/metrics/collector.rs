// src/metrics/collector.rs
use crate::status::GatewayState;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // HTTP metrics
    pub requests_total: IntCounterVec,
    pub request_duration_seconds: HistogramVec,

    // Probe metrics
    pub probe_total: IntCounterVec,
    pub probe_duration_seconds: Histogram,
    pub gateway_up: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("status_http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status_code"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "status_http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["path"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        let probe_total = IntCounterVec::new(
            Opts::new("status_probe_total", "Gateway probes by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(probe_total.clone()))?;

        let probe_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "status_probe_duration_seconds",
                "Gateway probe duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let gateway_up = IntGauge::new(
            "status_gateway_up",
            "Last probe result (1=online, 0=offline, -1=error)",
        )?;
        registry.register(Box::new(gateway_up.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            probe_total,
            probe_duration_seconds,
            gateway_up,
        })
    }

    pub fn record_request(&self, method: &str, path: &str, status_code: u16, duration: Duration) {
        let path = route_label(path);
        let status = status_code.to_string();
        self.requests_total
            .with_label_values(&[method, path, &status])
            .inc();

        self.request_duration_seconds
            .with_label_values(&[path])
            .observe(duration.as_secs_f64());
    }

    pub fn record_probe(&self, state: GatewayState, duration: Duration) {
        self.probe_total.with_label_values(&[state.as_str()]).inc();
        self.probe_duration_seconds.observe(duration.as_secs_f64());

        let value = match state {
            GatewayState::Online => 1,
            GatewayState::Offline => 0,
            GatewayState::Error => -1,
        };
        self.gateway_up.set(value);
    }
}

// Unknown paths share one label so scanners can't blow up cardinality.
fn route_label(path: &str) -> &str {
    match path {
        "/api/status" | "/health" => path,
        _ => "other",
    }
}
