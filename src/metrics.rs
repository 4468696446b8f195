//! Metrics Module
//!
//! Prometheus counters and histograms for tool usage and HTTP traffic,
//! exposed in the text format and read back for the dashboard.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

use crate::cache::CacheStats;
use crate::error::{MetricsError, MetricsResult};

const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Longest label value kept; longer values are cut to bound label size.
pub const MAX_LABEL_VALUE_LEN: usize = 64;

fn truncate_label(value: &str) -> &str {
    if value.len() <= MAX_LABEL_VALUE_LEN {
        return value;
    }
    let mut end = MAX_LABEL_VALUE_LEN;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

// == Tool Counter ==
/// Per-tool success counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCounter {
    DocumentProcessed,
    ComplianceCheck,
    RiskPrediction,
    ChatInteraction,
}

/// Totals shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub documents_processed: u64,
    pub compliance_checks: u64,
    pub risk_predictions: u64,
    pub chat_interactions: u64,
    pub total_requests: u64,
    /// Mean request latency in seconds, 0 before any request
    pub avg_processing_time: f64,
    /// Share of requests that did not end in a 5xx, 1 before any request
    pub success_rate: f64,
}

// == Metrics Collector ==
/// Service metrics registered on a private Prometheus registry.
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Registry,
    documents_processed: IntCounter,
    compliance_checks: IntCounter,
    risk_predictions: IntCounter,
    chat_interactions: IntCounter,
    /// Requests by `method`, `endpoint` and `status_code`
    requests: IntCounterVec,
    /// Latency by `method` and `endpoint`
    request_duration: HistogramVec,
    /// Compute cache counters, copied in at scrape time
    cache_events: IntGaugeVec,
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> MetricsResult<IntCounter> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl MetricsCollector {
    /// Creates the collector and registers every metric.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric fails to register.
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let documents_processed = register_counter(
            &registry,
            "documents_processed_total",
            "Total documents processed",
        )?;
        let compliance_checks = register_counter(
            &registry,
            "compliance_checks_total",
            "Total compliance checks",
        )?;
        let risk_predictions = register_counter(
            &registry,
            "risk_predictions_total",
            "Total risk predictions",
        )?;
        let chat_interactions = register_counter(
            &registry,
            "chat_interactions_total",
            "Total chat interactions",
        )?;

        let requests = IntCounterVec::new(
            Opts::new(HTTP_REQUESTS_TOTAL, "Total HTTP requests"),
            &["method", "endpoint", "status_code"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(HTTP_REQUEST_DURATION, "Request duration"),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let cache_events = IntGaugeVec::new(
            Opts::new(
                "compute_cache_events",
                "Compute cache events since start, by kind",
            ),
            &["event"],
        )?;
        registry.register(Box::new(cache_events.clone()))?;

        Ok(Self {
            registry,
            documents_processed,
            compliance_checks,
            risk_predictions,
            chat_interactions,
            requests,
            request_duration,
            cache_events,
        })
    }

    fn counter(&self, which: ToolCounter) -> &IntCounter {
        match which {
            ToolCounter::DocumentProcessed => &self.documents_processed,
            ToolCounter::ComplianceCheck => &self.compliance_checks,
            ToolCounter::RiskPrediction => &self.risk_predictions,
            ToolCounter::ChatInteraction => &self.chat_interactions,
        }
    }

    // == Record Tool ==
    pub fn incr(&self, which: ToolCounter) {
        self.counter(which).inc();
    }

    // == Record Request ==
    /// Records one finished HTTP request.
    pub fn record_request(
        &self,
        method: &str,
        path: &str,
        status: u16,
        duration: std::time::Duration,
    ) {
        let method = truncate_label(method);
        let path = truncate_label(path);
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method, path])
            .observe(duration.as_secs_f64());
    }

    // == Snapshot ==
    /// Reads the tool counters and derives request totals from the
    /// gathered request families.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut total = 0u64;
        let mut server_errors = 0u64;
        let mut duration_sum = 0.0;
        let mut duration_count = 0u64;

        for family in self.registry.gather() {
            match family.get_name() {
                HTTP_REQUESTS_TOTAL => {
                    for metric in family.get_metric() {
                        let count = metric.get_counter().get_value() as u64;
                        total += count;
                        let is_server_error = metric.get_label().iter().any(|label| {
                            label.get_name() == "status_code" && label.get_value().starts_with('5')
                        });
                        if is_server_error {
                            server_errors += count;
                        }
                    }
                }
                HTTP_REQUEST_DURATION => {
                    for metric in family.get_metric() {
                        let histogram = metric.get_histogram();
                        duration_sum += histogram.get_sample_sum();
                        duration_count += histogram.get_sample_count();
                    }
                }
                _ => {}
            }
        }

        let avg_processing_time = if duration_count == 0 {
            0.0
        } else {
            duration_sum / duration_count as f64
        };
        let success_rate = if total == 0 {
            1.0
        } else {
            (total - server_errors) as f64 / total as f64
        };

        MetricsSnapshot {
            documents_processed: self.documents_processed.get(),
            compliance_checks: self.compliance_checks.get(),
            risk_predictions: self.risk_predictions.get(),
            chat_interactions: self.chat_interactions.get(),
            total_requests: total,
            avg_processing_time,
            success_rate,
        }
    }

    // == Prometheus Exposition ==
    /// Encodes every metric in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render_prometheus(&self, cache: &CacheStats) -> MetricsResult<String> {
        for (event, value) in [
            ("hit", cache.hits),
            ("miss", cache.misses),
            ("store_error", cache.store_errors),
            ("computation", cache.computations),
        ] {
            self.cache_events
                .with_label_values(&[event])
                .set(i64::try_from(value).unwrap_or(i64::MAX));
        }

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}
