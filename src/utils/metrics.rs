use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::types::Category;

/// Latency samples kept for avg/p50/p95; older samples are dropped
pub const LATENCY_WINDOW: usize = 1024;

/// Process-wide metrics collector.
///
/// Cheap to clone; all clones share the same counters.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    // Requests
    requests_total: AtomicUsize,
    requests_no_image: AtomicUsize,
    decode_failures: AtomicUsize,

    // Model calls
    model_calls_total: AtomicUsize,
    model_calls_success: AtomicUsize,
    model_calls_failed: AtomicUsize,
    model_calls_timed_out: AtomicUsize,
    model_tokens_input: AtomicU64,
    model_tokens_output: AtomicU64,
    model_latency_ms: RwLock<VecDeque<u64>>,

    // Per-category outcomes
    category_fallbacks: DashMap<Category, AtomicUsize>,
    off_list_labels: DashMap<Category, AtomicUsize>,

    circuit_breaker_trips: AtomicUsize,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                requests_total: AtomicUsize::new(0),
                requests_no_image: AtomicUsize::new(0),
                decode_failures: AtomicUsize::new(0),
                model_calls_total: AtomicUsize::new(0),
                model_calls_success: AtomicUsize::new(0),
                model_calls_failed: AtomicUsize::new(0),
                model_calls_timed_out: AtomicUsize::new(0),
                model_tokens_input: AtomicU64::new(0),
                model_tokens_output: AtomicU64::new(0),
                model_latency_ms: RwLock::new(VecDeque::with_capacity(LATENCY_WINDOW)),
                category_fallbacks: DashMap::new(),
                off_list_labels: DashMap::new(),
                circuit_breaker_trips: AtomicUsize::new(0),
                start_time: Instant::now(),
            }),
        }
    }

    pub fn record_request(&self) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_image(&self) {
        self.inner.requests_no_image.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.inner.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_model_call(&self, success: bool, duration: Duration) {
        self.inner.model_calls_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.inner.model_calls_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.model_calls_failed.fetch_add(1, Ordering::Relaxed);
        }
        let mut latency = self.inner.model_latency_ms.write();
        if latency.len() == LATENCY_WINDOW {
            latency.pop_front();
        }
        latency.push_back(duration.as_millis() as u64);
    }

    pub fn record_model_timeout(&self) {
        self.inner.model_calls_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_token_usage(&self, input_tokens: u64, output_tokens: u64) {
        self.inner.model_tokens_input.fetch_add(input_tokens, Ordering::Relaxed);
        self.inner.model_tokens_output.fetch_add(output_tokens, Ordering::Relaxed);
    }

    pub fn record_category_fallback(&self, category: Category) {
        self.inner
            .category_fallbacks
            .entry(category)
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_off_list_label(&self, category: Category) {
        self.inner
            .off_list_labels
            .entry(category)
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_circuit_breaker_trip(&self) {
        self.inner.circuit_breaker_trips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut latency: Vec<u64> = self.inner.model_latency_ms.read().iter().copied().collect();
        latency.sort_unstable();
        let model_latency_avg_ms = avg(&latency);
        let model_latency_p50_ms = percentile(&latency, 0.5);
        let model_latency_p95_ms = percentile(&latency, 0.95);

        MetricsSnapshot {
            requests_total: self.inner.requests_total.load(Ordering::Relaxed),
            requests_no_image: self.inner.requests_no_image.load(Ordering::Relaxed),
            decode_failures: self.inner.decode_failures.load(Ordering::Relaxed),
            model_calls_total: self.inner.model_calls_total.load(Ordering::Relaxed),
            model_calls_success: self.inner.model_calls_success.load(Ordering::Relaxed),
            model_calls_failed: self.inner.model_calls_failed.load(Ordering::Relaxed),
            model_calls_timed_out: self.inner.model_calls_timed_out.load(Ordering::Relaxed),
            model_tokens_input: self.inner.model_tokens_input.load(Ordering::Relaxed),
            model_tokens_output: self.inner.model_tokens_output.load(Ordering::Relaxed),
            model_latency_avg_ms,
            model_latency_p50_ms,
            model_latency_p95_ms,
            category_fallbacks: counts_by_category(&self.inner.category_fallbacks),
            off_list_labels: counts_by_category(&self.inner.off_list_labels),
            circuit_breaker_trips: self.inner.circuit_breaker_trips.load(Ordering::Relaxed),
            uptime_seconds: self.inner.start_time.elapsed().as_secs(),
        }
    }

    /// Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut out = String::new();

        let counters: [(&str, &str, u64); 10] = [
            ("requests_total", "Total /process_image requests", s.requests_total as u64),
            ("requests_no_image_total", "Requests rejected for a missing image", s.requests_no_image as u64),
            ("image_decode_failures_total", "Uploaded images that failed to decode", s.decode_failures as u64),
            ("model_calls_total", "Vision model calls attempted", s.model_calls_total as u64),
            ("model_calls_success_total", "Vision model calls that returned text", s.model_calls_success as u64),
            ("model_calls_failed_total", "Vision model calls that failed", s.model_calls_failed as u64),
            ("model_calls_timed_out_total", "Vision model calls that hit the timeout", s.model_calls_timed_out as u64),
            ("model_tokens_input_total", "Prompt tokens reported by the model API", s.model_tokens_input),
            ("model_tokens_output_total", "Completion tokens reported by the model API", s.model_tokens_output),
            ("circuit_breaker_trips_total", "Times the model circuit breaker opened", s.circuit_breaker_trips as u64),
        ];
        for (name, help, value) in counters {
            out.push_str(&format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n\n"));
        }

        out.push_str("# HELP model_latency_avg_ms Average vision model latency in milliseconds\n");
        out.push_str("# TYPE model_latency_avg_ms gauge\n");
        out.push_str(&format!("model_latency_avg_ms {}\n\n", s.model_latency_avg_ms));

        out.push_str("# HELP category_fallbacks_total Categories answered with N/A\n");
        out.push_str("# TYPE category_fallbacks_total counter\n");
        for category in Category::ALL {
            let value = s.category_fallbacks.get(category.name()).copied().unwrap_or(0);
            out.push_str(&format!("category_fallbacks_total{{category=\"{}\"}} {}\n", category, value));
        }
        out.push('\n');

        out.push_str("# HELP off_list_labels_total Normalized answers outside the prompted label set\n");
        out.push_str("# TYPE off_list_labels_total counter\n");
        for category in Category::ALL {
            let value = s.off_list_labels.get(category.name()).copied().unwrap_or(0);
            out.push_str(&format!("off_list_labels_total{{category=\"{}\"}} {}\n", category, value));
        }
        out.push('\n');

        out.push_str("# HELP uptime_seconds Application uptime in seconds\n");
        out.push_str("# TYPE uptime_seconds counter\n");
        out.push_str(&format!("uptime_seconds {}\n", s.uptime_seconds));
        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_total: usize,
    pub requests_no_image: usize,
    pub decode_failures: usize,
    pub model_calls_total: usize,
    pub model_calls_success: usize,
    pub model_calls_failed: usize,
    pub model_calls_timed_out: usize,
    pub model_tokens_input: u64,
    pub model_tokens_output: u64,
    pub model_latency_avg_ms: u64,
    pub model_latency_p50_ms: u64,
    pub model_latency_p95_ms: u64,
    pub category_fallbacks: BTreeMap<String, usize>,
    pub off_list_labels: BTreeMap<String, usize>,
    pub circuit_breaker_trips: usize,
    pub uptime_seconds: u64,
}

fn counts_by_category(map: &DashMap<Category, AtomicUsize>) -> BTreeMap<String, usize> {
    map.iter()
        .map(|entry| (entry.key().name().to_string(), entry.value().load(Ordering::Relaxed)))
        .collect()
}

/// `sorted` must be in ascending order
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p) as usize;
    sorted[idx]
}

fn avg(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    values.iter().sum::<u64>() / values.len() as u64
}
