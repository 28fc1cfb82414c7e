//! Metrics collection and reporting for ingest runs.
//!
//! - [`Metric`] trait defines the interface for custom metrics
//! - [`MetricsCollector`] manages metric registration and collection
//! - Built-in [`CounterMetric`] and [`GaugeMetric`]
//! - Metrics can be logged or saved to a JSON file
//!
//! Handing a collector to [`Ingestor::with_metrics`](crate::ingest::Ingestor::with_metrics)
//! makes each run record the counters named by the constants in this module,
//! plus the total execution time.
//!
//! # Example
//!
//! ```no_run
//! use rollcall::ingest::Ingestor;
//! use rollcall::metrics::{MetricsCollector, RECORDS_MERGED};
//! use rollcall::store::ShardedStore;
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = ShardedStore::new();
//! let metrics = MetricsCollector::new();
//! let report = Ingestor::new(&store).with_metrics(metrics.clone()).run("roster.csv");
//!
//! println!("merged {}", metrics.snapshot()[RECORDS_MERGED]);
//! metrics.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Data rows read by the producer, good or bad.
pub const LINES_READ: &str = "lines_read";
/// Records upserted by the merge workers.
pub const RECORDS_MERGED: &str = "records_merged";
/// Entries in the error report.
pub const PARSE_ERRORS: &str = "parse_errors";
/// Records in the store after the run.
pub const STORE_SIZE: &str = "store_size";

/// Trait for custom metrics.
pub trait Metric: Send + Sync + Any {
    /// The name of this metric (e.g., `records_merged`).
    fn name(&self) -> &str;

    /// The current value of this metric as a JSON value.
    fn value(&self) -> Value;

    /// Optional description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Cast to Any for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Thread-safe container for collecting run metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

struct MetricsCollectorInner {
    metrics: HashMap<String, Box<dyn Metric>>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsCollectorInner {
                metrics: HashMap::new(),
                start_time: None,
                end_time: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsCollectorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a custom metric.
    ///
    /// If a metric with the same name already exists, it will be replaced.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.lock()
            .metrics
            .insert(metric.name().to_string(), metric);
    }

    /// Record the start time of a run.
    ///
    /// Only the first call counts, so a collector shared by several runs
    /// measures from the start of the first one to the end of the last.
    pub fn record_start(&self) {
        self.lock().start_time.get_or_insert_with(Instant::now);
    }

    /// Record the end time of a run.
    pub fn record_end(&self) {
        self.lock().end_time = Some(Instant::now());
    }

    /// Get the elapsed execution time, if available.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start_time, inner.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Increment a counter metric by name.
    ///
    /// If the metric doesn't exist, it is created as a [`CounterMetric`]. A
    /// metric of another type registered under `name` is replaced.
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut inner = self.lock();
        if let Some(counter) = inner
            .metrics
            .get_mut(name)
            .and_then(|m| m.as_any_mut().downcast_mut::<CounterMetric>())
        {
            counter.count += value;
            return;
        }
        inner.metrics.insert(
            name.to_string(),
            Box::new(CounterMetric::with_value(name, value)),
        );
    }

    /// Set a counter metric to a specific value.
    pub fn set_counter(&self, name: &str, value: u64) {
        self.register(Box::new(CounterMetric::with_value(name, value)));
    }

    /// Set a gauge metric to a specific value.
    pub fn set_gauge(&self, name: &str, value: f64) {
        self.register(Box::new(GaugeMetric::new(name, value)));
    }

    /// Get all metrics as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut metrics_json = serde_json::Map::new();

        for (name, metric) in &inner.metrics {
            let mut metric_obj = serde_json::Map::new();
            metric_obj.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                metric_obj.insert("description".to_string(), json!(desc));
            }
            metrics_json.insert(name.clone(), Value::Object(metric_obj));
        }

        if let (Some(start), Some(end)) = (inner.start_time, inner.end_time) {
            let elapsed_ms = end.duration_since(start).as_millis();
            metrics_json.insert(
                "execution_time_ms".to_string(),
                json!({
                    "value": elapsed_ms,
                    "description": "Total ingest execution time in milliseconds",
                }),
            );
        }
        Value::Object(metrics_json)
    }

    /// Emit every metric, sorted by name, as an `info` event.
    pub fn log_summary(&self) {
        let mut snapshot: Vec<_> = self.snapshot().into_iter().collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(elapsed) = self.elapsed() {
            tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "ingest metrics");
        }
        for (name, value) in snapshot {
            tracing::info!(metric = %name, %value);
        }
    }

    /// Save all metrics to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Get a snapshot of all metric names and values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock()
            .metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.value()))
            .collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Built-in Metrics ==========

/// A simple counter metric.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A gauge metric that holds a single numeric value.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
