//! Ingest run configuration.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tuning knobs for one ingest run.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use rollcall::ingest::IngestConfig;
///
/// let cfg: IngestConfig = serde_json::from_str(r#"{"workers": 4, "deadline_ms": 30000}"#).unwrap();
/// assert_eq!(cfg.workers, 4);
/// assert_eq!(cfg.record_queue_capacity, 1000);
/// assert_eq!(cfg.deadline().map(|d| d.as_secs()), Some(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Number of merge workers draining the record queue.
    pub workers: usize,
    /// Capacity of the parsed-record queue between producer and workers.
    pub record_queue_capacity: usize,
    /// Capacity of the per-line error queue.
    pub error_queue_capacity: usize,
    /// Whether the first line is a header to skip.
    pub has_headers: bool,
    /// Abort the run once this many milliseconds have passed.
    pub deadline_ms: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            record_queue_capacity: 1000,
            error_queue_capacity: 1000,
            has_headers: true,
            deadline_ms: None,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_record_queue_capacity(mut self, capacity: usize) -> Self {
        self.record_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_error_queue_capacity(mut self, capacity: usize) -> Self {
        self.error_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Line number of the first data row.
    pub fn first_line(&self) -> i64 {
        if self.has_headers { 2 } else { 1 }
    }

    /// Reject values that would leave the pipeline unable to make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("workers", self.workers),
            ("record_queue_capacity", self.record_queue_capacity),
            ("error_queue_capacity", self.error_queue_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        Ok(())
    }

    /// Load a JSON config file and validate it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("validate config {}", path.display()))?;
        Ok(cfg)
    }

    /// Apply overrides from the process environment.
    ///
    /// Recognized variables: `ROLLCALL_WORKERS`, `ROLLCALL_RECORD_QUEUE`,
    /// `ROLLCALL_ERROR_QUEUE`, `ROLLCALL_DEADLINE_MS`.
    pub fn from_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, then validate.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::Invalid { key, value: raw })
                })
                .transpose()
        };
        // Counts must fit the target's usize rather than wrap.
        let count = |key: &'static str| -> Result<Option<usize>, ConfigError> {
            parse(key)?
                .map(|v| {
                    usize::try_from(v).map_err(|_| ConfigError::Invalid {
                        key,
                        value: v.to_string(),
                    })
                })
                .transpose()
        };
        if let Some(v) = count("ROLLCALL_WORKERS")? {
            self.workers = v;
        }
        if let Some(v) = count("ROLLCALL_RECORD_QUEUE")? {
            self.record_queue_capacity = v;
        }
        if let Some(v) = count("ROLLCALL_ERROR_QUEUE")? {
            self.error_queue_capacity = v;
        }
        if let Some(v) = parse("ROLLCALL_DEADLINE_MS")? {
            self.deadline_ms = Some(v);
        }
        self.validate()?;
        Ok(self)
    }
}
