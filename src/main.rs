//! Rollcall CLI - ingest roster files and report bad lines.

use anyhow::{Context, Result};
use clap::Parser;
use rollcall::ingest::{IngestConfig, IngestErrorReport, Ingestor, RunOutcome};
use rollcall::intake::{expand_glob, ingest_paths};
use rollcall::logging::{LogConfig, LogFormat, LogLevel, init_logging};
use rollcall::metrics::MetricsCollector;
use rollcall::store::{DEFAULT_SHARDS, RecordStore, ShardedStore};
use std::path::PathBuf;
use std::process::ExitCode;

/// Ingest roster files into an in-memory store and report bad lines.
#[derive(Debug, Parser)]
#[command(name = "rollcall", version, about)]
struct Cli {
    /// Files or glob patterns to ingest, in order.
    #[arg(required = true)]
    patterns: Vec<String>,

    /// JSON file with ingest settings; flags override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of merge workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Capacity of the parsed-record queue.
    #[arg(long)]
    record_queue: Option<usize>,

    /// Capacity of the per-line error queue.
    #[arg(long)]
    error_queue: Option<usize>,

    /// Stop each run after this many milliseconds.
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,

    /// Number of store shards.
    #[arg(long, default_value_t = DEFAULT_SHARDS)]
    shards: usize,

    /// Input files have no header line.
    #[arg(long)]
    no_header: bool,

    /// Write the merged records as JSON.
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,

    /// Write the per-file error reports as JSON.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Write run metrics as JSON.
    #[arg(long, value_name = "PATH")]
    metrics: Option<PathBuf>,

    #[arg(long, env = "ROLLCALL_LOG_LEVEL")]
    log_level: Option<LogLevel>,

    #[arg(long, env = "ROLLCALL_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn ingest_config(&self) -> Result<IngestConfig> {
        let base = match &self.config {
            Some(path) => IngestConfig::from_json_file(path)?,
            None => IngestConfig::default(),
        };
        let mut config = base.from_env()?;
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(capacity) = self.record_queue {
            config = config.with_record_queue_capacity(capacity);
        }
        if let Some(capacity) = self.error_queue {
            config = config.with_error_queue_capacity(capacity);
        }
        if let Some(ms) = self.deadline_ms {
            config.deadline_ms = Some(ms);
        }
        if self.no_header {
            config = config.with_headers(false);
        }
        config.validate()?;
        Ok(config)
    }

    fn log_config(&self) -> Result<LogConfig> {
        let mut config = LogConfig::from_env()?;
        if let Some(level) = self.log_level {
            config = config.with_level(level);
        }
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        Ok(config)
    }

    /// Literal paths are kept even when missing so they show up as open failures.
    fn input_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for pattern in &self.patterns {
            if pattern.contains(['*', '?', '[']) {
                let matched = expand_glob(pattern)?;
                if matched.is_empty() {
                    tracing::warn!(pattern = %pattern, "pattern matched no files");
                }
                paths.extend(matched);
            } else {
                paths.push(PathBuf::from(pattern));
            }
        }
        Ok(paths)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log_config()?)?;

    let config = cli.ingest_config()?;
    let paths = cli.input_paths()?;
    tracing::info!(files = paths.len(), workers = config.workers, shards = cli.shards, "starting ingest");

    let store = ShardedStore::with_shards(cli.shards);
    let metrics = MetricsCollector::new();
    let ingestor = Ingestor::new(&store)
        .with_config(config)
        .with_metrics(metrics.clone());

    let files = ingest_paths(&ingestor, &paths);
    for file in &files {
        file.report.log_errors();
    }
    tracing::info!(files = files.len(), records = store.len(), "ingest complete");
    metrics.log_summary();

    if let Some(path) = &cli.dump {
        let json = serde_json::to_string_pretty(&store.snapshot())?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    }
    if let Some(path) = &cli.report {
        let reports: Vec<&IngestErrorReport> = files.iter().map(|f| &f.report).collect();
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    }
    if let Some(path) = &cli.metrics {
        metrics.save_to_file(&path.to_string_lossy())?;
    }

    if files
        .iter()
        .any(|f| f.report.has_file_error() || f.report.outcome() == RunOutcome::ReadFailed)
    {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
