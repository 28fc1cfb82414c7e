//! Bulk ingest of a delimited roster file into a [`RecordStore`].
//!
//! A run moves through `Opening -> Streaming -> Draining -> Done`:
//!
//! - **Opening**: the file is opened (and decompressed when needed). Failure
//!   ends the run with a single file-level [`ParseError`] at line `-1`.
//! - **Streaming**: one producer thread reads and parses rows, sending good
//!   records to a bounded queue and failures to the error queue. A pool of
//!   merge workers (10 by default) upserts records as they arrive. The
//!   producer closing the record queue is the only stop condition for the
//!   workers. If the input itself fails partway, streaming ends and the run's
//!   outcome is [`RunOutcome::ReadFailed`].
//! - **Draining**: the producer and every worker are joined, then the error
//!   queue is closed.
//! - **Done**: the collected failures are returned as an [`IngestErrorReport`].
//!
//! Bad rows never abort a run. Rows are upserted in no particular order, so
//! when an identifier appears twice in one file either row may win.
//!
//! # Example
//!
//! ```no_run
//! use rollcall::ingest::{IngestConfig, Ingestor};
//! use rollcall::store::{RecordStore, ShardedStore};
//!
//! let store = ShardedStore::new();
//! let report = Ingestor::new(&store)
//!     .with_config(IngestConfig::default().with_workers(4))
//!     .run("roster.csv");
//!
//! report.log_errors();
//! println!("{} records, {} bad lines", store.len(), report.len());
//! ```

mod cancel;
mod config;
mod pipeline;
mod report;

pub use cancel::CancellationToken;
pub use config::IngestConfig;
pub use report::{FILE_LEVEL_LINE, IngestErrorReport, ParseError, ParseErrorKind, RunOutcome};

use crate::metrics::MetricsCollector;
use crate::store::RecordStore;
use std::path::Path;

/// Runs ingests into one store with fixed settings.
///
/// An `Ingestor` is cheap to build and may be reused for several files; each
/// [`run`](Self::run) is independent.
pub struct Ingestor<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    config: IngestConfig,
    cancel: CancellationToken,
    metrics: Option<MetricsCollector>,
}

impl<'a, S: RecordStore + ?Sized> Ingestor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            config: IngestConfig::default(),
            cancel: CancellationToken::new(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop runs early once `cancel` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Record run counters into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// The token that stops this ingestor's runs.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Ingest one file, returning its error report.
    pub fn run(&self, path: impl AsRef<Path>) -> IngestErrorReport {
        pipeline::run(
            path.as_ref(),
            self.store,
            &self.config,
            &self.cancel,
            self.metrics.as_ref(),
        )
    }
}

/// Ingest `path` into `store` with the default configuration.
pub fn ingest<S: RecordStore + ?Sized>(path: impl AsRef<Path>, store: &S) -> IngestErrorReport {
    Ingestor::new(store).run(path)
}
