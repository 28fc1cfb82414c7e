//! # Rollcall
//!
//! Concurrent bulk ingest of delimited roster files into an in-memory,
//! identifier-keyed record store.
//!
//! ## Key Features
//!
//! - **Parallel ingest** - one parsing producer feeding a pool of merge workers
//!   over bounded queues, with per-line errors collected instead of aborting
//! - **Thread-safe store** - every operation is atomic; choose one big lock
//!   ([`CoarseStore`]) or hashed shards ([`ShardedStore`])
//! - **Error reports** - every bad line is reported with its physical line
//!   number and a typed kind
//! - **Cancellation and deadlines** - stop a run early and still get a report
//! - **Compressed input** - gzip, zstd, bzip2 and xz detected automatically
//!   (optional via feature flags)
//! - **Multi-file intake** - globs and upload directories
//!
//! ## Quick Start
//!
//! ```no_run
//! use rollcall::{RecordStore, ShardedStore, ingest};
//!
//! let store = ShardedStore::new();
//! let report = ingest("students.csv", &store);
//!
//! for err in report.errors() {
//!     eprintln!("{err}");
//! }
//! let john = store.get("001")?;
//! println!("{} scored {}", john.attributes.name, store.measurement("001", "math")?);
//! # Ok::<(), rollcall::StoreError>(())
//! ```
//!
//! ## Input Format
//!
//! A header line followed by six columns per row:
//! `name,age,sex,class,number,score`, where `score` is a JSON object of
//! label to integer, e.g. `"{""math"":95}"`. See [`parser`] for details.
//!
//! ## Modules
//!
//! - [`record`] - the record and patch types
//! - [`parser`] - row to record conversion
//! - [`store`] - the [`RecordStore`] trait and its implementations
//! - [`ingest`] - the concurrent pipeline, its configuration and error report
//! - [`intake`] - ingest of many files
//! - [`io`] - input opening and decompression
//! - [`metrics`] - optional run counters
//! - [`logging`] - `tracing` subscriber setup
//! - [`testing`] - fixtures and assertions for tests

pub mod error;
pub mod ingest;
pub mod intake;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod record;
pub mod store;
pub mod testing;

pub use error::{ConfigError, StoreError};
pub use ingest::{
    CancellationToken, IngestConfig, IngestErrorReport, Ingestor, ParseError, ParseErrorKind,
    RunOutcome, ingest,
};
pub use record::{Attributes, Measurements, Record, RecordPatch};
pub use store::{CoarseStore, RecordStore, ShardedStore};
