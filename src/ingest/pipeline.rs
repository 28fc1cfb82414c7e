//! The producer / merge-worker / error-collector run for one file.
//!
//! Every thread lives inside one `std::thread::scope`, so the store and the
//! configuration are borrowed rather than reference-counted and no thread can
//! outlive the run.
//!
//! ```text
//!              record queue (bounded)
//! producer ──────────────────────────► merge worker × N ──► store.upsert
//!    │
//!    └──────────► error queue (bounded) ──► collector ──► IngestErrorReport
//! ```
//!
//! The collector drains the error queue while the run is still streaming, so
//! a file with more bad lines than the error queue holds cannot stall the
//! producer.

use super::cancel::CancellationToken;
use super::config::IngestConfig;
use super::report::{IngestErrorReport, ParseError, RunOutcome};
use crate::io::compression::{InputReader, open_input};
use crate::metrics::{LINES_READ, MetricsCollector, PARSE_ERRORS, RECORDS_MERGED, STORE_SIZE};
use crate::parser::{RecordError, parse_csv_record};
use crate::record::Record;
use crate::store::RecordStore;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Opening,
    Streaming,
    Draining,
    Done,
}

impl Phase {
    fn enter(self, path: &Path) {
        let phase = match self {
            Phase::Opening => "opening",
            Phase::Streaming => "streaming",
            Phase::Draining => "draining",
            Phase::Done => "done",
        };
        tracing::debug!(path = %path.display(), phase, "ingest phase");
    }
}

/// Cancellation token and deadline, folded into one check.
///
/// Remembers whether any thread saw the signal so the run can report that it
/// stopped early. The caller's token is only ever read.
struct StopSignal<'a> {
    cancel: &'a CancellationToken,
    deadline: Option<Instant>,
    tripped: AtomicBool,
}

impl<'a> StopSignal<'a> {
    fn new(cancel: &'a CancellationToken, config: &IngestConfig) -> Self {
        Self {
            cancel,
            deadline: config.deadline().map(|d| Instant::now() + d),
            tripped: AtomicBool::new(false),
        }
    }

    fn should_stop(&self) -> bool {
        let stop = self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d);
        if stop {
            self.tripped.store(true, Ordering::Relaxed);
        }
        stop
    }

    fn outcome(&self) -> RunOutcome {
        if !self.tripped.load(Ordering::Relaxed) {
            RunOutcome::Completed
        } else if self.cancel.is_cancelled() {
            RunOutcome::Cancelled
        } else {
            RunOutcome::DeadlineExceeded
        }
    }
}

/// Ingest `path` into `store`, returning every failure seen along the way.
pub(crate) fn run<S: RecordStore + ?Sized>(
    path: &Path,
    store: &S,
    config: &IngestConfig,
    cancel: &CancellationToken,
    metrics: Option<&MetricsCollector>,
) -> IngestErrorReport {
    if let Some(m) = metrics {
        m.record_start();
    }
    let report = run_inner(path, store, config, cancel, metrics);
    if let Some(m) = metrics {
        m.increment_counter(PARSE_ERRORS, report.len() as u64);
        m.set_gauge(STORE_SIZE, store.len() as f64);
        m.record_end();
    }
    report
}

fn run_inner<S: RecordStore + ?Sized>(
    path: &Path,
    store: &S,
    config: &IngestConfig,
    cancel: &CancellationToken,
    metrics: Option<&MetricsCollector>,
) -> IngestErrorReport {
    Phase::Opening.enter(path);
    let reader = match open_input(path) {
        Ok(reader) => reader,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %format!("{err:#}"), "cannot open input");
            Phase::Done.enter(path);
            return IngestErrorReport::new(
                path,
                RunOutcome::ReadFailed,
                vec![ParseError::file_open(path, &err)],
            );
        }
    };

    let workers = config.workers.max(1);
    let stop = StopSignal::new(cancel, config);
    let (record_tx, record_rx) = bounded::<Record>(config.record_queue_capacity.max(1));
    let (error_tx, error_rx) = bounded::<ParseError>(config.error_queue_capacity.max(1));

    let (streamed, merged, errors) = thread::scope(|s| {
        let stop = &stop;
        let collector = s.spawn(move || error_rx.iter().collect::<Vec<_>>());

        Phase::Streaming.enter(path);
        let producer = {
            let error_tx = error_tx.clone();
            s.spawn(move || produce(path, reader, config, stop, &record_tx, &error_tx))
        };

        let pool: Vec<_> = (0..workers)
            .map(|worker| {
                let rx = record_rx.clone();
                s.spawn(move || merge(worker, &rx, store, stop, metrics))
            })
            .collect();
        // Once every worker has exited, a producer blocked on a full queue
        // gets a send error instead of waiting forever.
        drop(record_rx);

        let streamed = join(producer, "producer");
        let merged: u64 = pool.into_iter().map(|h| join(h, "merge worker")).sum();

        Phase::Draining.enter(path);
        drop(error_tx);
        let errors = join(collector, "error collector");
        (streamed, merged, errors)
    });

    if let Some(m) = metrics {
        m.increment_counter(LINES_READ, streamed.lines_read);
    }
    let outcome = if streamed.read_failed {
        RunOutcome::ReadFailed
    } else {
        stop.outcome()
    };
    tracing::info!(
        path = %path.display(),
        workers,
        lines_read = streamed.lines_read,
        merged,
        errors = errors.len(),
        ?outcome,
        "ingest finished"
    );
    Phase::Done.enter(path);
    IngestErrorReport::new(path, outcome, errors)
}

/// How the producer left the input.
#[derive(Debug, Clone, Copy, Default)]
struct Streamed {
    lines_read: u64,
    /// The reader failed before end of input; the rest of the file is unread.
    read_failed: bool,
}

/// Read rows until end of input, a read failure, or the stop signal.
fn produce(
    path: &Path,
    reader: InputReader,
    config: &IngestConfig,
    stop: &StopSignal<'_>,
    records: &Sender<Record>,
    errors: &Sender<ParseError>,
) -> Streamed {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(config.has_headers)
        .flexible(true)
        .from_reader(reader);
    let mut row = csv::StringRecord::new();
    let mut next_line = config.first_line();
    let mut streamed = Streamed::default();

    while !stop.should_stop() {
        match rdr.read_record(&mut row) {
            Ok(false) => break,
            Ok(true) => {
                streamed.lines_read += 1;
                let line = physical_line(row.position(), next_line);
                next_line = line + 1;
                match parse_csv_record(&row) {
                    Ok(record) => {
                        if records.send(record).is_err() {
                            tracing::debug!(line, "merge workers gone, producer stopping");
                            break;
                        }
                    }
                    Err(err) => report(errors, ParseError::at_line(line, &err)),
                }
            }
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                streamed.read_failed = true;
                if streamed.lines_read == 0 {
                    // Nothing came out of the input at all: a bad file, not a bad row.
                    let err = anyhow::Error::new(err).context("read input");
                    tracing::error!(path = %path.display(), error = %format!("{err:#}"), "cannot read input");
                    report(errors, ParseError::file_open(path, &err));
                } else {
                    let line = physical_line(err.position(), next_line);
                    tracing::warn!(line, "input stream failed, producer stopping");
                    report(errors, ParseError::at_line(line, &RecordError::LineRead(err)));
                }
                break;
            }
            Err(err) => {
                streamed.lines_read += 1;
                let line = physical_line(err.position(), next_line);
                next_line = line + 1;
                report(errors, ParseError::at_line(line, &RecordError::LineRead(err)));
            }
        }
    }
    streamed
}

fn report(errors: &Sender<ParseError>, err: ParseError) {
    tracing::trace!(line = err.line, kind = %err.kind, "row rejected");
    // The collector outlives the producer; a send can only fail if it panicked.
    let _ = errors.send(err);
}

fn physical_line(position: Option<&csv::Position>, fallback: i64) -> i64 {
    position
        .and_then(|p| i64::try_from(p.line()).ok())
        .unwrap_or(fallback)
}

/// Drain the record queue into the store until it closes or the run stops.
fn merge<S: RecordStore + ?Sized>(
    worker: usize,
    records: &Receiver<Record>,
    store: &S,
    stop: &StopSignal<'_>,
    metrics: Option<&MetricsCollector>,
) -> u64 {
    let mut merged = 0u64;
    for record in records {
        if stop.should_stop() {
            break;
        }
        store.upsert(record);
        merged += 1;
    }
    tracing::trace!(worker, merged, "merge worker exiting");
    if let Some(m) = metrics {
        m.increment_counter(RECORDS_MERGED, merged);
    }
    merged
}

fn join<T>(handle: ScopedJoinHandle<'_, T>, role: &'static str) -> T {
    handle.join().unwrap_or_else(|panic| {
        tracing::error!(role, "ingest thread panicked");
        std::panic::resume_unwind(panic)
    })
}
