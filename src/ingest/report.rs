//! Per-run error reporting.
//!
//! A run never aborts on a bad row: each failure becomes a [`ParseError`]
//! value and the whole set is handed back as an [`IngestErrorReport`] once
//! the run is over. Only a file that cannot be opened, or whose very first
//! read fails, produces a file-level entry (line `-1`), and in that case it
//! is the only entry.

use crate::parser::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Line number used for failures that concern the whole file.
pub const FILE_LEVEL_LINE: i64 = -1;

/// Category of an ingest failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// The input file could not be opened or read at all. Fatal to the run.
    FileOpen,
    FieldCount,
    MissingIdentifier,
    MeasurementDecode,
    /// The row could not be decoded as delimited columns.
    LineRead,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseErrorKind::FileOpen => "file_open",
            ParseErrorKind::FieldCount => "field_count",
            ParseErrorKind::MissingIdentifier => "missing_identifier",
            ParseErrorKind::MeasurementDecode => "measurement_decode",
            ParseErrorKind::LineRead => "line_read",
        };
        f.write_str(name)
    }
}

/// One failed line (or the whole file, when `line == -1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub line: i64,
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    /// A row-level failure at `line`.
    pub fn at_line(line: i64, err: &RecordError) -> Self {
        let (kind, message) = match err {
            RecordError::FieldCount { .. } => (ParseErrorKind::FieldCount, err.to_string()),
            RecordError::MissingIdentifier => (ParseErrorKind::MissingIdentifier, err.to_string()),
            RecordError::MeasurementDecode(_) => {
                (ParseErrorKind::MeasurementDecode, err.to_string())
            }
            RecordError::LineRead(_) => (
                ParseErrorKind::LineRead,
                format!("line {line} could not be read"),
            ),
        };
        Self {
            line,
            kind,
            message,
        }
    }

    /// The fatal failure to open `path`.
    pub fn file_open(path: &Path, err: &anyhow::Error) -> Self {
        Self {
            line: FILE_LEVEL_LINE,
            kind: ParseErrorKind::FileOpen,
            message: format!("cannot open {}: {err:#}", path.display()),
        }
    }

    pub fn is_file_level(&self) -> bool {
        self.line == FILE_LEVEL_LINE
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_file_level() {
            write!(f, "[{}] {}", self.kind, self.message)
        } else {
            write!(f, "line {} [{}] {}", self.line, self.kind, self.message)
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every row was read (some may have failed to parse).
    #[default]
    Completed,
    /// Stopped early through the cancellation token.
    Cancelled,
    /// Stopped early because the configured deadline passed.
    DeadlineExceeded,
    /// The input could not be opened or stopped yielding bytes before its end.
    ReadFailed,
}

/// Failures collected over one ingest run, sorted by line for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestErrorReport {
    source: PathBuf,
    outcome: RunOutcome,
    errors: Vec<ParseError>,
}

impl IngestErrorReport {
    /// Build a report, ordering `errors` by line (file-level entry first).
    pub fn new(source: impl Into<PathBuf>, outcome: RunOutcome, mut errors: Vec<ParseError>) -> Self {
        errors.sort_by_key(|e| e.line);
        Self {
            source: source.into(),
            outcome,
            errors,
        }
    }

    /// The path the run was asked to read.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// Whether the run stopped before reaching the end of input.
    pub fn stopped_early(&self) -> bool {
        self.outcome != RunOutcome::Completed
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn count_of(&self, kind: ParseErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    pub fn has_file_error(&self) -> bool {
        self.errors.iter().any(ParseError::is_file_level)
    }

    /// Emit every entry as a `warn` event.
    pub fn log_errors(&self) {
        for err in &self.errors {
            tracing::warn!(
                source = %self.source.display(),
                line = err.line,
                kind = %err.kind,
                "{}",
                err.message
            );
        }
    }

    /// Export the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to a file in JSON format.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl fmt::Display for IngestErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IngestErrorReport({}: {} errors",
            self.source.display(),
            self.errors.len()
        )?;
        if self.stopped_early() {
            write!(f, ", {:?}", self.outcome)?;
        }
        f.write_str(")")
    }
}
