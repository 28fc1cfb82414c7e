use crate::parser::FIELD_COUNT;
use crate::record::Record;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Header written by [`RosterFileBuilder`] unless disabled.
pub const ROSTER_HEADER: [&str; FIELD_COUNT] = ["name", "age", "sex", "class", "number", "score"];

enum Line {
    Record(Record),
    Raw(String),
}

/// Writes roster files line by line.
///
/// Lines are numbered from 1 with the header (when present) as line 1, so
/// the n-th line added lands on physical line `n + 1`.
///
/// ```
/// use rollcall::testing::{RosterFileBuilder, record};
///
/// let text = RosterFileBuilder::new()
///     .record(&record("001", "John", &[("math", 95)]))
///     .raw_line("only,five,columns,in,here")
///     .build()
///     .unwrap();
/// assert_eq!(text.lines().count(), 3);
/// assert!(text.lines().nth(1).unwrap().contains(r#""{""math"":95}""#));
/// ```
pub struct RosterFileBuilder {
    header: bool,
    lines: Vec<Line>,
}

impl RosterFileBuilder {
    pub fn new() -> Self {
        Self {
            header: true,
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }

    /// Append a well-formed row for `record`.
    #[must_use]
    pub fn record(mut self, record: &Record) -> Self {
        self.lines.push(Line::Record(record.clone()));
        self
    }

    #[must_use]
    pub fn records(mut self, records: &[Record]) -> Self {
        self.lines
            .extend(records.iter().cloned().map(Line::Record));
        self
    }

    /// Append `line` verbatim (without its terminator).
    #[must_use]
    pub fn raw_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(Line::Raw(line.into()));
        self
    }

    /// Number of data lines added so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render the file contents.
    ///
    /// # Errors
    /// Returns an error if a row cannot be encoded.
    pub fn build(&self) -> Result<String> {
        let mut out = String::new();
        if self.header {
            out.push_str(&encode_row(&ROSTER_HEADER)?);
        }
        for line in &self.lines {
            match line {
                Line::Record(record) => {
                    let scores: BTreeMap<_, _> = record.measurements.iter().collect();
                    let scores = serde_json::to_string(&scores)?;
                    let attrs = &record.attributes;
                    out.push_str(&encode_row(&[
                        attrs.name.as_str(),
                        attrs.age.as_str(),
                        attrs.sex.as_str(),
                        attrs.class.as_str(),
                        record.identifier.as_str(),
                        scores.as_str(),
                    ])?);
                }
                Line::Raw(raw) => {
                    out.push_str(raw);
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    /// Write the file to `dir/name` and return its path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let path = dir.as_ref().join(name);
        std::fs::write(&path, self.build()?)
            .with_context(|| format!("write roster {}", path.display()))?;
        Ok(path)
    }

    /// Write the file into a fresh temporary directory.
    ///
    /// The directory is deleted when the returned guard is dropped.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be created.
    pub fn write_temp(&self, name: &str) -> Result<(TempDir, PathBuf)> {
        let dir = tempfile::tempdir().context("create temp dir for roster")?;
        let path = self.write_to(dir.path(), name)?;
        Ok((dir, path))
    }

    /// Write the file gzip-compressed to `dir/name`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    #[cfg(feature = "compression-gzip")]
    pub fn write_gz_to(&self, dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let path = dir.as_ref().join(name);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create roster {}", path.display()))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(self.build()?.as_bytes())?;
        encoder.finish()?;
        Ok(path)
    }
}

impl Default for RosterFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_row(fields: &[&str]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush roster row: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
