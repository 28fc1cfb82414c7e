//! Record parser: one delimited row in, one typed [`Record`] or [`RecordError`] out.
//!
//! Rows have exactly six columns:
//!
//! | # | column       | notes                                   |
//! |---|--------------|-----------------------------------------|
//! | 0 | name         | trimmed                                 |
//! | 1 | age          | trimmed, kept as text                   |
//! | 2 | sex          | trimmed                                 |
//! | 3 | class        | trimmed                                 |
//! | 4 | identifier   | trimmed, must not be empty              |
//! | 5 | measurements | JSON object of label to integer, quoted |
//!
//! The parser is a pure function and never touches the store.

use crate::record::{Attributes, Measurements, Record};
use thiserror::Error;

/// Number of columns every data row must have.
pub const FIELD_COUNT: usize = 6;

const IDENTIFIER_FIELD: usize = 4;
const MEASUREMENTS_FIELD: usize = 5;

/// Why a single row could not become a [`Record`].
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("identifier field is empty")]
    MissingIdentifier,

    #[error("measurement payload is not a label-to-integer map: {0}")]
    MeasurementDecode(#[from] serde_json::Error),

    #[error("row could not be read as delimited columns: {0}")]
    LineRead(#[from] csv::Error),
}

/// Parse already-split columns into a record.
///
/// # Errors
/// See [`RecordError`]; checks run in the order field count, identifier,
/// measurements.
///
/// # Example
/// ```
/// use rollcall::parser::parse_fields;
///
/// let rec = parse_fields(&[" John ", "20", "Male", "A1", " 001 ", r#"{"math":95}"#]).unwrap();
/// assert_eq!(rec.identifier, "001");
/// assert_eq!(rec.attributes.name, "John");
/// assert_eq!(rec.measurements["math"], 95);
/// ```
pub fn parse_fields<S: AsRef<str>>(fields: &[S]) -> Result<Record, RecordError> {
    if fields.len() != FIELD_COUNT {
        return Err(RecordError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }
    let text = |i: usize| fields[i].as_ref().trim().to_string();

    let identifier = text(IDENTIFIER_FIELD);
    if identifier.is_empty() {
        return Err(RecordError::MissingIdentifier);
    }
    let measurements = decode_measurements(fields[MEASUREMENTS_FIELD].as_ref())?;

    Ok(Record {
        identifier,
        attributes: Attributes {
            name: text(0),
            age: text(1),
            sex: text(2),
            class: text(3),
        },
        measurements,
    })
}

/// Parse a row produced by the `csv` reader.
pub fn parse_csv_record(row: &csv::StringRecord) -> Result<Record, RecordError> {
    let fields: Vec<&str> = row.iter().collect();
    parse_fields(&fields)
}

/// Parse one raw line of delimited text (no header handling).
///
/// Quoting follows RFC 4180, so an embedded payload is written as
/// `"{""math"":95}"`.
pub fn parse_line(line: &str) -> Result<Record, RecordError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut row = csv::StringRecord::new();
    if !rdr.read_record(&mut row)? {
        return Err(RecordError::FieldCount {
            expected: FIELD_COUNT,
            found: 0,
        });
    }
    parse_csv_record(&row)
}

/// Decode the measurements column.
///
/// Surrounding whitespace and any enclosing `"` characters are stripped
/// before decoding. Blank input and the JSON literal `null` give an empty map.
pub fn decode_measurements(raw: &str) -> Result<Measurements, serde_json::Error> {
    let payload = raw.trim().trim_matches('"').trim();
    if payload.is_empty() {
        return Ok(Measurements::new());
    }
    let decoded: Option<Measurements> = serde_json::from_str(payload)?;
    Ok(decoded.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_stray_quotes_around_payload() {
        let m = decode_measurements(r#""{"math":100,"english":90}""#).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m["english"], 90);
    }

    #[test]
    fn null_and_blank_payloads_are_empty() {
        assert!(decode_measurements("").unwrap().is_empty());
        assert!(decode_measurements("   ").unwrap().is_empty());
        assert!(decode_measurements("null").unwrap().is_empty());
    }

    #[test]
    fn fractional_scores_are_rejected() {
        assert!(decode_measurements(r#"{"math":95.5}"#).is_err());
    }
}
