//! Assertions over stores and error reports.

use crate::ingest::{IngestErrorReport, ParseErrorKind};
use crate::record::Record;
use crate::store::RecordStore;

/// Assert that `store` holds exactly `expected`, in any order.
///
/// # Panics
///
/// Panics with both sides listed if the stored records differ.
pub fn assert_store_contains<S: RecordStore + ?Sized>(store: &S, expected: &[Record]) {
    let actual = store.snapshot();
    let mut expected = expected.to_vec();
    expected.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    assert_eq!(
        actual.len(),
        expected.len(),
        "Store size mismatch:\n  Expected: {expected:#?}\n  Actual: {actual:#?}"
    );
    for (a, e) in actual.iter().zip(&expected) {
        assert_eq!(a, e, "Record mismatch for identifier {:?}", e.identifier);
    }
}

/// Assert that `report` has errors on exactly `lines`, in any order.
///
/// # Panics
///
/// Panics if the set of failing lines differs.
pub fn assert_error_lines(report: &IngestErrorReport, lines: &[i64]) {
    let mut actual: Vec<i64> = report.errors().iter().map(|e| e.line).collect();
    let mut expected = lines.to_vec();
    actual.sort_unstable();
    expected.sort_unstable();
    assert_eq!(
        actual, expected,
        "Error lines mismatch:\n  Report: {:#?}",
        report.errors()
    );
}

/// Assert that the error on `line` is of `kind`.
///
/// # Panics
///
/// Panics if `line` has no error or a different kind.
pub fn assert_error_kind(report: &IngestErrorReport, line: i64, kind: ParseErrorKind) {
    let found = report.errors().iter().find(|e| e.line == line);
    match found {
        Some(err) => assert_eq!(err.kind, kind, "Wrong error kind on line {line}: {err}"),
        None => panic!("No error on line {line}; report: {:#?}", report.errors()),
    }
}
