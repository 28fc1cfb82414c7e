use rollcall::ingest::{IngestErrorReport, ParseError, ParseErrorKind, RunOutcome};
use rollcall::parser::parse_fields;
use std::path::Path;

fn field_count_error(line: i64) -> ParseError {
    let err = parse_fields(&["too", "short"]).unwrap_err();
    ParseError::at_line(line, &err)
}

#[test]
fn report_is_sorted_by_line() {
    let report = IngestErrorReport::new(
        "in.csv",
        RunOutcome::Completed,
        vec![field_count_error(9), field_count_error(2), field_count_error(5)],
    );
    let lines: Vec<i64> = report.errors().iter().map(|e| e.line).collect();
    assert_eq!(lines, [2, 5, 9]);
    assert_eq!(report.len(), 3);
    assert_eq!(report.count_of(ParseErrorKind::FieldCount), 3);
    assert_eq!(report.count_of(ParseErrorKind::LineRead), 0);
    assert!(!report.has_file_error());
    assert!(!report.stopped_early());
}

#[test]
fn file_level_error_display() {
    let err = ParseError::file_open(Path::new("gone.csv"), &anyhow::anyhow!("no such file"));
    assert!(err.is_file_level());
    assert_eq!(err.to_string(), "[file_open] cannot open gone.csv: no such file");

    let line = field_count_error(3);
    assert_eq!(line.to_string(), "line 3 [field_count] expected 6 fields, found 2");
}

#[test]
fn report_serializes_to_json() -> anyhow::Result<()> {
    let report = IngestErrorReport::new(
        "roster.csv",
        RunOutcome::DeadlineExceeded,
        vec![field_count_error(4)],
    );
    let value: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
    assert_eq!(value["source"], "roster.csv");
    assert_eq!(value["outcome"], "deadline_exceeded");
    assert_eq!(value["errors"][0]["line"], 4);
    assert_eq!(value["errors"][0]["kind"], "field_count");

    let back: IngestErrorReport = serde_json::from_value(value)?;
    assert_eq!(back, report);
    Ok(())
}

#[test]
fn report_writes_to_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("report.json");
    let report = IngestErrorReport::new("x.csv", RunOutcome::Cancelled, vec![]);
    report.write_to_file(&path)?;

    let text = std::fs::read_to_string(&path)?;
    assert!(text.contains("\"cancelled\""));
    assert!(report.is_empty());
    assert!(report.stopped_early());
    assert_eq!(report.to_string(), "IngestErrorReport(x.csv: 0 errors, Cancelled)");
    Ok(())
}
