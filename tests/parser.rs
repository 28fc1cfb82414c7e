use rollcall::parser::{FIELD_COUNT, RecordError, parse_fields, parse_line};

#[test]
fn parses_canonical_row() {
    let rec = parse_line(r#"John,20,Male,A1,001,"{""math"":95}""#).unwrap();
    assert_eq!(rec.identifier, "001");
    assert_eq!(rec.attributes.name, "John");
    assert_eq!(rec.attributes.age, "20");
    assert_eq!(rec.attributes.sex, "Male");
    assert_eq!(rec.attributes.class, "A1");
    assert_eq!(rec.measurements.len(), 1);
    assert_eq!(rec.measurements["math"], 95);
}

#[test]
fn trims_every_text_field() {
    let rec = parse_fields(&["  Ana ", " 19", "F  ", " B2 ", "  x-7  ", " {} "]).unwrap();
    assert_eq!(rec.identifier, "x-7");
    assert_eq!(rec.attributes.name, "Ana");
    assert_eq!(rec.attributes.age, "19");
    assert_eq!(rec.attributes.sex, "F");
    assert_eq!(rec.attributes.class, "B2");
    assert!(rec.measurements.is_empty());
}

#[test]
fn wrong_column_counts_are_rejected() {
    for fields in [
        vec!["a", "b", "c", "d", "e"],
        vec!["a", "b", "c", "d", "e", "{}", "extra"],
        vec![],
    ] {
        match parse_fields(fields.as_slice()) {
            Err(RecordError::FieldCount { expected, found }) => {
                assert_eq!(expected, FIELD_COUNT);
                assert_eq!(found, fields.len());
            }
            other => panic!("expected FieldCount for {fields:?}, got {other:?}"),
        }
    }
}

#[test]
fn blank_identifier_is_rejected() {
    let err = parse_fields(&["John", "20", "Male", "A1", "   ", "{}"]).unwrap_err();
    assert!(matches!(err, RecordError::MissingIdentifier));
}

#[test]
fn field_count_is_checked_before_identifier() {
    let err = parse_fields(&["John", "20", "Male", "A1", ""]).unwrap_err();
    assert!(matches!(err, RecordError::FieldCount { .. }));
}

#[test]
fn empty_payload_gives_empty_measurements() {
    let rec = parse_fields(&["John", "20", "Male", "A1", "001", ""]).unwrap();
    assert!(rec.measurements.is_empty());
    let rec = parse_fields(&["John", "20", "Male", "A1", "001", "null"]).unwrap();
    assert!(rec.measurements.is_empty());
}

#[test]
fn malformed_payloads_are_decode_errors() {
    for payload in [
        "{math:95}",
        r#"{"math":"ninety"}"#,
        r#"["math",95]"#,
        r#"{"math":95"#,
        r#"{"math":1.5}"#,
    ] {
        let err = parse_fields(&["John", "20", "Male", "A1", "001", payload]).unwrap_err();
        assert!(
            matches!(err, RecordError::MeasurementDecode(_)),
            "payload {payload:?} gave {err:?}"
        );
    }
}

#[test]
fn decode_error_carries_underlying_cause() {
    let err = parse_fields(&["John", "20", "Male", "A1", "001", "{oops}"]).unwrap_err();
    let RecordError::MeasurementDecode(cause) = &err else {
        panic!("unexpected {err:?}");
    };
    assert!(cause.is_syntax());
    assert!(err.to_string().contains("measurement"));
}

#[test]
fn negative_and_multiple_scores_decode() {
    let rec = parse_fields(&[
        "John",
        "20",
        "Male",
        "A1",
        "001",
        r#"{"math":-3,"english":100,"art":0}"#,
    ])
    .unwrap();
    assert_eq!(rec.measurements.len(), 3);
    assert_eq!(rec.measurements["math"], -3);
    assert_eq!(rec.measurements["art"], 0);
}

#[test]
fn short_line_reports_field_count() {
    let err = parse_line("John,20,Male,A1,001").unwrap_err();
    assert!(matches!(err, RecordError::FieldCount { found: 5, .. }));
}
