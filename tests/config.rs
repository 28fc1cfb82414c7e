use rollcall::error::ConfigError;
use rollcall::ingest::IngestConfig;
use std::collections::HashMap;
use std::time::Duration;

#[test]
fn defaults() {
    let cfg = IngestConfig::default();
    assert_eq!(cfg.workers, 10);
    assert_eq!(cfg.record_queue_capacity, 1000);
    assert_eq!(cfg.error_queue_capacity, 1000);
    assert!(cfg.has_headers);
    assert_eq!(cfg.deadline(), None);
    assert_eq!(cfg.first_line(), 2);
    assert_eq!(cfg.with_headers(false).first_line(), 1);
}

#[test]
fn zero_values_fail_validation() {
    assert_eq!(
        IngestConfig::default().with_workers(0).validate(),
        Err(ConfigError::Zero { field: "workers" })
    );
    assert_eq!(
        IngestConfig::default()
            .with_error_queue_capacity(0)
            .validate(),
        Err(ConfigError::Zero {
            field: "error_queue_capacity"
        })
    );
    assert!(IngestConfig::default().validate().is_ok());
}

#[test]
fn overrides_apply_then_validate() {
    let vars = HashMap::from([
        ("ROLLCALL_WORKERS", " 3 "),
        ("ROLLCALL_RECORD_QUEUE", "64"),
        ("ROLLCALL_DEADLINE_MS", "1500"),
    ]);
    let cfg = IngestConfig::default()
        .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(cfg.workers, 3);
    assert_eq!(cfg.record_queue_capacity, 64);
    assert_eq!(cfg.error_queue_capacity, 1000);
    assert_eq!(cfg.deadline(), Some(Duration::from_millis(1500)));

    let bad = IngestConfig::default().with_overrides(|k| (k == "ROLLCALL_WORKERS").then(|| "many".to_string()));
    assert_eq!(
        bad,
        Err(ConfigError::Invalid {
            key: "ROLLCALL_WORKERS",
            value: "many".into()
        })
    );
    let zero = IngestConfig::default().with_overrides(|k| (k == "ROLLCALL_ERROR_QUEUE").then(|| "0".to_string()));
    assert!(matches!(zero, Err(ConfigError::Zero { .. })));
}

#[test]
fn counts_beyond_u64_are_invalid() {
    let huge = "18446744073709551616";
    let cfg = IngestConfig::default().with_overrides(|k| (k == "ROLLCALL_RECORD_QUEUE").then(|| huge.to_string()));
    assert_eq!(
        cfg,
        Err(ConfigError::Invalid {
            key: "ROLLCALL_RECORD_QUEUE",
            value: huge.into()
        })
    );
}

#[cfg(target_pointer_width = "32")]
#[test]
fn counts_beyond_usize_are_invalid() {
    let cfg = IngestConfig::default().with_overrides(|k| (k == "ROLLCALL_WORKERS").then(|| "4294967296".to_string()));
    assert_eq!(
        cfg,
        Err(ConfigError::Invalid {
            key: "ROLLCALL_WORKERS",
            value: "4294967296".into()
        })
    );
}

#[cfg(target_pointer_width = "64")]
#[test]
fn large_counts_fit_on_64_bit() {
    let cfg = IngestConfig::default()
        .with_overrides(|k| (k == "ROLLCALL_ERROR_QUEUE").then(|| "4294967296".to_string()))
        .unwrap();
    assert_eq!(cfg.error_queue_capacity, 4_294_967_296);
}

#[test]
fn loads_partial_json_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ingest.json");
    std::fs::write(&path, r#"{"workers": 2, "has_headers": false}"#)?;

    let cfg = IngestConfig::from_json_file(&path)?;
    assert_eq!(cfg.workers, 2);
    assert!(!cfg.has_headers);
    assert_eq!(cfg.record_queue_capacity, 1000);
    Ok(())
}

#[test]
fn json_file_errors_name_the_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let zero = dir.path().join("zero.json");
    std::fs::write(&zero, r#"{"workers": 0}"#)?;
    let err = IngestConfig::from_json_file(&zero).unwrap_err();
    assert!(format!("{err:#}").contains("zero.json"));
    assert!(format!("{err:#}").contains("workers must be greater than zero"));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "workers = 2")?;
    assert!(IngestConfig::from_json_file(&garbage).is_err());
    assert!(IngestConfig::from_json_file(dir.path().join("missing.json")).is_err());
    Ok(())
}

#[test]
fn deadline_round_trips_through_builder() {
    let cfg = IngestConfig::default().with_deadline(Duration::from_secs(2));
    assert_eq!(cfg.deadline_ms, Some(2000));
    assert_eq!(cfg.deadline(), Some(Duration::from_secs(2)));
}
