use rollcall::metrics::{CounterMetric, GaugeMetric, Metric, MetricsCollector};
use serde_json::json;
use std::thread;
use std::time::Duration;

#[test]
fn increment_counter_accumulates() {
    let collector = MetricsCollector::new();
    collector.increment_counter("requests", 1);
    collector.increment_counter("requests", 5);
    assert_eq!(collector.snapshot()["requests"], json!(6));
}

#[test]
fn increment_replaces_non_counter() {
    let collector = MetricsCollector::new();
    collector.set_gauge("mixed", 2.5);
    collector.increment_counter("mixed", 3);
    assert_eq!(collector.snapshot()["mixed"], json!(3));
}

#[test]
fn concurrent_increments_are_not_lost() {
    let collector = MetricsCollector::new();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let c = collector.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    c.increment_counter("hits", 1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(collector.snapshot()["hits"], json!(2000));
}

#[test]
fn set_counter_and_gauge() {
    let collector = MetricsCollector::default();
    collector.set_counter("operations", 100);
    collector.set_counter("operations", 200);
    collector.set_gauge("size", 42.5);
    let snapshot = collector.snapshot();
    assert_eq!(snapshot["operations"], json!(200));
    assert_eq!(snapshot["size"], json!(42.5));
}

#[test]
fn elapsed_spans_first_start_to_last_end() {
    let collector = MetricsCollector::new();
    assert!(collector.elapsed().is_none());
    collector.record_start();
    thread::sleep(Duration::from_millis(20));
    collector.record_start();
    collector.record_end();
    assert!(collector.elapsed().unwrap() >= Duration::from_millis(20));
}

#[test]
fn to_json_includes_descriptions_and_time() {
    let collector = MetricsCollector::new();
    collector.register(Box::new(
        GaugeMetric::new("store_size", 3.0).with_description("records held"),
    ));
    let json = collector.to_json();
    assert_eq!(json["store_size"]["value"], json!(3.0));
    assert_eq!(json["store_size"]["description"], "records held");
    assert!(json.get("execution_time_ms").is_none());

    collector.record_start();
    collector.record_end();
    assert!(collector.to_json()["execution_time_ms"]["value"].is_number());
}

#[test]
fn save_to_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("metrics.json");
    let collector = MetricsCollector::new();
    collector.set_counter("saved", 123);
    collector.save_to_file(&path.to_string_lossy())?;

    let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(parsed["saved"]["value"], json!(123));
    Ok(())
}

#[test]
fn counter_constructors() {
    let counter = CounterMetric::new("fresh");
    assert_eq!(counter.name(), "fresh");
    assert_eq!(counter.value(), json!(0));
    assert_eq!(CounterMetric::with_value("init", 50).value(), json!(50));
}
