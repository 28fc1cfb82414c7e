//! Pre-built records for common test scenarios.

use crate::record::{Attributes, Measurements, Record};

/// Build a measurement map from `(label, score)` pairs.
///
/// # Example
///
/// ```
/// use rollcall::testing::measurements;
///
/// let m = measurements(&[("math", 95), ("english", 88)]);
/// assert_eq!(m["math"], 95);
/// ```
#[must_use]
pub fn measurements(pairs: &[(&str, i64)]) -> Measurements {
    pairs
        .iter()
        .map(|(label, score)| ((*label).to_string(), *score))
        .collect()
}

/// A record with the given identifier, name and scores.
///
/// Age, sex and class get fixed placeholder values.
#[must_use]
pub fn record(identifier: &str, name: &str, scores: &[(&str, i64)]) -> Record {
    Record::new(identifier)
        .with_attributes(Attributes {
            name: name.to_string(),
            age: "20".to_string(),
            sex: "Female".to_string(),
            class: "A1".to_string(),
        })
        .with_measurements(measurements(scores))
}

/// Five distinct students, one of them without any scores.
///
/// The first is the canonical `"001"` with `math: 95`.
#[must_use]
pub fn sample_roster() -> Vec<Record> {
    let student = |id: &str, name: &str, age: &str, sex: &str, class: &str, scores: &[(&str, i64)]| {
        Record::new(id)
            .with_attributes(Attributes {
                name: name.to_string(),
                age: age.to_string(),
                sex: sex.to_string(),
                class: class.to_string(),
            })
            .with_measurements(measurements(scores))
    };
    vec![
        student("001", "John", "20", "Male", "A1", &[("math", 95)]),
        student("002", "Mei", "19", "Female", "A1", &[("math", 88), ("english", 91)]),
        student("003", "Omar", "21", "Male", "B2", &[("physics", 77)]),
        student("004", "Ines", "20", "Female", "B2", &[]),
        student("005", "Tomas", "22", "Male", "C3", &[("math", 60), ("art", 99)]),
    ]
}

/// `count` generated records with identifiers `id-00000`, `id-00001`, ...
///
/// Each carries a single `seq` score equal to its index.
#[must_use]
pub fn generated_roster(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| record(&format!("id-{i:05}"), &format!("Student {i}"), &[("seq", i as i64)]))
        .collect()
}
