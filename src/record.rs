//! Record types held by the store.
//!
//! A [`Record`] is one person row: a unique identifier, four free-form
//! attributes and a label-to-score map. The serialized form keeps the field
//! names used on the wire by the record API (`number` for the identifier and
//! `score` for the measurements) so records can be handed straight to a JSON
//! response.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Per-label integer scores attached to a record.
pub type Measurements = HashMap<String, i64>;

/// Free-form descriptive fields of a record. Not validated beyond presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub class: String,
}

/// One ingested entity, keyed by `identifier`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "number", default)]
    pub identifier: String,
    #[serde(flatten)]
    pub attributes: Attributes,
    #[serde(
        rename = "score",
        default,
        deserialize_with = "nullable_measurements"
    )]
    pub measurements: Measurements,
}

impl Record {
    /// Create a record with empty attributes and no measurements.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_measurements(mut self, measurements: Measurements) -> Self {
        self.measurements = measurements;
        self
    }
}

/// `"score": null` is accepted and treated as an empty map.
fn nullable_measurements<'de, D>(deserializer: D) -> Result<Measurements, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Measurements>::deserialize(deserializer)?.unwrap_or_default())
}

/// A partial update: only the fields that are present are applied.
///
/// Empty strings count as "not provided", so a form that submits blank
/// inputs leaves the stored values untouched. When `measurements` is present
/// it replaces the whole map; use
/// [`RecordStore::merge_measurements`](crate::store::RecordStore::merge_measurements)
/// for a per-label merge.
///
/// # Example
/// ```
/// use rollcall::record::RecordPatch;
///
/// let patch = RecordPatch::new().name("Ada").class("B2");
/// assert!(!patch.is_empty());
/// assert_eq!(patch.new_identifier(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(rename = "number", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "score", default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Measurements>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    #[must_use]
    pub fn sex(mut self, sex: impl Into<String>) -> Self {
        self.sex = Some(sex.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    #[must_use]
    pub fn measurements(mut self, measurements: Measurements) -> Self {
        self.measurements = Some(measurements);
        self
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.new_identifier().is_none()
            && provided(&self.name).is_none()
            && provided(&self.age).is_none()
            && provided(&self.sex).is_none()
            && provided(&self.class).is_none()
            && self.measurements.is_none()
    }

    /// The trimmed replacement identifier, if one was provided.
    pub fn new_identifier(&self) -> Option<&str> {
        self.identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Apply every provided field except the identifier.
    pub(crate) fn apply_fields(&self, record: &mut Record) {
        let attrs = &mut record.attributes;
        for (slot, value) in [
            (&mut attrs.name, &self.name),
            (&mut attrs.age, &self.age),
            (&mut attrs.sex, &self.sex),
            (&mut attrs.class, &self.class),
        ] {
            if let Some(value) = provided(value) {
                *slot = value.to_string();
            }
        }
        if let Some(measurements) = &self.measurements {
            record.measurements = measurements.clone();
        }
    }
}

fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_names() {
        let record = Record::new("001").with_measurements(Measurements::from([("math".into(), 95)]));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["number"], "001");
        assert_eq!(json["score"]["math"], 95);
        assert_eq!(json["name"], "");
    }

    #[test]
    fn null_score_deserializes_to_empty_map() {
        let record: Record =
            serde_json::from_str(r#"{"number":"7","name":"Li","score":null}"#).unwrap();
        assert_eq!(record.identifier, "7");
        assert_eq!(record.attributes.name, "Li");
        assert!(record.measurements.is_empty());
    }

    #[test]
    fn blank_patch_fields_are_ignored() {
        let mut record = Record::new("1").with_attributes(Attributes {
            name: "Old".into(),
            age: "20".into(),
            sex: "F".into(),
            class: "A".into(),
        });
        let patch = RecordPatch::new().name("").age("21").identifier("  ");
        assert_eq!(patch.new_identifier(), None);
        patch.apply_fields(&mut record);
        assert_eq!(record.attributes.name, "Old");
        assert_eq!(record.attributes.age, "21");
    }
}
