// Time-series record domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

pub const TIME_COLUMN: &str = "_time";
pub const MEASUREMENT_COLUMN: &str = "_measurement";

/// A single cell after schema coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// One sample row from the time-series store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_time", default, skip_serializing_if = "String::is_empty")]
    pub time: String,
    #[serde(rename = "_measurement", default, skip_serializing_if = "String::is_empty")]
    pub measurement: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(time: String, measurement: String, fields: BTreeMap<String, FieldValue>) -> Self {
        Self {
            time,
            measurement,
            fields,
        }
    }

    /// The placeholder returned as `latest` when nothing was fetched.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty() && self.measurement.is_empty() && self.fields.is_empty()
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(FieldValue::as_f64)
    }

    /// `_time` as an instant, if it is RFC3339.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.time.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Most recent first, by parsed instant. The store trims trailing zeros off
/// fractional seconds, so the raw strings do not sort chronologically.
/// Unparseable timestamps sort after all parseable ones, by string.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by_cached_key(|r| Reverse((r.instant(), r.time.clone())));
}
