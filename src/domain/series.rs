// Chart projection: parallel per-field sequences over a trailing window
use super::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// How a missing sample is rendered in a chart series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullPolicy {
    /// Flat zero line.
    #[default]
    Zero,
    /// `null`, which charts draw as a gap.
    Gap,
    /// Linear interpolation between the nearest known samples.
    Interpolate,
}

impl FromStr for NullPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(NullPolicy::Zero),
            "gap" => Ok(NullPolicy::Gap),
            "interpolate" => Ok(NullPolicy::Interpolate),
            other => Err(format!("unknown null policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub timestamps: Vec<String>,
    #[serde(flatten)]
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Project the newest `window` records (input is newest first) into
/// chronological per-field sequences.
pub fn project(
    records: &[Record],
    fields: &[&str],
    window: usize,
    policy: NullPolicy,
) -> TimeSeries {
    let mut recent: Vec<&Record> = records.iter().take(window).collect();
    recent.reverse();

    let timestamps = recent.iter().map(|r| r.time.clone()).collect();
    let series = fields
        .iter()
        .map(|field| {
            let raw: Vec<Option<f64>> = recent.iter().map(|r| r.number(field)).collect();
            (field.to_string(), apply_policy(raw, policy))
        })
        .collect();

    TimeSeries { timestamps, series }
}

fn apply_policy(values: Vec<Option<f64>>, policy: NullPolicy) -> Vec<Option<f64>> {
    match policy {
        NullPolicy::Zero => values.into_iter().map(|v| Some(v.unwrap_or(0.0))).collect(),
        NullPolicy::Gap => values,
        NullPolicy::Interpolate => interpolate(&values),
    }
}

fn interpolate(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    if known.is_empty() {
        return values.to_vec();
    }

    (0..values.len())
        .map(|i| {
            if let Some(v) = values[i] {
                return Some(v);
            }
            // First known sample after i; everything before it is the one before i.
            let next = known.partition_point(|(k, _)| *k < i);
            let value = match (next.checked_sub(1).map(|p| known[p]), known.get(next)) {
                (Some((i0, v0)), Some(&(i1, v1))) => {
                    let t = (i - i0) as f64 / (i1 - i0) as f64;
                    v0 + (v1 - v0) * t
                }
                (Some((_, v0)), None) => v0,
                (None, Some(&(_, v1))) => v1,
                (None, None) => return None,
            };
            Some(value)
        })
        .collect()
}
