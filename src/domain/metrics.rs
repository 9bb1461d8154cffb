// Derived metrics over a newest-first record list
use super::record::Record;
use super::schema::ParameterGroup;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Extreme {
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

pub fn latest(records: &[Record]) -> Record {
    records.first().cloned().unwrap_or_else(Record::empty)
}

/// Percent change rounded to two decimals.
///
/// A zero previous value yields 0 rather than an infinite change, so a jump
/// from 0 to any value reads as "no change".
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    let change = (current - previous) / previous.abs() * 100.0;
    if !change.is_finite() {
        return 0.0;
    }
    // Past ~1e15 there are no decimals left to round.
    let scaled = change * 100.0;
    if scaled.is_finite() { scaled.round() / 100.0 } else { change }
}

/// Trend per field between `records[0]` and `records[1]`.
pub fn trends(records: &[Record], fields: &[&str]) -> BTreeMap<String, f64> {
    fields
        .iter()
        .map(|field| {
            let trend = match records {
                [current, previous, ..] => match (current.number(field), previous.number(field)) {
                    (Some(c), Some(p)) => percent_change(c, p),
                    _ => 0.0,
                },
                _ => 0.0,
            };
            (field.to_string(), trend)
        })
        .collect()
}

/// Min/max per parameter group across every record, plus the latest max value.
pub fn extremes(records: &[Record], groups: &[ParameterGroup]) -> BTreeMap<String, Extreme> {
    groups
        .iter()
        .map(|group| {
            let max = records
                .iter()
                .filter_map(|r| r.number(group.max_field))
                .reduce(f64::max)
                .unwrap_or(0.0);
            let min = records
                .iter()
                .filter_map(|r| r.number(group.min_field))
                .reduce(f64::min)
                .unwrap_or(0.0);
            let current = records
                .first()
                .and_then(|r| r.number(group.max_field))
                .unwrap_or(0.0);
            (group.name.to_string(), Extreme { min, max, current })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::FieldValue;

    fn record(time: &str, values: &[(&str, Option<f64>)]) -> Record {
        let fields = values
            .iter()
            .map(|(k, v)| {
                let value = v.map(FieldValue::Number).unwrap_or(FieldValue::Null);
                (k.to_string(), value)
            })
            .collect();
        Record::new(time.to_string(), "modbus_sensor".to_string(), fields)
    }

    const GROUP: ParameterGroup = ParameterGroup {
        name: "voltage",
        min_field: "voltage_min",
        max_field: "voltage_max",
    };

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(110.0, 100.0), 10.0);
        assert_eq!(percent_change(90.0, 100.0), -10.0);
        assert_eq!(percent_change(42.0, 0.0), 0.0);
        assert_eq!(percent_change(-5.0, -10.0), 50.0);
        assert_eq!(percent_change(1.0, 3.0), -66.67);
    }

    #[test]
    fn test_percent_change_extremes() {
        assert_eq!(percent_change(1e306, 1.0), 1e306 * 100.0);
        assert_eq!(percent_change(f64::MAX, 1e-300), 0.0);
        assert_eq!(percent_change(f64::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_trends_between_two_newest() {
        let records = vec![
            record("t3", &[("p_active", Some(110.0)), ("voltage", None)]),
            record("t2", &[("p_active", Some(100.0)), ("voltage", Some(230.0))]),
            record("t1", &[("p_active", Some(1.0)), ("voltage", Some(1.0))]),
        ];
        let t = trends(&records, &["p_active", "voltage", "missing"]);
        assert_eq!(t["p_active"], 10.0);
        assert_eq!(t["voltage"], 0.0);
        assert_eq!(t["missing"], 0.0);
    }

    #[test]
    fn test_trends_are_pure() {
        let records = vec![
            record("t2", &[("p_active", Some(90.0))]),
            record("t1", &[("p_active", Some(100.0))]),
        ];
        let first = trends(&records, &["p_active"]);
        assert_eq!(first, trends(&records, &["p_active"]));
        assert_eq!(first["p_active"], -10.0);
    }

    #[test]
    fn test_trends_need_two_records() {
        let single = vec![record("t1", &[("p_active", Some(5.0))])];
        assert_eq!(trends(&single, &["p_active"])["p_active"], 0.0);
        assert_eq!(trends(&[], &["p_active"])["p_active"], 0.0);
    }

    #[test]
    fn test_latest_of_empty_is_empty_record() {
        assert!(latest(&[]).is_empty());
        let records = vec![record("t2", &[]), record("t1", &[])];
        assert_eq!(latest(&records).time, "t2");
    }

    #[test]
    fn test_extremes_skip_nulls() {
        let maxes = [Some(5.0), None, Some(9.0), Some(3.0)];
        let mins = [Some(1.0), Some(2.0), None, Some(0.0)];
        let records: Vec<Record> = maxes
            .iter()
            .zip(mins.iter())
            .enumerate()
            .map(|(i, (max, min))| {
                record(&format!("t{}", 4 - i), &[("voltage_max", *max), ("voltage_min", *min)])
            })
            .collect();

        let e = extremes(&records, &[GROUP]);
        assert_eq!(e["voltage"], Extreme { min: 0.0, max: 9.0, current: 5.0 });
    }

    #[test]
    fn test_extremes_of_empty_are_zero() {
        let e = extremes(&[], &[GROUP]);
        assert_eq!(e["voltage"], Extreme::default());
    }
}
