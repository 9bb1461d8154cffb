// Flux query builder with escaped literals and checked identifiers
use crate::domain::time_range::{RangeBound, RangeWindow};
use chrono::SecondsFormat;
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("query has no field allow-list")]
    NoFields,
}

/// Quote a Flux string literal.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Tag keys and field names are interpolated as `r.<ident>`, so only
/// `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub fn check_identifier(ident: &str) -> Result<&str, QueryError> {
    let mut chars = ident.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(ident)
    } else {
        Err(QueryError::InvalidIdentifier(ident.to_string()))
    }
}

fn bound(b: &RangeBound) -> String {
    match b {
        RangeBound::Now => "now()".to_string(),
        RangeBound::Ago(seconds) => format!("-{}s", seconds),
        RangeBound::Absolute(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

#[derive(Debug, Clone)]
pub struct FluxQuery {
    bucket: String,
    measurement: String,
    window: RangeWindow,
    tags: Vec<(String, String)>,
    fields: Vec<String>,
}

impl FluxQuery {
    pub fn new(
        bucket: impl Into<String>,
        measurement: impl Into<String>,
        window: RangeWindow,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            measurement: measurement.into(),
            window,
            tags: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn build(&self) -> Result<String, QueryError> {
        if self.fields.is_empty() {
            return Err(QueryError::NoFields);
        }

        let mut q = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(q, "from(bucket: {})", string_literal(&self.bucket));
        let _ = writeln!(
            q,
            "  |> range(start: {}, stop: {})",
            bound(&self.window.start),
            bound(&self.window.stop)
        );
        let _ = writeln!(
            q,
            "  |> filter(fn: (r) => r._measurement == {})",
            string_literal(&self.measurement)
        );
        for (key, value) in &self.tags {
            let _ = writeln!(
                q,
                "  |> filter(fn: (r) => r.{} == {})",
                check_identifier(key)?,
                string_literal(value)
            );
        }

        let field_predicate = self
            .fields
            .iter()
            .map(|f| check_identifier(f).map(|f| format!("r._field == {}", string_literal(f))))
            .collect::<Result<Vec<_>, _>>()?
            .join(" or ");
        let _ = writeln!(q, "  |> filter(fn: (r) => {})", field_predicate);

        if let Some(every) = self.window.every {
            let _ = writeln!(
                q,
                "  |> aggregateWindow(every: {}, fn: mean, createEmpty: false)",
                every
            );
        }
        let _ = writeln!(
            q,
            "  |> pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")"
        );
        let _ = writeln!(q, "  |> group()");
        let _ = writeln!(q, "  |> sort(columns: [\"_time\"], desc: true)");
        if self.window.limit > 0 {
            let _ = writeln!(q, "  |> limit(n: {})", self.window.limit);
        }

        Ok(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time_range::AggregateEvery;
    use chrono::DateTime;

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(string_literal("a\\b"), "\"a\\\\b\"");
        assert_eq!(string_literal("${x}"), "\"\\${x}\"");
    }

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("modbus_address").is_ok());
        assert!(check_identifier("_field").is_ok());
        assert!(check_identifier("1abc").is_err());
        assert!(check_identifier("model) or true").is_err());
        assert!(check_identifier("").is_err());
    }

    #[test]
    fn test_builds_realtime_query() {
        let query = FluxQuery::new("energy", "modbus_sensor", RangeWindow::trailing(600, 60))
            .tag("model", "SDM630")
            .fields(["voltage", "current"])
            .build()
            .unwrap();

        let expected = "\
from(bucket: \"energy\")
  |> range(start: -600s, stop: now())
  |> filter(fn: (r) => r._measurement == \"modbus_sensor\")
  |> filter(fn: (r) => r.model == \"SDM630\")
  |> filter(fn: (r) => r._field == \"voltage\" or r._field == \"current\")
  |> pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")
  |> group()
  |> sort(columns: [\"_time\"], desc: true)
  |> limit(n: 60)
";
        assert_eq!(query, expected);
    }

    #[test]
    fn test_absolute_range_and_aggregation() {
        let midnight = DateTime::parse_from_rfc3339("2024-03-14T00:00:00+01:00").unwrap();
        let window = RangeWindow {
            start: RangeBound::Absolute(midnight),
            stop: RangeBound::Now,
            every: Some(AggregateEvery::FifteenMinutes),
            limit: 96,
        };
        let query = FluxQuery::new("energy", "modbus_sensor", window)
            .fields(["p_active"])
            .build()
            .unwrap();
        assert!(query.contains("range(start: 2024-03-14T00:00:00+01:00, stop: now())"));
        assert!(query.contains("aggregateWindow(every: 15m, fn: mean, createEmpty: false)"));
        assert!(query.contains("limit(n: 96)"));
    }

    #[test]
    fn test_tag_values_cannot_break_out() {
        let query = FluxQuery::new("energy", "modbus_sensor", RangeWindow::trailing(60, 1))
            .tag("model", "x\") or (r) => true or (\"")
            .fields(["p_active"])
            .build()
            .unwrap();
        assert!(query.contains("r.model == \"x\\\") or (r) => true or (\\\"\""));
    }

    #[test]
    fn test_rejects_bad_identifiers_and_empty_fields() {
        let window = RangeWindow::trailing(60, 1);
        let err = FluxQuery::new("b", "m", window)
            .tag("model == \"x\" or r.a", "v")
            .fields(["p_active"])
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier(_)));

        assert_eq!(FluxQuery::new("b", "m", window).build(), Err(QueryError::NoFields));
    }
}
