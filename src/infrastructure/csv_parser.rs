// CSV response parser - InfluxDB annotated CSV into typed records
use crate::domain::record::{FieldValue, MEASUREMENT_COLUMN, Record, TIME_COLUMN};
use crate::domain::schema::{EndpointSchema, FieldKind};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecords {
    /// In input order; callers sort.
    pub records: Vec<Record>,
    pub skipped_rows: usize,
}

/// Parse a header-first, comma separated body into records.
///
/// Empty lines, `#` annotation lines, short rows, repeated header rows and
/// rows with neither `_time` nor `_measurement` are skipped. A row the reader
/// fails on is logged and skipped; it never fails the whole body.
pub fn parse_records(body: &str, schema: &EndpointSchema) -> anyhow::Result<ParsedRecords> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut parsed = ParsedRecords::default();
    if headers.iter().all(|h| h.is_empty()) {
        return Ok(parsed);
    }

    for (index, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping malformed CSV row {}: {}", index + 1, e);
                parsed.skipped_rows += 1;
                continue;
            }
        };

        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if row.len() < headers.len() {
            tracing::debug!(
                "Skipping CSV row {}: {} cells for {} headers",
                index + 1,
                row.len(),
                headers.len()
            );
            parsed.skipped_rows += 1;
            continue;
        }
        if row.iter().map(str::trim).eq(headers.iter().map(String::as_str)) {
            continue;
        }

        match to_record(&headers, &row, schema) {
            Some(record) => parsed.records.push(record),
            None => parsed.skipped_rows += 1,
        }
    }

    Ok(parsed)
}

fn to_record(
    headers: &[String],
    row: &csv::StringRecord,
    schema: &EndpointSchema,
) -> Option<Record> {
    let mut time = String::new();
    let mut measurement = String::new();
    let mut fields = BTreeMap::new();

    for (header, cell) in headers.iter().zip(row.iter()) {
        if header.is_empty() {
            continue;
        }
        if header == MEASUREMENT_COLUMN {
            measurement = cell.to_string();
            continue;
        }
        match schema.kind_of(header) {
            FieldKind::Timestamp => time = cell.to_string(),
            FieldKind::Numeric => {
                fields.insert(header.clone(), coerce_number(cell));
            }
            FieldKind::Text => {
                fields.insert(header.clone(), FieldValue::Text(cell.to_string()));
            }
        }
    }

    if time.is_empty() && measurement.is_empty() {
        return None;
    }
    Some(Record::new(time, measurement, fields))
}

fn coerce_number(cell: &str) -> FieldValue {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => FieldValue::Number(v),
        _ => FieldValue::Null,
    }
}

/// True when the upstream returned nothing worth parsing.
pub fn is_blank(body: &str) -> bool {
    body.trim().is_empty()
}
