// Dashboard report domain model
use super::metrics::Extreme;
use super::record::Record;
use super::series::TimeSeries;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub count: usize,
    pub timestamp: String,
    pub fields: Vec<String>,
    pub skipped_rows: usize,
    pub time_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// Everything one data endpoint returns on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub data: Vec<Record>,
    pub latest: Record,
    pub time_series: TimeSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extremes: Option<BTreeMap<String, Extreme>>,
    pub meta: ReportMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionPoint {
    #[serde(rename = "_time")]
    pub time: String,
    pub p_active: Option<f64>,
}
