// Dashboard service - Query, parse and derive metrics for each data endpoint
use crate::application::telemetry_repository::{TimeSeriesSource, UpstreamError};
use crate::domain::dashboard::{ConsumptionPoint, DashboardReport, DateRange, ReportMeta};
use crate::domain::metrics;
use crate::domain::record::{self, Record};
use crate::domain::schema::EndpointSchema;
use crate::domain::series::{self, NullPolicy};
use crate::domain::time_range::{RangeWindow, TimeRange};
use crate::infrastructure::config::DashboardSettings;
use crate::infrastructure::csv_parser::{self, ParsedRecords};
use crate::infrastructure::flux_query::{FluxQuery, QueryError};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),
    #[error("failed to parse upstream response: {0}")]
    Parse(#[source] anyhow::Error),
}

/// Selects which derived map a report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Derived {
    Trends,
    Extremes,
}

#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn TimeSeriesSource>,
    bucket: String,
    settings: DashboardSettings,
}

impl DashboardService {
    pub fn new(
        source: Arc<dyn TimeSeriesSource>,
        bucket: String,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            source,
            bucket,
            settings,
        }
    }

    fn now() -> DateTime<Local> {
        Local::now()
    }

    fn policy(&self, requested: Option<NullPolicy>) -> NullPolicy {
        requested.unwrap_or(self.settings.null_policy)
    }

    fn model_tags(&self) -> Vec<(String, String)> {
        self.settings
            .device_model
            .iter()
            .map(|m| ("model".to_string(), m.clone()))
            .collect()
    }

    /// Latest raw meter samples with percent-change trends.
    pub async fn realtime(
        &self,
        null_policy: Option<NullPolicy>,
    ) -> Result<DashboardReport, DashboardError> {
        let schema = EndpointSchema::realtime(&self.settings.realtime_measurement);
        let window = RangeWindow::trailing(self.settings.realtime_window_secs, schema.window);
        let policy = self.policy(null_policy);
        self.report(&schema, window, self.model_tags(), None, policy, Derived::Trends)
            .await
    }

    /// PV, battery, grid and load power aggregated over a named range.
    pub async fn power(
        &self,
        range: TimeRange,
        null_policy: Option<NullPolicy>,
    ) -> Result<DashboardReport, DashboardError> {
        let schema = EndpointSchema::power(&self.settings.power_measurement);
        let window = range.window(Self::now());
        let policy = self.policy(null_policy);
        self.report(&schema, window, Vec::new(), Some(range), policy, Derived::Trends)
            .await
    }

    /// Per-group min/max of the meter's extreme registers over a named range.
    pub async fn extremes(
        &self,
        range: TimeRange,
        null_policy: Option<NullPolicy>,
    ) -> Result<DashboardReport, DashboardError> {
        let schema = EndpointSchema::extremes(&self.settings.extremes_measurement);
        let window = range.window(Self::now());
        let policy = self.policy(null_policy);
        let tags = self.model_tags();
        self.report(&schema, window, tags, Some(range), policy, Derived::Extremes)
            .await
    }

    /// Active power history of one Modbus device, oldest first.
    pub async fn consumption(
        &self,
        modbus_address: u8,
        model: Option<&str>,
        range: TimeRange,
    ) -> Result<Vec<ConsumptionPoint>, DashboardError> {
        let schema = EndpointSchema::consumption(&self.settings.consumption_measurement);
        let mut tags = vec![("modbus_address".to_string(), modbus_address.to_string())];
        if let Some(model) = model {
            tags.push(("model".to_string(), model.to_string()));
        }

        let Some(parsed) = self.fetch(&schema, range.window(Self::now()), tags).await? else {
            return Ok(Vec::new());
        };

        let mut records = parsed.records;
        record::sort_newest_first(&mut records);
        Ok(records
            .into_iter()
            .rev()
            .map(|r| ConsumptionPoint {
                p_active: r.number("p_active"),
                time: r.time,
            })
            .collect())
    }

    /// BUILD_QUERY and CALL_UPSTREAM. `None` means the store had nothing.
    async fn fetch(
        &self,
        schema: &EndpointSchema,
        window: RangeWindow,
        tags: Vec<(String, String)>,
    ) -> Result<Option<ParsedRecords>, DashboardError> {
        let base = FluxQuery::new(&self.bucket, &schema.measurement, window);
        let query = tags
            .into_iter()
            .fold(base, |q, (k, v)| q.tag(k, v))
            .fields(schema.fields.iter().copied())
            .build()?;

        let body = self.source.query_csv(&query).await?;
        if csv_parser::is_blank(&body) {
            tracing::debug!("Empty result for {} query", schema.name);
            return Ok(None);
        }

        let parsed = csv_parser::parse_records(&body, schema).map_err(DashboardError::Parse)?;
        if parsed.skipped_rows > 0 {
            tracing::warn!("{}: skipped {} CSV rows", schema.name, parsed.skipped_rows);
        }
        Ok(Some(parsed))
    }

    async fn report(
        &self,
        schema: &EndpointSchema,
        window: RangeWindow,
        tags: Vec<(String, String)>,
        range: Option<TimeRange>,
        policy: NullPolicy,
        derived: Derived,
    ) -> Result<DashboardReport, DashboardError> {
        let parsed = self.fetch(schema, window, tags).await?.unwrap_or_default();
        let report = self.compute(schema, parsed, range, policy, derived);
        tracing::debug!("{}: {} records", schema.name, report.meta.count);
        Ok(report)
    }

    fn compute(
        &self,
        schema: &EndpointSchema,
        parsed: ParsedRecords,
        range: Option<TimeRange>,
        policy: NullPolicy,
        derived: Derived,
    ) -> DashboardReport {
        let mut records = parsed.records;
        record::sort_newest_first(&mut records);

        let latest = metrics::latest(&records);
        let time_series = series::project(&records, &schema.fields, schema.window, policy);
        let (trends, extremes) = match derived {
            Derived::Trends => (Some(metrics::trends(&records, &schema.fields)), None),
            Derived::Extremes => (None, Some(metrics::extremes(&records, schema.groups))),
        };
        let date_range = date_range(&records);
        let count = records.len();
        records.truncate(self.settings.max_records);

        DashboardReport {
            data: records,
            latest,
            time_series,
            trends,
            extremes,
            meta: ReportMeta {
                count,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                fields: schema.field_names(),
                skipped_rows: parsed.skipped_rows,
                time_range: range.map(|r| r.as_str().to_string()),
                date_range,
            },
        }
    }
}

/// Oldest to newest of a newest-first list.
fn date_range(records: &[Record]) -> Option<DateRange> {
    match (records.last(), records.first()) {
        (Some(oldest), Some(newest)) => Some(DateRange {
            from: oldest.time.clone(),
            to: newest.time.clone(),
        }),
        _ => None,
    }
}
