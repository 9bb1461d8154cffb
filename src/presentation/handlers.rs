// HTTP request handlers
use crate::application::weather_service::WeatherReport;
use crate::domain::dashboard::{ConsumptionPoint, DashboardReport};
use crate::domain::series::NullPolicy;
use crate::domain::time_range::TimeRange;
use crate::presentation::app_state::AppState;
use crate::presentation::error::{ApiError, ErrorResponse};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_FORECAST_DAYS: u8 = 3;

/// `{ "status": "success", ...body }`
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub status: &'static str,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Success<T> {
    fn new(body: T) -> Json<Self> {
        Json(Self {
            status: "success",
            body,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ConsumptionBody {
    pub data: Vec<ConsumptionPoint>,
}

type ApiResult<T> = Result<Json<Success<T>>, ErrorResponse>;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub time_range: Option<String>,
    pub null_policy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConsumptionQuery {
    pub modbus_address: Option<String>,
    pub model: Option<String>,
    pub time_range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub location: Option<String>,
    pub days: Option<String>,
}

fn parse_null_policy(raw: Option<&str>) -> Result<Option<NullPolicy>, ApiError> {
    raw.map(|s| s.parse::<NullPolicy>().map_err(ApiError::BadRequest))
        .transpose()
}

/// Modbus RTU slave addresses run 1..=247.
fn parse_modbus_address(raw: Option<&str>) -> Result<u8, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("modbus_address is required".to_string()))?;
    match raw.parse::<u8>() {
        Ok(address) if (1..=247).contains(&address) => Ok(address),
        _ => Err(ApiError::BadRequest(format!("invalid modbus_address '{}'", raw))),
    }
}

fn parse_model(raw: Option<&str>) -> Result<Option<&str>, ApiError> {
    let Some(model) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let valid = model.len() <= 64
        && model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(Some(model))
    } else {
        Err(ApiError::BadRequest(format!("invalid model '{}'", model)))
    }
}

fn parse_days(raw: Option<&str>) -> Result<u8, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_FORECAST_DAYS),
        Some(s) => s
            .parse::<u8>()
            .map_err(|_| ApiError::BadRequest(format!("invalid days '{}'", s))),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn realtime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<DashboardReport> {
    let policy = parse_null_policy(query.null_policy.as_deref()).map_err(|e| state.error(e))?;
    let report = state
        .dashboard_service
        .realtime(policy)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Success::new(report))
}

pub async fn power(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<DashboardReport> {
    let policy = parse_null_policy(query.null_policy.as_deref()).map_err(|e| state.error(e))?;
    let range = TimeRange::parse(query.time_range.as_deref());
    let report = state
        .dashboard_service
        .power(range, policy)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Success::new(report))
}

pub async fn extremes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<DashboardReport> {
    let policy = parse_null_policy(query.null_policy.as_deref()).map_err(|e| state.error(e))?;
    let range = TimeRange::parse(query.time_range.as_deref());
    let report = state
        .dashboard_service
        .extremes(range, policy)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Success::new(report))
}

pub async fn consumption(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConsumptionQuery>,
) -> ApiResult<ConsumptionBody> {
    let address =
        parse_modbus_address(query.modbus_address.as_deref()).map_err(|e| state.error(e))?;
    let model = parse_model(query.model.as_deref()).map_err(|e| state.error(e))?;
    let range = TimeRange::parse(query.time_range.as_deref());

    let data = state
        .dashboard_service
        .consumption(address, model, range)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Success::new(ConsumptionBody { data }))
}

pub async fn weather_current(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<WeatherReport> {
    let location = query.location.unwrap_or_default();
    let report = state
        .weather_service
        .current(&location)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Success::new(report))
}

pub async fn weather_forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<WeatherReport> {
    let days = parse_days(query.days.as_deref()).map_err(|e| state.error(e))?;
    let location = query.location.unwrap_or_default();
    let report = state
        .weather_service
        .forecast(&location, days)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Success::new(report))
}
