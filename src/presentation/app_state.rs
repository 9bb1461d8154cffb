// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::weather_service::WeatherService;
use crate::presentation::error::{ApiError, ErrorResponse};

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub weather_service: WeatherService,
    /// Include error chains in 500 responses (development only).
    pub expose_error_details: bool,
}

impl AppState {
    pub fn error(&self, e: impl Into<ApiError>) -> ErrorResponse {
        ErrorResponse {
            error: e.into(),
            expose_details: self.expose_error_details,
        }
    }
}
