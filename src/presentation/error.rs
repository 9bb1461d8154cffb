// API errors and the uniform JSON error envelope
use crate::application::dashboard_service::DashboardError;
use crate::application::telemetry_repository::UpstreamError;
use crate::application::weather_service::WeatherError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("upstream responded with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream returned unexpected content type '{0}'")]
    UpstreamContentType(String),

    #[error("upstream timeout")]
    UpstreamTimeout,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::UpstreamContentType(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Internal(e) => Some(format!("{:?}", e)),
            _ => None,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status, body } => ApiError::Upstream { status, body },
            UpstreamError::ContentType(ct) => ApiError::UpstreamContentType(ct),
            UpstreamError::Timeout => ApiError::UpstreamTimeout,
            UpstreamError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::Upstream(e) => e.into(),
            DashboardError::Query(e) => ApiError::Internal(e.into()),
            DashboardError::Parse(e) => ApiError::Internal(e),
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Upstream(e) => e.into(),
            WeatherError::LocationNotFound(_) => ApiError::NotFound(e.to_string()),
            WeatherError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            WeatherError::MissingApiKey => ApiError::Internal(anyhow::anyhow!(e)),
            WeatherError::Settings(e) => ApiError::Internal(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub error: String,
    pub data: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: String, details: Option<String>) -> Self {
        Self {
            status: "error",
            error,
            data: Vec::new(),
            details,
        }
    }
}

/// An `ApiError` plus whether internal details may be shown to the client.
#[derive(Debug)]
pub struct ErrorResponse {
    pub error: ApiError,
    pub expose_details: bool,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {:?}", status, self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.error);
        }

        let details = if self.expose_details { self.error.details() } else { None };
        let body = ErrorEnvelope::new(self.error.to_string(), details);
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ErrorResponse {
            error: self,
            expose_details: false,
        }
        .into_response()
    }
}

/// Turns a handler panic into the same 500 envelope as any other failure.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>, expose_details: bool) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", message);

    let details = expose_details.then(|| message.clone());
    let body = ErrorEnvelope::new(format!("Internal server error: {}", message), details);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let upstream = ApiError::Upstream { status: 503, body: "service unavailable".to_string() };
        assert_eq!(upstream.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::UpstreamTimeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::UpstreamContentType("text/html".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Upstream { status: 42, body: String::new() }.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_weather_error_mapping() {
        let e: ApiError = WeatherError::LocationNotFound("Atlantis".to_string()).into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        let e: ApiError = WeatherError::MissingApiKey.into();
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Internal server error: weather API key is not configured");
    }

    #[test]
    fn test_details_only_for_internal() {
        assert!(ApiError::Internal(anyhow::anyhow!("boom")).details().is_some());
        assert!(ApiError::BadRequest("x".to_string()).details().is_none());
    }
}
