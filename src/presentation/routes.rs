// Router and middleware stack
use crate::presentation::app_state::AppState;
use crate::presentation::error::panic_response;
use crate::presentation::handlers::{
    consumption, extremes, health_check, power, realtime, weather_current, weather_forecast,
};
use axum::{routing::get, Router};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    let expose_details = state.expose_error_details;

    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/realtime", get(realtime))
        .route("/api/power", get(power))
        .route("/api/extremes", get(extremes))
        .route("/api/consumption", get(consumption))
        .route("/api/weather/current", get(weather_current))
        .route("/api/weather/forecast", get(weather_forecast))
        .with_state(state)
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, expose_details)
        }))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
