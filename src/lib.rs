// Energy dashboard API - Modbus meter telemetry and weather overlays over HTTP
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

use std::sync::Arc;
use std::time::Duration;

use crate::application::dashboard_service::DashboardService;
use crate::application::weather_service::WeatherService;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::infrastructure::settings_store::SettingsStore;
use crate::infrastructure::ttl_cache::TtlCache;
use crate::infrastructure::weather_client::HttpWeatherClient;
use crate::presentation::app_state::AppState;

/// Wire the production adapters into services.
pub fn build_state(config: &AppConfig) -> anyhow::Result<Arc<AppState>> {
    let repository = Arc::new(InfluxRepository::from_settings(&config.influx)?);
    let dashboard_service = DashboardService::new(
        repository,
        config.influx.bucket.clone(),
        config.dashboard.clone(),
    );

    let weather_client = Arc::new(HttpWeatherClient::from_settings(&config.weather)?);
    let weather_service = WeatherService::new(
        weather_client,
        config.weather.api_key.clone(),
        SettingsStore::new(&config.weather.settings_path),
        // Coordinates of a place name don't change.
        Arc::new(TtlCache::with_system_clock(None)),
        Arc::new(TtlCache::with_system_clock(Some(Duration::from_secs(
            config.weather.forecast_ttl_secs,
        )))),
    );

    Ok(Arc::new(AppState {
        dashboard_service,
        weather_service,
        expose_error_details: config.server.is_development(),
    }))
}
