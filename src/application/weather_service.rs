// Weather service - Cached geocoding and conditions for the production overlays
use crate::application::telemetry_repository::UpstreamError;
use crate::application::weather_provider::{GeocodedLocation, WeatherProvider};
use crate::infrastructure::settings_store::SettingsStore;
use crate::infrastructure::ttl_cache::TtlCache;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_FORECAST_DAYS: u8 = 14;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API key is not configured")]
    MissingApiKey,
    #[error("location '{0}' not found")]
    LocationNotFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("failed to read settings: {0}")]
    Settings(#[source] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: GeocodedLocation,
    pub weather: serde_json::Value,
    pub cached: bool,
}

#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    configured_key: Option<String>,
    settings: SettingsStore,
    geocode_cache: Arc<TtlCache<GeocodedLocation>>,
    conditions_cache: Arc<TtlCache<serde_json::Value>>,
}

impl WeatherService {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        configured_key: Option<String>,
        settings: SettingsStore,
        geocode_cache: Arc<TtlCache<GeocodedLocation>>,
        conditions_cache: Arc<TtlCache<serde_json::Value>>,
    ) -> Self {
        Self {
            provider,
            configured_key: configured_key.filter(|k| !k.trim().is_empty()),
            settings,
            geocode_cache,
            conditions_cache,
        }
    }

    async fn api_key(&self) -> Result<String, WeatherError> {
        if let Some(key) = &self.configured_key {
            return Ok(key.clone());
        }
        self.settings
            .weather_api_key()
            .await
            .map_err(WeatherError::Settings)?
            .ok_or(WeatherError::MissingApiKey)
    }

    async fn locate(
        &self,
        api_key: &str,
        location: &str,
    ) -> Result<GeocodedLocation, WeatherError> {
        let key = location.trim().to_lowercase();
        if key.is_empty() {
            return Err(WeatherError::InvalidRequest("location is required".to_string()));
        }
        if let Some(hit) = self.geocode_cache.get(&key).await {
            return Ok(hit);
        }

        let found = self
            .provider
            .geocode(api_key, location.trim())
            .await?
            .ok_or_else(|| WeatherError::LocationNotFound(location.trim().to_string()))?;
        tracing::debug!("Geocoded '{}' to {}", key, found.coordinates.cache_key());
        self.geocode_cache.set(key, found.clone()).await;
        Ok(found)
    }

    pub async fn current(&self, location: &str) -> Result<WeatherReport, WeatherError> {
        let api_key = self.api_key().await?;
        let place = self.locate(&api_key, location).await?;
        let key = format!("current:{}", place.coordinates.cache_key());

        if let Some(weather) = self.conditions_cache.get(&key).await {
            return Ok(WeatherReport { location: place, weather, cached: true });
        }
        let weather = self.provider.current(&api_key, place.coordinates).await?;
        self.conditions_cache.set(key, weather.clone()).await;
        Ok(WeatherReport { location: place, weather, cached: false })
    }

    pub async fn forecast(&self, location: &str, days: u8) -> Result<WeatherReport, WeatherError> {
        if !(1..=MAX_FORECAST_DAYS).contains(&days) {
            return Err(WeatherError::InvalidRequest(format!(
                "days must be between 1 and {}",
                MAX_FORECAST_DAYS
            )));
        }
        let api_key = self.api_key().await?;
        let place = self.locate(&api_key, location).await?;
        let key = format!("forecast:{}:{}", place.coordinates.cache_key(), days);

        if let Some(weather) = self.conditions_cache.get(&key).await {
            return Ok(WeatherReport { location: place, weather, cached: true });
        }
        let weather = self.provider.forecast(&api_key, place.coordinates, days).await?;
        self.conditions_cache.set(key, weather.clone()).await;
        Ok(WeatherReport { location: place, weather, cached: false })
    }
}
