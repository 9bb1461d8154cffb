// Weather provider seam - geocoding plus conditions by coordinate
use crate::application::telemetry_repository::UpstreamError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Stable key component, rounded so float noise doesn't split entries.
    pub fn cache_key(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub name: String,
    pub coordinates: Coordinates,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// `None` when the location text matches nothing.
    async fn geocode(
        &self,
        api_key: &str,
        location: &str,
    ) -> Result<Option<GeocodedLocation>, UpstreamError>;

    async fn current(
        &self,
        api_key: &str,
        at: Coordinates,
    ) -> Result<serde_json::Value, UpstreamError>;

    async fn forecast(
        &self,
        api_key: &str,
        at: Coordinates,
        days: u8,
    ) -> Result<serde_json::Value, UpstreamError>;
}
