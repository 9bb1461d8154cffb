// Weather HTTP client - search/current/forecast endpoints keyed by API key
use crate::application::telemetry_repository::UpstreamError;
use crate::application::weather_provider::{Coordinates, GeocodedLocation, WeatherProvider};
use crate::infrastructure::config::WeatherSettings;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchHit {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

impl SearchHit {
    fn into_location(self) -> GeocodedLocation {
        let name = [self.name, self.region, self.country]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        GeocodedLocation {
            name,
            coordinates: Coordinates { lat: self.lat, lng: self.lon },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpWeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWeatherClient {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &WeatherSettings) -> anyhow::Result<Self> {
        Self::new(settings.base_url.clone(), Duration::from_secs(settings.timeout_secs))
    }

    fn url(&self, endpoint: &str, api_key: &str, q: &str) -> String {
        format!(
            "{}/{}?key={}&q={}",
            self.base_url,
            endpoint,
            urlencoding::encode(api_key),
            urlencoding::encode(q)
        )
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API responded with status {}: {}", status, body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // An HTML page with a 200 usually means a bad key or a captive proxy.
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_json(&content_type) {
            tracing::warn!("Weather API returned content type '{}'", content_type);
            return Err(UpstreamError::ContentType(content_type));
        }

        Ok(response.json::<serde_json::Value>().await?)
    }
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

fn coordinates_query(at: Coordinates) -> String {
    format!("{},{}", at.lat, at.lng)
}

#[async_trait]
impl WeatherProvider for HttpWeatherClient {
    async fn geocode(
        &self,
        api_key: &str,
        location: &str,
    ) -> Result<Option<GeocodedLocation>, UpstreamError> {
        let value = self.get_json(&self.url("search.json", api_key, location)).await?;
        let hits: Vec<SearchHit> = serde_json::from_value(value)
            .context("Unexpected geocoding response shape")?;
        Ok(hits.into_iter().next().map(SearchHit::into_location))
    }

    async fn current(
        &self,
        api_key: &str,
        at: Coordinates,
    ) -> Result<serde_json::Value, UpstreamError> {
        self.get_json(&self.url("current.json", api_key, &coordinates_query(at))).await
    }

    async fn forecast(
        &self,
        api_key: &str,
        at: Coordinates,
        days: u8,
    ) -> Result<serde_json::Value, UpstreamError> {
        let base = self.url("forecast.json", api_key, &coordinates_query(at));
        let url = format!("{}&days={}", base, days);
        self.get_json(&url).await
    }
}
