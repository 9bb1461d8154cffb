// InfluxDB 2.x repository - Flux over HTTP, CSV back
use crate::application::telemetry_repository::{TimeSeriesSource, UpstreamError};
use crate::infrastructure::config::InfluxSettings;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct InfluxRepository {
    client: reqwest::Client,
    host: String,
    org: String,
    token: String,
}

impl InfluxRepository {
    pub fn new(
        host: String,
        org: String,
        token: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build InfluxDB HTTP client")?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            org,
            token,
        })
    }

    pub fn from_settings(settings: &InfluxSettings) -> anyhow::Result<Self> {
        Self::new(
            settings.host.clone(),
            settings.org.clone(),
            settings.token.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    fn query_url(&self) -> String {
        format!("{}/api/v2/query?org={}", self.host, urlencoding::encode(&self.org))
    }
}

#[async_trait]
impl TimeSeriesSource for InfluxRepository {
    async fn query_csv(&self, flux: &str) -> Result<String, UpstreamError> {
        tracing::debug!("Executing Flux query:\n{}", flux);

        let response = self
            .client
            .post(self.query_url())
            .header(header::AUTHORIZATION, format!("Token {}", self.token))
            .header(header::CONTENT_TYPE, "application/vnd.flux")
            .header(header::ACCEPT, "application/csv")
            .body(flux.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("InfluxDB query failed with status {}: {}", status, body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}
