// Upstream seams: the time-series store and the failures it can report
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-2xx answer; status and body are passed through to the client.
    #[error("upstream responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream returned unexpected content type '{0}'")]
    ContentType(String),

    #[error("upstream timed out")]
    Timeout,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Other(anyhow::Error::new(e).context("upstream request failed"))
        }
    }
}

#[async_trait]
pub trait TimeSeriesSource: Send + Sync {
    /// Run a Flux query and return the raw CSV body.
    async fn query_csv(&self, flux: &str) -> Result<String, UpstreamError>;
}
