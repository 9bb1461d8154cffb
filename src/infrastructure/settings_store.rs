// Settings file written by the setup wizard
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    weather_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read on every call so a key saved by the wizard applies without restart.
    pub async fn weather_api_key(&self) -> anyhow::Result<Option<String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let settings: StoredSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings file {}", self.path.display()))?;
        Ok(settings
            .weather_api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()))
    }
}
