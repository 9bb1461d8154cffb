use crate::domain::series::NullPolicy;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub influx: InfluxSettings,
    pub weather: WeatherSettings,
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunEnvironment {
    Development,
    Production,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub environment: RunEnvironment,
}

impl ServerSettings {
    pub fn is_development(&self) -> bool {
        self.environment == RunEnvironment::Development
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub org: String,
    pub bucket: String,
    pub token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherSettings {
    pub base_url: String,
    /// Falls back to the setup wizard's settings file when unset.
    pub api_key: Option<String>,
    pub settings_path: String,
    pub timeout_secs: u64,
    pub forecast_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub realtime_measurement: String,
    pub power_measurement: String,
    pub extremes_measurement: String,
    pub consumption_measurement: String,
    pub device_model: Option<String>,
    pub realtime_window_secs: u32,
    pub null_policy: NullPolicy,
    pub max_records: usize,
}

fn builder() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("server.environment", "production")?
        .set_default("influx.host", "http://localhost:8086")?
        .set_default("influx.org", "energy")?
        .set_default("influx.bucket", "energy")?
        .set_default("influx.token", "")?
        .set_default("influx.timeout_secs", 10)?
        .set_default("weather.base_url", "https://api.weatherapi.com/v1")?
        .set_default("weather.settings_path", "config/settings.json")?
        .set_default("weather.timeout_secs", 10)?
        .set_default("weather.forecast_ttl_secs", 3 * 3600)?
        .set_default("dashboard.realtime_measurement", "modbus_sensor")?
        .set_default("dashboard.power_measurement", "energy_flow")?
        .set_default("dashboard.extremes_measurement", "modbus_extremes")?
        .set_default("dashboard.consumption_measurement", "modbus_sensor")?
        .set_default("dashboard.realtime_window_secs", 600)?
        .set_default("dashboard.null_policy", "zero")?
        .set_default("dashboard.max_records", 500)
}

/// Defaults, then `config/dashboard.toml` if present, then
/// `DASHBOARD__SECTION__KEY` environment variables.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
