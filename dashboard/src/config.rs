//! Configuration management for the YieldForecast dashboard
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with YF_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{IndexParameter, LatLng};

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Forecast backend configuration
    pub api: ApiConfig,

    /// Geocoding service configuration
    pub geocoding: GeocodingConfig,

    /// Forecast job polling
    pub forecast: ForecastConfig,

    /// Initial map viewport
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the forecast backend, without trailing slash
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    /// Nominatim-compatible search endpoint
    pub endpoint: String,

    /// User-Agent sent to the geocoder (required by Nominatim's usage policy)
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Seconds between status polls
    pub poll_interval_secs: u64,

    /// Status polls before giving up
    pub max_poll_attempts: u32,

    /// Index selected in a fresh form
    pub default_parameter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("YF_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("api.base_url", "http://localhost:8080")?
            .set_default("api.timeout_secs", 30)?
            .set_default("geocoding.endpoint", "https://nominatim.openstreetmap.org")?
            .set_default("geocoding.user_agent", "yield-forecast-dashboard/0.1")?
            .set_default("forecast.poll_interval_secs", 5)?
            .set_default("forecast.max_poll_attempts", 60)?
            .set_default("forecast.default_parameter", "NDVI")?
            .set_default("map.center_lat", 51.505)?
            .set_default("map.center_lon", -0.09)?
            .set_default("map.zoom", 6)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (YF_ prefix)
            .add_source(
                Environment::with_prefix("YF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::Message(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.forecast.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "forecast.poll_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "yield-forecast-dashboard/0.1".to_string(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_poll_attempts: 60,
            default_parameter: "NDVI".to_string(),
        }
    }
}

impl ForecastConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn default_parameter(&self) -> IndexParameter {
        self.default_parameter.parse().unwrap_or_default()
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 51.505,
            center_lon: -0.09,
            zoom: 6,
        }
    }
}

impl MapConfig {
    pub fn center(&self) -> LatLng {
        LatLng::new(self.center_lat, self.center_lon)
    }
}
