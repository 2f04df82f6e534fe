//! Geocoding client for the location search box
//!
//! Integrates with a Nominatim-compatible `/search` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::LatLng;

use crate::config::GeocodingConfig;
use crate::error::{AppError, AppResult};

/// First usable search hit
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub position: LatLng,
    pub display_name: String,
}

impl GeocodeHit {
    /// Leading component of the display name ("Nairobi, Kenya" -> "Nairobi")
    pub fn short_name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or_default()
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for a free-text query, `None` when nothing was found
    async fn search(&self, query: &str) -> AppResult<Option<GeocodeHit>>;
}

/// Nominatim search result; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Nominatim API client
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build geocoding client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> AppResult<Self> {
        Self::new(&GeocodingConfig {
            endpoint: base_url.into(),
            ..GeocodingConfig::default()
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> AppResult<Option<GeocodeHit>> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Http { status, body });
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to parse geocoding response: {}", e)))?;

        Ok(places.into_iter().find_map(|place| {
            let lat = place.lat.parse::<f64>().ok()?;
            let lng = place.lon.parse::<f64>().ok()?;
            Some(GeocodeHit {
                position: LatLng::new(lat, lng),
                display_name: place.display_name,
            })
        }))
    }
}
