//! External API integrations

pub mod forecast_api;
pub mod geocoding;

pub use forecast_api::{ForecastApiClient, ForecastBackend};
pub use geocoding::{GeocodeHit, Geocoder, NominatimClient};
