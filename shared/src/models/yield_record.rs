//! Yield forecast records as returned by the forecast backend

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::geometry::{Geometry, GeometryError};
use crate::types::LatLng;

/// Spectral index a forecast is computed from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum IndexParameter {
    /// Normalized Difference Vegetation Index
    #[default]
    Ndvi,
    /// Normalized Difference Moisture Index
    Ndmi,
    /// Red-Edge Chlorophyll Index
    Reci,
    /// Any index name the backend reports that we do not know about
    Other(String),
}

impl IndexParameter {
    /// The three indices the dashboard offers
    pub const KNOWN: [IndexParameter; 3] = [
        IndexParameter::Ndvi,
        IndexParameter::Ndmi,
        IndexParameter::Reci,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            IndexParameter::Ndvi => "NDVI",
            IndexParameter::Ndmi => "NDMI",
            IndexParameter::Reci => "RECI",
            IndexParameter::Other(name) => name,
        }
    }

    /// Human readable description for the layer control
    pub fn description(&self) -> &'static str {
        match self {
            IndexParameter::Ndvi => "Vegetation Health",
            IndexParameter::Ndmi => "Moisture Content",
            IndexParameter::Reci => "Chlorophyll Content",
            IndexParameter::Other(_) => "Custom Index",
        }
    }

    /// Low-to-high legend gradient stops
    pub fn legend_gradient(&self) -> [&'static str; 3] {
        match self {
            IndexParameter::Ndvi => ["#ff0000", "#ffff00", "#00ff00"],
            IndexParameter::Ndmi => ["#0000ff", "#00ffff", "#00ff00"],
            IndexParameter::Reci => ["#ffff00", "#ff8800", "#ff0000"],
            IndexParameter::Other(_) => ["#e5e7eb", "#9ca3af", "#374151"],
        }
    }
}

impl std::fmt::Display for IndexParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IndexParameter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "NDVI" => IndexParameter::Ndvi,
            "NDMI" => IndexParameter::Ndmi,
            "RECI" => IndexParameter::Reci,
            _ => IndexParameter::Other(s.trim().to_string()),
        })
    }
}

impl Serialize for IndexParameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IndexParameter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // FromStr is infallible
        Ok(raw.parse().unwrap_or_default())
    }
}

/// Accepts `YYYY-MM-DD`, a full timestamp, or anything else as `None`
fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let day = s.trim().get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }))
}

/// A completed forecast for one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldRecord {
    pub id: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub parameter: Option<IndexParameter>,
    #[serde(default)]
    pub index_value: Option<f64>,
    #[serde(default)]
    pub prediction: Option<f64>,
    #[serde(default)]
    pub yield_prediction: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub geometry_json: Option<String>,
}

impl YieldRecord {
    /// Parameter, defaulting to NDVI for legacy records
    pub fn parameter_or_default(&self) -> IndexParameter {
        self.parameter.clone().unwrap_or_default()
    }

    /// Plotted value: the index value, else the legacy prediction, else 0
    pub fn chart_value(&self) -> f64 {
        self.index_value.or(self.prediction).unwrap_or(0.0)
    }

    /// Date a record is plotted at: end of the forecast window, else the run date
    pub fn chart_date(&self) -> Option<NaiveDate> {
        self.end_date.or(self.date)
    }

    /// Position from the stored latitude/longitude, if both are present
    pub fn position(&self) -> Option<LatLng> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        }
    }

    /// Stored geometry; `None` when the record carries none
    pub fn geometry(&self) -> Option<Result<Geometry, GeometryError>> {
        self.geometry_json.as_deref().map(Geometry::from_json)
    }
}
