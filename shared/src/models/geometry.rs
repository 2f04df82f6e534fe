//! Zone geometry in GeoJSON form
//!
//! Drawing widgets produce polygons, rectangles and circles; the forecast
//! backend only understands GeoJSON `Polygon` and `Point` (with an optional
//! `radius` member for circles). Every consumer matches on [`Geometry`]
//! exhaustively, so a new shape kind cannot silently fall through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{LatLng, LatLngBounds};

/// Meters per degree of latitude (mean)
const METERS_PER_DEGREE: f64 = 111_320.0;

/// A zone geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Closed rings of `[lon, lat]` positions; the first ring is the exterior
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    /// A point, or a circle when `radius` (meters) is present
    Point {
        coordinates: [f64; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
}

/// Errors raised while building or parsing a geometry
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Polygon needs at least 3 distinct vertices, found {found}")]
    TooFewVertices { found: usize },

    #[error("Coordinates must be finite numbers")]
    NonFinite,

    #[error("Circle radius must be positive, got {0}")]
    InvalidRadius(f64),

    #[error("Invalid geometry JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Geometry {
    /// Build a polygon from a drawn ring, closing it by repeating the first vertex.
    ///
    /// A ring that already ends on its first vertex is not closed twice.
    pub fn polygon(ring: &[LatLng]) -> Result<Self, GeometryError> {
        ensure_finite(ring.iter().copied())?;

        let mut positions: Vec<[f64; 2]> = ring.iter().map(|p| p.to_position()).collect();
        let already_closed = positions.len() > 1 && positions.first() == positions.last();
        let distinct = if already_closed {
            positions.len() - 1
        } else {
            positions.len()
        };
        if distinct < 3 {
            return Err(GeometryError::TooFewVertices { found: distinct });
        }
        if !already_closed {
            positions.push(positions[0]);
        }

        Ok(Geometry::Polygon {
            coordinates: vec![positions],
        })
    }

    /// Expand rectangle bounds into an explicit closed 5-point ring (SW, NW, NE, SE, SW)
    pub fn rectangle(bounds: &LatLngBounds) -> Result<Self, GeometryError> {
        if !bounds.is_valid() {
            return Err(GeometryError::NonFinite);
        }
        let sw = bounds.south_west;
        let ring = vec![
            sw.to_position(),
            bounds.north_west().to_position(),
            bounds.north_east.to_position(),
            bounds.south_east().to_position(),
            sw.to_position(),
        ];
        Ok(Geometry::Polygon {
            coordinates: vec![ring],
        })
    }

    /// Encode a circle as a `Point` carrying its radius in meters
    pub fn circle(center: LatLng, radius_meters: f64) -> Result<Self, GeometryError> {
        ensure_finite([center])?;
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(GeometryError::InvalidRadius(radius_meters));
        }
        Ok(Geometry::Point {
            coordinates: center.to_position(),
            radius: Some(radius_meters),
        })
    }

    /// A bare point (no radius)
    pub fn point(position: LatLng) -> Self {
        Geometry::Point {
            coordinates: position.to_position(),
            radius: None,
        }
    }

    /// Parse a serialized geometry, as stored in `YieldRecord::geometry_json`
    pub fn from_json(json: &str) -> Result<Self, GeometryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> String {
        // Serializing plain numbers and strings cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Exterior ring as map positions (empty for points)
    pub fn exterior_ring(&self) -> Vec<LatLng> {
        match self {
            Geometry::Polygon { coordinates } => coordinates
                .first()
                .map(|ring| ring.iter().copied().map(LatLng::from_position).collect())
                .unwrap_or_default(),
            Geometry::Point { .. } => Vec::new(),
        }
    }

    /// Representative position: the point itself or the first polygon vertex
    pub fn anchor(&self) -> Option<LatLng> {
        match self {
            Geometry::Polygon { coordinates } => coordinates
                .first()
                .and_then(|ring| ring.first())
                .copied()
                .map(LatLng::from_position),
            Geometry::Point { coordinates, .. } => Some(LatLng::from_position(*coordinates)),
        }
    }

    /// Radius in meters when this geometry is a circle
    pub fn radius(&self) -> Option<f64> {
        match self {
            Geometry::Point { radius, .. } => *radius,
            Geometry::Polygon { .. } => None,
        }
    }

    /// Bounding box; circles are approximated with an equirectangular projection
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            Geometry::Polygon { coordinates } => LatLngBounds::from_points(
                coordinates
                    .iter()
                    .flatten()
                    .copied()
                    .map(LatLng::from_position),
            ),
            Geometry::Point {
                coordinates,
                radius,
            } => {
                let center = LatLng::from_position(*coordinates);
                let r = radius.unwrap_or(0.0);
                let d_lat = r / METERS_PER_DEGREE;
                let d_lng = r / (METERS_PER_DEGREE * center.lat.to_radians().cos().max(1e-9));
                Some(LatLngBounds::new(
                    LatLng::new(center.lat - d_lat, center.lng - d_lng),
                    LatLng::new(center.lat + d_lat, center.lng + d_lng),
                ))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon { .. } => "Polygon",
            Geometry::Point { radius: Some(_), .. } => "Circle",
            Geometry::Point { radius: None, .. } => "Point",
        }
    }
}

fn ensure_finite<I>(points: I) -> Result<(), GeometryError>
where
    I: IntoIterator<Item = LatLng>,
{
    if points
        .into_iter()
        .all(|p| p.lat.is_finite() && p.lng.is_finite())
    {
        Ok(())
    } else {
        Err(GeometryError::NonFinite)
    }
}
