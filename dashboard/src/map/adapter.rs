//! Map/drawing adapter
//!
//! Converts shapes drawn with the map's drawing tools into [`Geometry`] and
//! reflects an externally selected geometry back onto the map widget.

use serde::{Deserialize, Serialize};
use shared::{Geometry, GeometryError, LatLng, LatLngBounds};

/// Handle of an overlay registered with a [`MapWidget`]
pub type OverlayId = u64;

/// Padding used when fitting the viewport to a selected geometry
pub const FIT_PADDING_PX: u32 = 50;
/// Zoom used when flying to a searched location
pub const FLY_TO_ZOOM: u8 = 13;
/// Radius of the marker drawn for a bare point
pub const POINT_MARKER_RADIUS_PX: f64 = 8.0;

/// Stroke and fill of a vector overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayStyle {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
}

/// Polygons and rectangles of a selected record
pub const SELECTED_SHAPE_STYLE: OverlayStyle = OverlayStyle {
    color: "#3b82f6",
    weight: 3.0,
    opacity: 0.8,
    fill_color: "#3b82f6",
    fill_opacity: 0.2,
};

/// Circles and point markers of a selected record
pub const SELECTED_POINT_STYLE: OverlayStyle = OverlayStyle {
    color: "#1e40af",
    weight: 3.0,
    opacity: 0.8,
    fill_color: "#3b82f6",
    fill_opacity: 0.2,
};

/// A vector overlay as the widget draws it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorOverlay {
    Polygon {
        ring: Vec<LatLng>,
        style: OverlayStyle,
    },
    /// True circle, radius in meters
    Circle {
        center: LatLng,
        radius_m: f64,
        style: OverlayStyle,
    },
    /// Fixed-size marker, radius in screen pixels
    CircleMarker {
        center: LatLng,
        radius_px: f64,
        style: OverlayStyle,
    },
}

impl VectorOverlay {
    /// Styled overlay for a selected geometry
    pub fn for_geometry(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Polygon { .. } => VectorOverlay::Polygon {
                ring: geometry.exterior_ring(),
                style: SELECTED_SHAPE_STYLE,
            },
            Geometry::Point {
                coordinates,
                radius: Some(radius),
            } => VectorOverlay::Circle {
                center: LatLng::from_position(*coordinates),
                radius_m: *radius,
                style: SELECTED_POINT_STYLE,
            },
            Geometry::Point {
                coordinates,
                radius: None,
            } => VectorOverlay::CircleMarker {
                center: LatLng::from_position(*coordinates),
                radius_px: POINT_MARKER_RADIUS_PX,
                style: SELECTED_POINT_STYLE,
            },
        }
    }
}

/// Operations the dashboard needs from a map widget
pub trait MapWidget {
    fn add_tile_overlay(&mut self, url_template: &str, opacity: f64) -> OverlayId;
    fn set_overlay_opacity(&mut self, id: OverlayId, opacity: f64);
    fn add_vector_overlay(&mut self, overlay: VectorOverlay) -> OverlayId;
    /// Remove a tile or vector overlay; unknown ids are ignored
    fn remove_overlay(&mut self, id: OverlayId);
    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: u32);
    fn fly_to(&mut self, center: LatLng, zoom: u8);
}

/// A shape as the drawing tools produce it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum NativeShape {
    Polygon { vertices: Vec<LatLng> },
    Rectangle { bounds: LatLngBounds },
    Circle { center: LatLng, radius: f64 },
}

impl NativeShape {
    pub fn to_geometry(&self) -> Result<Geometry, GeometryError> {
        match self {
            NativeShape::Polygon { vertices } => Geometry::polygon(vertices),
            NativeShape::Rectangle { bounds } => Geometry::rectangle(bounds),
            NativeShape::Circle { center, radius } => Geometry::circle(*center, *radius),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            NativeShape::Polygon { .. } => "polygon",
            NativeShape::Rectangle { .. } => "rectangle",
            NativeShape::Circle { .. } => "circle",
        }
    }

    /// Apply an edit event. Returns false when the event does not fit this shape.
    pub fn apply(&mut self, mutation: &ShapeMutation) -> bool {
        match (self, mutation) {
            (NativeShape::Polygon { vertices }, ShapeMutation::VertexInserted { index, position }) => {
                if *index > vertices.len() {
                    return false;
                }
                vertices.insert(*index, *position);
                true
            }
            (NativeShape::Polygon { vertices }, ShapeMutation::VertexMoved { index, position }) => {
                match vertices.get_mut(*index) {
                    Some(vertex) => {
                        *vertex = *position;
                        true
                    }
                    None => false,
                }
            }
            (NativeShape::Polygon { vertices }, ShapeMutation::VertexRemoved { index }) => {
                if *index >= vertices.len() {
                    return false;
                }
                vertices.remove(*index);
                true
            }
            (NativeShape::Rectangle { bounds }, ShapeMutation::BoundsChanged { bounds: new }) => {
                *bounds = *new;
                true
            }
            (NativeShape::Circle { center, .. }, ShapeMutation::CenterMoved { center: new }) => {
                *center = *new;
                true
            }
            (NativeShape::Circle { radius, .. }, ShapeMutation::RadiusChanged { radius: new }) => {
                *radius = *new;
                true
            }
            _ => false,
        }
    }
}

/// Shape-specific edit events emitted while a drawn shape is being edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ShapeMutation {
    VertexInserted { index: usize, position: LatLng },
    VertexMoved { index: usize, position: LatLng },
    VertexRemoved { index: usize },
    BoundsChanged { bounds: LatLngBounds },
    CenterMoved { center: LatLng },
    RadiusChanged { radius: f64 },
}

/// Tracks the user-drawn shape and the externally selected overlay
#[derive(Debug, Default)]
pub struct MapAdapter {
    drawn: Option<NativeShape>,
    selected_overlay: Option<OverlayId>,
}

impl MapAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drawn_shape(&self) -> Option<&NativeShape> {
        self.drawn.as_ref()
    }

    /// A new shape was drawn; it replaces any previously drawn one
    pub fn shape_created(&mut self, shape: NativeShape) -> Result<Geometry, GeometryError> {
        let geometry = shape.to_geometry()?;
        self.drawn = Some(shape);
        Ok(geometry)
    }

    /// The drawn shape was replaced wholesale by the edit toolbar
    pub fn shape_edited(&mut self, shape: NativeShape) -> Result<Geometry, GeometryError> {
        self.shape_created(shape)
    }

    /// Apply one edit event to the tracked shape.
    ///
    /// Returns `None` when nothing is tracked or the event does not fit the
    /// tracked shape. A mutation that leaves the shape invalid is not kept.
    pub fn shape_mutated(
        &mut self,
        mutation: &ShapeMutation,
    ) -> Option<Result<Geometry, GeometryError>> {
        let Some(tracked) = self.drawn.as_ref() else {
            tracing::debug!("Ignoring {:?}: no drawn shape", mutation);
            return None;
        };
        let mut candidate = tracked.clone();
        if !candidate.apply(mutation) {
            tracing::debug!("Ignoring {:?} for {} shape", mutation, tracked.kind());
            return None;
        }
        let result = candidate.to_geometry();
        if result.is_ok() {
            self.drawn = Some(candidate);
        }
        Some(result)
    }

    pub fn shape_deleted(&mut self) {
        self.drawn = None;
    }

    /// Show `geometry` as the selected overlay, replacing the previous one
    pub fn show_geometry<W: MapWidget>(&mut self, widget: &mut W, geometry: Option<&Geometry>) {
        if let Some(id) = self.selected_overlay.take() {
            widget.remove_overlay(id);
        }
        let Some(geometry) = geometry else {
            return;
        };
        self.selected_overlay = Some(widget.add_vector_overlay(VectorOverlay::for_geometry(geometry)));
        if let Some(bounds) = geometry.bounds() {
            widget.fit_bounds(bounds, FIT_PADDING_PX);
        }
    }

    /// Fly the map to a center hint
    pub fn center_on<W: MapWidget>(&mut self, widget: &mut W, center: LatLng) {
        widget.fly_to(center, FLY_TO_ZOOM);
    }

    pub fn selected_overlay(&self) -> Option<OverlayId> {
        self.selected_overlay
    }
}
