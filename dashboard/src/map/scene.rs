//! In-memory map widget
//!
//! [`MapScene`] records what the map should show; the browser view draws it
//! from the dashboard state snapshot.

use std::collections::BTreeMap;

use serde::Serialize;
use shared::{LatLng, LatLngBounds};

use super::adapter::{MapWidget, OverlayId, VectorOverlay};

/// Attribution shown for index tile overlays
pub const TILE_ATTRIBUTION: &str = "Google Earth Engine";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileOverlay {
    pub url_template: String,
    pub opacity: f64,
    pub attribution: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FittedBounds {
    pub bounds: LatLngBounds,
    pub padding_px: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScene {
    pub viewport: Viewport,
    /// Last fit-to-bounds request, cleared by a fly-to
    pub fitted: Option<FittedBounds>,
    pub tile_overlays: BTreeMap<OverlayId, TileOverlay>,
    pub vector_overlays: BTreeMap<OverlayId, VectorOverlay>,
    #[serde(skip)]
    next_id: OverlayId,
}

impl MapScene {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            viewport: Viewport { center, zoom },
            fitted: None,
            tile_overlays: BTreeMap::new(),
            vector_overlays: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> OverlayId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn overlay_count(&self) -> usize {
        self.tile_overlays.len() + self.vector_overlays.len()
    }
}

impl MapWidget for MapScene {
    fn add_tile_overlay(&mut self, url_template: &str, opacity: f64) -> OverlayId {
        let id = self.allocate_id();
        self.tile_overlays.insert(
            id,
            TileOverlay {
                url_template: url_template.to_string(),
                opacity,
                attribution: TILE_ATTRIBUTION,
            },
        );
        id
    }

    fn set_overlay_opacity(&mut self, id: OverlayId, opacity: f64) {
        if let Some(overlay) = self.tile_overlays.get_mut(&id) {
            overlay.opacity = opacity;
        }
    }

    fn add_vector_overlay(&mut self, overlay: VectorOverlay) -> OverlayId {
        let id = self.allocate_id();
        self.vector_overlays.insert(id, overlay);
        id
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.tile_overlays.remove(&id);
        self.vector_overlays.remove(&id);
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: u32) {
        self.viewport.center = bounds.center();
        self.fitted = Some(FittedBounds { bounds, padding_px });
    }

    fn fly_to(&mut self, center: LatLng, zoom: u8) {
        self.viewport = Viewport { center, zoom };
        self.fitted = None;
    }
}
