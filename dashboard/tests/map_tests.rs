//! Map adapter and tile overlay reconciliation tests
//!
//! Property-based and unit tests for:
//! - drawn shapes converting into closed rings
//! - only one externally selected overlay at a time
//! - tile overlays matching the layer state after every sync
//! - no overlay left registered after detach

use std::collections::HashMap;

use proptest::prelude::*;
use shared::{Geometry, IndexParameter, LatLng, LatLngBounds, TileLayers};
use yf_dashboard::map::{
    MapAdapter, MapWidget, NativeShape, OverlayId, TileOverlayManager, VectorOverlay,
};

// ============================================================================
// Recording widget
// ============================================================================

#[derive(Debug, Default)]
struct RecordingWidget {
    next_id: OverlayId,
    tiles: HashMap<OverlayId, (String, f64)>,
    vectors: HashMap<OverlayId, VectorOverlay>,
    fits: Vec<(LatLngBounds, u32)>,
    flights: Vec<(LatLng, u8)>,
    adds: usize,
}

impl MapWidget for RecordingWidget {
    fn add_tile_overlay(&mut self, url_template: &str, opacity: f64) -> OverlayId {
        self.next_id += 1;
        self.adds += 1;
        self.tiles
            .insert(self.next_id, (url_template.to_string(), opacity));
        self.next_id
    }

    fn set_overlay_opacity(&mut self, id: OverlayId, opacity: f64) {
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.1 = opacity;
        }
    }

    fn add_vector_overlay(&mut self, overlay: VectorOverlay) -> OverlayId {
        self.next_id += 1;
        self.vectors.insert(self.next_id, overlay);
        self.next_id
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.tiles.remove(&id);
        self.vectors.remove(&id);
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: u32) {
        self.fits.push((bounds, padding_px));
    }

    fn fly_to(&mut self, center: LatLng, zoom: u8) {
        self.flights.push((center, zoom));
    }
}

fn assert_in_sync(widget: &RecordingWidget, layers: &TileLayers) {
    let displayable: Vec<_> = layers.iter().filter(|(_, s)| s.is_displayable()).collect();
    assert_eq!(widget.tiles.len(), displayable.len());
    for (_, state) in displayable {
        assert!(widget
            .tiles
            .values()
            .any(|(url, opacity)| *url == state.url && *opacity == state.opacity));
    }
}

// ============================================================================
// Tile overlay manager
// ============================================================================

#[test]
fn test_overlay_added_only_with_url() {
    let mut widget = RecordingWidget::default();
    let mut manager = TileOverlayManager::new();
    let mut layers = TileLayers::default();

    manager.sync(&mut widget, &layers);
    assert!(widget.tiles.is_empty());

    layers.show_tiles(IndexParameter::Ndvi, "https://t/ndvi/{z}/{x}/{y}".into());
    manager.sync(&mut widget, &layers);
    assert_eq!(widget.tiles.len(), 1);
    assert!(manager.overlay_for(&IndexParameter::Ndvi).is_some());
}

#[test]
fn test_opacity_updates_in_place() {
    let mut widget = RecordingWidget::default();
    let mut manager = TileOverlayManager::new();
    let mut layers = TileLayers::default();
    layers.show_tiles(IndexParameter::Ndvi, "https://t/a".into());
    manager.sync(&mut widget, &layers);
    let id = manager.overlay_for(&IndexParameter::Ndvi).unwrap();

    layers.set_opacity(&IndexParameter::Ndvi, 0.3);
    manager.sync(&mut widget, &layers);

    assert_eq!(manager.overlay_for(&IndexParameter::Ndvi), Some(id));
    assert_eq!(widget.tiles[&id].1, 0.3);
    assert_eq!(widget.adds, 1);
}

#[test]
fn test_url_change_replaces_overlay() {
    let mut widget = RecordingWidget::default();
    let mut manager = TileOverlayManager::new();
    let mut layers = TileLayers::default();
    layers.show_tiles(IndexParameter::Reci, "https://t/a".into());
    manager.sync(&mut widget, &layers);
    let first = manager.overlay_for(&IndexParameter::Reci).unwrap();

    layers.show_tiles(IndexParameter::Reci, "https://t/b".into());
    manager.sync(&mut widget, &layers);

    let second = manager.overlay_for(&IndexParameter::Reci).unwrap();
    assert_ne!(first, second);
    assert_eq!(widget.tiles.len(), 1);
    assert_eq!(widget.tiles[&second].0, "https://t/b");
}

#[test]
fn test_hidden_and_removed_layers_lose_overlay() {
    let mut widget = RecordingWidget::default();
    let mut manager = TileOverlayManager::new();
    let mut layers = TileLayers::default();
    layers.show_tiles(IndexParameter::Ndvi, "https://t/ndvi".into());
    layers.show_tiles(IndexParameter::Ndmi, "https://t/ndmi".into());
    manager.sync(&mut widget, &layers);
    assert_eq!(widget.tiles.len(), 2);

    layers.toggle(&IndexParameter::Ndvi);
    manager.sync(&mut widget, &layers);
    assert_eq!(widget.tiles.len(), 1);

    layers.remove(&IndexParameter::Ndmi);
    manager.sync(&mut widget, &layers);
    assert!(widget.tiles.is_empty());
    assert_eq!(manager.registered_count(), 0);
}

#[test]
fn test_detach_releases_every_overlay() {
    let mut widget = RecordingWidget::default();
    let mut manager = TileOverlayManager::new();
    let mut layers = TileLayers::default();
    for parameter in IndexParameter::KNOWN {
        layers.show_tiles(parameter.clone(), format!("https://t/{}", parameter));
    }
    manager.sync(&mut widget, &layers);
    assert_eq!(widget.tiles.len(), 3);

    manager.detach(&mut widget);

    assert!(widget.tiles.is_empty());
    assert_eq!(manager.registered_count(), 0);
}

#[derive(Debug, Clone)]
enum LayerOp {
    Show(usize, u8),
    Toggle(usize),
    Opacity(usize, f64),
    Remove(usize),
    Invalidate,
}

fn layer_op_strategy() -> impl Strategy<Value = LayerOp> {
    prop_oneof![
        (0..3usize, 0..3u8).prop_map(|(p, u)| LayerOp::Show(p, u)),
        (0..3usize).prop_map(LayerOp::Toggle),
        (0..3usize, 0.0..=1.0f64).prop_map(|(p, o)| LayerOp::Opacity(p, o)),
        (0..3usize).prop_map(LayerOp::Remove),
        Just(LayerOp::Invalidate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_sync_mirrors_layers(ops in prop::collection::vec(layer_op_strategy(), 1..30)) {
        let mut widget = RecordingWidget::default();
        let mut manager = TileOverlayManager::new();
        let mut layers = TileLayers::default();

        for op in ops {
            match op {
                LayerOp::Show(p, u) => {
                    let parameter = IndexParameter::KNOWN[p].clone();
                    layers.show_tiles(parameter, format!("https://t/{}/{}", p, u));
                }
                LayerOp::Toggle(p) => {
                    layers.toggle(&IndexParameter::KNOWN[p]);
                }
                LayerOp::Opacity(p, o) => {
                    layers.set_opacity(&IndexParameter::KNOWN[p], o);
                }
                LayerOp::Remove(p) => {
                    layers.remove(&IndexParameter::KNOWN[p]);
                }
                LayerOp::Invalidate => layers.invalidate(),
            }
            manager.sync(&mut widget, &layers);
            assert_in_sync(&widget, &layers);
        }

        manager.detach(&mut widget);
        prop_assert!(widget.tiles.is_empty());
    }
}

// ============================================================================
// Map adapter
// ============================================================================

#[test]
fn test_show_geometry_keeps_single_overlay() {
    let mut widget = RecordingWidget::default();
    let mut adapter = MapAdapter::new();

    let square = Geometry::rectangle(&LatLngBounds::new(
        LatLng::new(0.0, 0.0),
        LatLng::new(1.0, 1.0),
    ))
    .unwrap();
    adapter.show_geometry(&mut widget, Some(&square));
    adapter.show_geometry(&mut widget, Some(&Geometry::point(LatLng::new(5.0, 5.0))));

    assert_eq!(widget.vectors.len(), 1);
    assert!(matches!(
        widget.vectors.values().next(),
        Some(VectorOverlay::CircleMarker { .. })
    ));
    assert_eq!(widget.fits[0].1, 50);

    adapter.show_geometry(&mut widget, None);
    assert!(widget.vectors.is_empty());
    assert!(adapter.selected_overlay().is_none());
}

#[test]
fn test_circle_shows_true_circle() {
    let mut widget = RecordingWidget::default();
    let mut adapter = MapAdapter::new();
    let circle = Geometry::circle(LatLng::new(1.0, 1.0), 750.0).unwrap();

    adapter.show_geometry(&mut widget, Some(&circle));

    assert!(matches!(
        widget.vectors.values().next(),
        Some(VectorOverlay::Circle { radius_m, .. }) if *radius_m == 750.0
    ));
}

#[test]
fn test_center_hint_flies_to_location() {
    let mut widget = RecordingWidget::default();
    let mut adapter = MapAdapter::new();
    adapter.center_on(&mut widget, LatLng::new(-1.3, 36.8));
    assert_eq!(widget.flights, vec![(LatLng::new(-1.3, 36.8), 13)]);
}

fn coordinate() -> impl Strategy<Value = f64> {
    -80.0..80.0f64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_drawn_rectangle_has_closed_five_point_ring(
        lat in coordinate(), lng in coordinate(), dlat in 0.001..5.0f64, dlng in 0.001..5.0f64
    ) {
        let mut adapter = MapAdapter::new();
        let geometry = adapter
            .shape_created(NativeShape::Rectangle {
                bounds: LatLngBounds::new(LatLng::new(lat, lng), LatLng::new(lat + dlat, lng + dlng)),
            })
            .unwrap();
        let ring = geometry.exterior_ring();
        prop_assert_eq!(ring.len(), 5);
        prop_assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn prop_drawn_polygon_ring_is_closed(
        vertices in prop::collection::hash_set((-80i32..80, -170i32..170), 3..12)
    ) {
        let vertices: Vec<LatLng> = vertices
            .into_iter()
            .map(|(lat, lng)| LatLng::new(lat as f64, lng as f64))
            .collect();
        let n = vertices.len();
        let mut adapter = MapAdapter::new();

        let geometry = adapter.shape_created(NativeShape::Polygon { vertices }).unwrap();
        let ring = geometry.exterior_ring();

        prop_assert_eq!(ring.len(), n + 1);
        prop_assert_eq!(ring.first(), ring.last());
    }
}
