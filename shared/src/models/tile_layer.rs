//! Per-index raster overlay state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::yield_record::IndexParameter;

/// Opacity applied to a layer the first time it is shown
pub const DEFAULT_LAYER_OPACITY: f64 = 0.7;

/// Visibility, opacity and tile URL template of one index overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerState {
    pub url: String,
    pub opacity: f64,
    pub visible: bool,
}

impl Default for TileLayerState {
    fn default() -> Self {
        Self {
            url: String::new(),
            opacity: DEFAULT_LAYER_OPACITY,
            visible: false,
        }
    }
}

impl TileLayerState {
    /// Whether the map should currently carry an overlay for this layer
    pub fn is_displayable(&self) -> bool {
        self.visible && !self.url.is_empty()
    }
}

/// Layer state keyed by index parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayers(BTreeMap<IndexParameter, TileLayerState>);

impl Default for TileLayers {
    /// NDVI, NDMI and RECI present, hidden, without URLs
    fn default() -> Self {
        Self(
            IndexParameter::KNOWN
                .iter()
                .cloned()
                .map(|p| (p, TileLayerState::default()))
                .collect(),
        )
    }
}

impl TileLayers {
    /// No layers at all
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, parameter: &IndexParameter) -> Option<&TileLayerState> {
        self.0.get(parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndexParameter, &TileLayerState)> {
        self.0.iter()
    }

    pub fn insert(&mut self, parameter: IndexParameter, state: TileLayerState) {
        self.0.insert(parameter, state);
    }

    pub fn remove(&mut self, parameter: &IndexParameter) -> Option<TileLayerState> {
        self.0.remove(parameter)
    }

    /// Flip visibility. Returns the new visibility, `None` for an unknown layer.
    pub fn toggle(&mut self, parameter: &IndexParameter) -> Option<bool> {
        let layer = self.0.get_mut(parameter)?;
        layer.visible = !layer.visible;
        Some(layer.visible)
    }

    /// Set opacity clamped to `[0, 1]`. Returns the applied value.
    pub fn set_opacity(&mut self, parameter: &IndexParameter, opacity: f64) -> Option<f64> {
        let layer = self.0.get_mut(parameter)?;
        layer.opacity = if opacity.is_nan() {
            layer.opacity
        } else {
            opacity.clamp(0.0, 1.0)
        };
        Some(layer.opacity)
    }

    /// Install a freshly computed tile URL and show the layer, keeping its opacity
    pub fn show_tiles(&mut self, parameter: IndexParameter, url: String) {
        let layer = self.0.entry(parameter).or_default();
        layer.url = url;
        layer.visible = true;
    }

    /// Drop every URL and hide every layer (geometry or date range changed)
    pub fn invalidate(&mut self) {
        for layer in self.0.values_mut() {
            layer.url.clear();
            layer.visible = false;
        }
    }

    pub fn any_visible(&self) -> bool {
        self.0.values().any(|l| l.visible)
    }
}
