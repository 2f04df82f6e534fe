//! Tile overlay manager
//!
//! Reconciles the per-index [`TileLayers`] state against the tile overlays
//! registered with a [`MapWidget`].

use std::collections::BTreeMap;

use shared::{IndexParameter, TileLayers};

use super::adapter::{MapWidget, OverlayId};

#[derive(Debug, Clone, PartialEq)]
struct RegisteredTile {
    id: OverlayId,
    url: String,
    opacity: f64,
}

#[derive(Debug, Default)]
pub struct TileOverlayManager {
    registered: BTreeMap<IndexParameter, RegisteredTile>,
}

impl TileOverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the widget's overlays in line with `layers`
    pub fn sync<W: MapWidget>(&mut self, widget: &mut W, layers: &TileLayers) {
        // Overlays whose layer key disappeared
        let stale: Vec<IndexParameter> = self
            .registered
            .keys()
            .filter(|param| layers.get(param).is_none())
            .cloned()
            .collect();
        for param in stale {
            self.unregister(widget, &param);
        }

        for (param, state) in layers.iter() {
            if !state.is_displayable() {
                self.unregister(widget, param);
                continue;
            }

            match self.registered.get_mut(param) {
                Some(tile) if tile.url == state.url => {
                    if tile.opacity != state.opacity {
                        widget.set_overlay_opacity(tile.id, state.opacity);
                        tile.opacity = state.opacity;
                    }
                }
                _ => {
                    self.unregister(widget, param);
                    let id = widget.add_tile_overlay(&state.url, state.opacity);
                    tracing::debug!("Added {} tile overlay #{}", param, id);
                    self.registered.insert(
                        param.clone(),
                        RegisteredTile {
                            id,
                            url: state.url.clone(),
                            opacity: state.opacity,
                        },
                    );
                }
            }
        }
    }

    /// Remove every registered overlay from the widget
    pub fn detach<W: MapWidget>(&mut self, widget: &mut W) {
        for (_, tile) in std::mem::take(&mut self.registered) {
            widget.remove_overlay(tile.id);
        }
    }

    pub fn overlay_for(&self, param: &IndexParameter) -> Option<OverlayId> {
        self.registered.get(param).map(|t| t.id)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    fn unregister<W: MapWidget>(&mut self, widget: &mut W, param: &IndexParameter) {
        if let Some(tile) = self.registered.remove(param) {
            widget.remove_overlay(tile.id);
            tracing::debug!("Removed {} tile overlay #{}", param, tile.id);
        }
    }
}
