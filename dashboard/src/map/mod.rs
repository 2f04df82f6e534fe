//! Map widget abstraction, drawing adapter and tile overlays

pub mod adapter;
pub mod scene;
pub mod tiles;

pub use adapter::{
    MapAdapter, MapWidget, NativeShape, OverlayId, OverlayStyle, ShapeMutation, VectorOverlay,
};
pub use scene::MapScene;
pub use tiles::TileOverlayManager;
