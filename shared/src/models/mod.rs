//! Domain models for the YieldForecast dashboard

mod account;
mod availability;
mod forecast;
mod geometry;
mod notification;
mod tile_layer;
mod yield_record;

pub use account::*;
pub use availability::*;
pub use forecast::*;
pub use geometry::*;
pub use notification::*;
pub use tile_layer::*;
pub use yield_record::*;
