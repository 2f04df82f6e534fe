//! Server-side rendering: HTML pages and the forecast history chart

pub mod chart;
pub mod pages;
pub mod svg;

pub use chart::{draw_chart, ChartCanvas, TextAnchor, TextStyle};
pub use svg::SvgCanvas;
