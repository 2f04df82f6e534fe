//! Shared types and models for the YieldForecast dashboard
//!
//! This crate contains the domain types and pure logic shared between the
//! dashboard server and the browser (via WASM). It performs no I/O.

pub mod chart;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
