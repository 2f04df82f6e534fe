//! HTTP handlers

pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod pages;
pub mod telegram;

pub use dashboard::*;
pub use health::*;
pub use notifications::*;
pub use pages::*;
pub use telegram::*;
