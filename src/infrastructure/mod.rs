//! Infrastructure layer: configuration loading, logging setup, and the
//! `Engine` composition root that wires adapters into services.

pub mod config;
pub mod engine;
pub mod logging;

pub use config::ConfigLoader;
pub use engine::Engine;
