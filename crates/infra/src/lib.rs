//! Infrastructure layer: catalog storage and configuration.

pub mod catalog;
pub mod config;


pub use catalog::InMemoryCatalog;
pub use config::EngineConfig;
