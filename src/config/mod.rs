//! Configuration module for transparencia
//!
//! - Base directory resolution (environment override or platform default)
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::TransparencyPaths;
pub use settings::Settings;
