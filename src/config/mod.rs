//! Configuration system for flux-zombies
//!
//! Layered YAML configuration: built-in defaults, the user's root config
//! file, an explicit `--config` file and environment overrides.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, ExcludeRule, OutputFormat};
