//! Configuration module for Botmon Edge
//!
//! This module loads and validates the local TOML configuration, defines the
//! override layers shared by the local file and remote bundles, and resolves
//! them into the per-request [`ResolvedConfig`].
//!
//! # Example
//!
//! ```no_run
//! use botmon_edge::config::{load_config, ConfigResolver};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("botmon.toml")).unwrap();
//! let resolved = ConfigResolver::new(config.overrides).resolve(None);
//! println!("GEO enabled: {}", resolved.geo.enabled);
//! ```

mod parser;
mod resolver;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalyticsSettings, ConfigOverrides, EdgeConfig, GeoConfig, GeoOverride, ManagedFileConfig,
    ManagedFileOverride, Mode, PageRule, PageType, RemoteSettings, ResolvedConfig, SchemaType,
    WellKnownConfig, WellKnownFile, WellKnownFileOverride, WellKnownOverride,
};

// Re-export parser and resolver functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config, API_KEY_ENV};
pub use resolver::{apply_layer, ConfigResolver};
pub use validation::{validate, validate_overrides};
