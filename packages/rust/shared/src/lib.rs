//! Shared types, error model, and configuration for protomerge.
//!
//! This crate is the foundation depended on by all other protomerge crates.
//! It provides:
//! - [`ProtomergeError`]: the unified error type
//! - Record types ([`RawRecord`], [`CategorySet`], [`CanonicalRecord`])
//! - Configuration ([`AppConfig`], [`FilterPolicy`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_MIN_SIZE, FeedConfig, FilterConfig, FilterPolicy, PathsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ProtomergeError, Result};
pub use types::{CanonicalRecord, CategorySet, RawRecord};
