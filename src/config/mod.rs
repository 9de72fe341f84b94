//! Gateway settings
//!
//! Values resolve in three layers, later ones winning: the defaults on each
//! struct, `config/recipegate.toml` (or `$RECIPEGATE_CONFIG`, or `--config`),
//! then `RECIPEGATE__<SECTION>__<KEY>` variables such as
//! `RECIPEGATE__SERVER__ENVIRONMENT=production` or
//! `RECIPEGATE__CONTENT_STORE__MAX_DOCUMENT_BYTES=2MB`.
//!
//! The store bearer token is only ever taken from `RECIPEGATE_STORE_TOKEN`,
//! falling back to `GITHUB_TOKEN`.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    Config, ContentStoreConfig, Environment, GateConfig, IndexConfig, ServerConfig,
};
pub use validation::{LISTING_ROOT, ValidationError};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Resolve every layer, secrets included, and validate the result
    ///
    /// `path` overrides `RECIPEGATE_CONFIG` and the default location.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// File and environment layers only; secrets stay unset
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
