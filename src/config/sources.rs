use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "RECIPEGATE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/recipegate.toml";
const ENV_PREFIX: &str = "RECIPEGATE";
const ENV_SEPARATOR: &str = "__";

const STORE_TOKEN_VARS: [&str; 2] = ["RECIPEGATE_STORE_TOKEN", "GITHUB_TOKEN"];

/// Defaults, then the TOML file, then `.env` and process variables, then secrets
pub fn load(explicit_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = explicit_path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// The store token is read from the environment only
fn load_secrets(config: &mut Config) {
    config.content_store.token = STORE_TOKEN_VARS
        .iter()
        .find_map(|name| env::var(name).ok().filter(|value| !value.is_empty()));
}

/// File layer (skipped when absent) under the `RECIPEGATE__` environment layer
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let file_present = config_path.exists();
    if file_present {
        tracing::info!(path = %config_path.display(), "Reading configuration file");
    } else {
        tracing::warn!(
            path = %config_path.display(),
            "No configuration file, running on defaults and environment"
        );
    }

    // RECIPEGATE__SERVER__BIND_ADDR -> server.bind_addr
    let environment = Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    config::Config::builder()
        .add_source(File::from(config_path).required(file_present))
        .add_source(environment)
        .build()?
        .try_deserialize()
}
