//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::{Route, RouteError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
    #[error("Route {name:?}: {source}")]
    Route {
        name: String,
        #[source]
        source: RouteError,
    },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Build the declared routes, in manifest order.
pub fn build_routes(config: &RouterConfig) -> Result<Vec<Route>, ConfigError> {
    config
        .routes
        .iter()
        .map(|rc| {
            let mut route = Route::parse(&rc.pattern)
                .map_err(|source| ConfigError::Route {
                    name: rc.name.clone(),
                    source,
                })?
                .named(&rc.name);
            if let Some(policy) = &rc.cache {
                route = route.with_cache_policy(policy.to_entry_options());
            }
            for (key, value) in &rc.meta {
                route = route.with_meta(key, value.clone());
            }
            Ok(route)
        })
        .collect()
}
