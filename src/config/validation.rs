//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (fallback names an existing route)
//! - Validate value ranges (capacity > 0, timeouts > 0)
//! - Reject unparsable patterns and duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::Route;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.cache.capacity == 0 {
        errors.push(ValidationError::new("cache.capacity", "must be greater than zero"));
    }
    if config.navigation.suspense_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "navigation.suspense_timeout_ms",
            "must be greater than zero",
        ));
    }
    if config.navigation.transition_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "navigation.transition_timeout_ms",
            "must be greater than zero",
        ));
    }

    let mut names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{}]", i);
        if route.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.name"), "must not be empty"));
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{field}.name"),
                format!("duplicate route name {:?}", route.name),
            ));
        }
        if let Err(e) = Route::parse(&route.pattern) {
            errors.push(ValidationError::new(format!("{field}.pattern"), e.to_string()));
        }
        if let Some(policy) = &route.cache {
            if policy.ttl_ms == Some(0) {
                errors.push(ValidationError::new(
                    format!("{field}.cache.ttl_ms"),
                    "must be greater than zero",
                ));
            }
        }
    }

    if let Some(fallback) = &config.fallback {
        if !names.contains(fallback.as_str()) {
            errors.push(ValidationError::new(
                "fallback",
                format!("unknown route {:?}", fallback),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(name: &str, pattern: &str) -> RouteConfig {
        RouteConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
            cache: None,
            meta: Default::default(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = RouterConfig::default();
        config.cache.capacity = 0;
        config.routes = vec![
            route("home", "/"),
            route("home", "/again"),
            route("broken", "no-slash"),
        ];
        config.fallback = Some("missing".to_string());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["cache.capacity", "routes[1].name", "routes[2].pattern", "fallback"]
        );
    }
}
