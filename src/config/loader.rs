//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (KBC_ACCESS__*, then KBC_MANAGE_API_TOKEN / KBC_ORG_ID)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "keboola-access.toml",
    ".keboola-access.toml",
    "~/.config/keboola-access/config.toml",
];

/// Conventional variable holding the management token preset
pub const TOKEN_ENV_VAR: &str = "KBC_MANAGE_API_TOKEN";

/// Conventional variable holding the organization preset
pub const ORG_ENV_VAR: &str = "KBC_ORG_ID";

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g. KBC_ACCESS__MANAGE__STACK, KBC_ACCESS__DASHBOARD__PORT
    builder = builder.add_source(
        Environment::with_prefix("KBC_ACCESS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR)
        && !token.is_empty()
    {
        builder = builder
            .set_override("manage.token", token)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    if let Ok(org) = std::env::var(ORG_ENV_VAR)
        && !org.is_empty()
    {
        builder = builder
            .set_override("manage.organization_id", org)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
///
/// Token and organization are optional here; commands that need them
/// check at the time they run.
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // Resolves the stack; `manage.url` only matters for the custom stack
    config.manage.api_url()?;

    if config.manage.timeout_secs == Some(0) {
        return Err(ConfigError::Invalid {
            message: "manage.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.dashboard.port == 0 {
        return Err(ConfigError::Invalid {
            message: "dashboard.port must be greater than 0".to_string(),
        });
    }

    Ok(())
}
