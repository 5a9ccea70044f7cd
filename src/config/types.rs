//! Configuration types for keboola-access
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::error::ConfigError;
use crate::util::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Management API connection settings
    pub manage: ManageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Dashboard configuration
    pub dashboard: DashboardConfigToml,
}

/// Dashboard configuration (TOML format)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfigToml {
    /// Dashboard host
    pub host: String,

    /// Dashboard port
    pub port: u16,
}

impl Default for DashboardConfigToml {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 19893,
        }
    }
}

/// Management API connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManageConfig {
    /// Keboola stack the organization lives on
    pub stack: Stack,

    /// API host, only used with `stack = "custom"`
    #[serde(default)]
    pub url: Option<String>,

    /// Management API token preset (prefer env var KBC_MANAGE_API_TOKEN)
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Organization ID preset
    #[serde(default)]
    pub organization_id: Option<String>,

    /// Request timeout in seconds (transport default when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,
}

impl Default for ManageConfig {
    fn default() -> Self {
        Self {
            stack: Stack::default(),
            url: None,
            token: None,
            organization_id: None,
            timeout_secs: None,
            verify_ssl: true,
        }
    }
}

impl ManageConfig {
    /// Resolve the API base URL for the configured stack
    pub fn api_url(&self) -> Result<String, ConfigError> {
        let host = match self.stack.url() {
            Some(url) => url.to_string(),
            None => self.url.clone().ok_or_else(|| ConfigError::Missing {
                field: "manage.url (required for the custom stack)".to_string(),
            })?,
        };

        validate_host(&host)?;
        Ok(host.trim_end_matches('/').to_string())
    }
}

/// Reject hosts that are not http(s) URLs
pub fn validate_host(host: &str) -> Result<(), ConfigError> {
    if host.starts_with("http://") || host.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidHost {
            host: host.to_string(),
        })
    }
}

/// Keboola stacks with a fixed connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stack {
    /// US Virginia (AWS)
    #[default]
    UsVirginiaAws,
    /// US Virginia (GCP)
    UsVirginiaGcp,
    /// EU Frankfurt (AWS)
    EuFrankfurtAws,
    /// EU Ireland (Azure)
    EuIrelandAzure,
    /// EU Frankfurt (GCP)
    EuFrankfurtGcp,
    /// Any other host, taken from `manage.url`
    Custom,
}

impl Stack {
    pub const ALL: [Stack; 6] = [
        Stack::UsVirginiaAws,
        Stack::UsVirginiaGcp,
        Stack::EuFrankfurtAws,
        Stack::EuIrelandAzure,
        Stack::EuFrankfurtGcp,
        Stack::Custom,
    ];

    /// Connection URL, `None` for the custom stack
    pub fn url(self) -> Option<&'static str> {
        match self {
            Stack::UsVirginiaAws => Some("https://connection.keboola.com"),
            Stack::UsVirginiaGcp => Some("https://connection.us-east4.gcp.keboola.com"),
            Stack::EuFrankfurtAws => Some("https://connection.eu-central-1.keboola.com"),
            Stack::EuIrelandAzure => Some("https://connection.north-europe.azure.keboola.com"),
            Stack::EuFrankfurtGcp => Some("https://connection.europe-west3.gcp.keboola.com"),
            Stack::Custom => None,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Stack::UsVirginiaAws => "US Virginia (AWS)",
            Stack::UsVirginiaGcp => "US Virginia (GCP)",
            Stack::EuFrankfurtAws => "EU Frankfurt (AWS)",
            Stack::EuIrelandAzure => "EU Ireland (Azure)",
            Stack::EuFrankfurtGcp => "EU Frankfurt (GCP)",
            Stack::Custom => "Custom",
        }
    }

    /// Identifier used in config files and on the command line
    pub fn id(self) -> &'static str {
        match self {
            Stack::UsVirginiaAws => "us-virginia-aws",
            Stack::UsVirginiaGcp => "us-virginia-gcp",
            Stack::EuFrankfurtAws => "eu-frankfurt-aws",
            Stack::EuIrelandAzure => "eu-ireland-azure",
            Stack::EuFrankfurtGcp => "eu-frankfurt-gcp",
            Stack::Custom => "custom",
        }
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Stack {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stack::ALL
            .into_iter()
            .find(|stack| stack.id() == s)
            .ok_or_else(|| ConfigError::UnknownStack(s.to_string()))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
