//! Error types for keboola-access
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API.
//! Most remote failures are deliberately carried as data (`TokenVerification`,
//! `DeleteOutcome`) rather than as errors; the types here cover the rest.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Management API error: {0}")]
    ManageApi(#[from] ManageApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Access table error: {0}")]
    Table(#[from] TableError),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid API host '{host}': must start with http:// or https://")]
    InvalidHost { host: String },

    #[error("Unknown stack '{0}'")]
    UnknownStack(String),
}

/// Management API errors
///
/// Only surfaced by the `try_*` client methods. The fail-soft methods
/// log these and return an empty result.
#[derive(Error, Debug)]
pub enum ManageApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Management API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from management API: {0}")]
    InvalidResponse(String),
}

impl ManageApiError {
    /// Create an error from an HTTP status code and response body
    pub fn from_response(status: u16, body: &str) -> Self {
        ManageApiError::Api {
            status,
            message: if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                body.to_string()
            },
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ManageApiError::Api { status, .. } => Some(*status),
            ManageApiError::Request(e) => e.status().map(|s| s.as_u16()),
            ManageApiError::InvalidResponse(_) => None,
        }
    }
}

/// Errors while flattening fetched data into the access table
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("No user list fetched for project {project_id}")]
    MissingUsers { project_id: String },
}

/// Errors returned by session command handlers
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No access table loaded; load users first")]
    NotLoaded,

    #[error("No projects selected for removal")]
    EmptySelection,

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for management API operations
pub type ManageResult<T> = std::result::Result<T, ManageApiError>;
