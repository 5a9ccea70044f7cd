//! Keboola project access manager
//!
//! Lists which users can access which projects of a Keboola organization and
//! revokes selected grants through the management API.
//!
//! ## Workflow
//!
//! ```text
//! verify token → list projects → list users per project
//!     → AccessTable (one row per user×project) → AccessMatrix
//!     → remove selected grants → audit log
//! ```
//!
//! Everything lives in a [`Session`](session::Session); nothing is persisted.
//!
//! ## Example Configuration
//!
//! ```toml
//! [manage]
//! stack = "eu-frankfurt-aws"      # or "custom" together with url = "https://..."
//! organization_id = "1234"
//! # token from KBC_MANAGE_API_TOKEN env var
//!
//! [dashboard]
//! port = 19893
//! ```

pub mod access;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod manage;
pub mod report;
pub mod session;
pub mod util;

// Re-export main types
pub use access::{AccessMatrix, AccessTable, UserGrant};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use manage::ManageClient;
pub use session::Session;
