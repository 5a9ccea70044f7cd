//! Keboola management API module
//!
//! Provides a typed client for the management endpoints that list and
//! revoke project access.

pub mod cache;
pub mod client;
pub mod types;

pub use cache::{CacheKey, ResponseCache};
pub use client::ManageClient;
pub use types::*;
