//! Dashboard module
//!
//! Browser front end for the session: environment form, role matrix,
//! CSV export, per-user access removal and the audit log.

pub mod server;

pub use server::{DEFAULT_DASHBOARD_PORT, DashboardConfig, router, run_dashboard};
