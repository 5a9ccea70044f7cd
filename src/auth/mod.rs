//! Authentication module
//!
//! The management API authenticates every call with a single token header.
//! This module builds that header set and its redacted form for audit dumps.

pub mod token;

pub use token::{ManageHeaders, TOKEN_HEADER};
