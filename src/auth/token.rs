//! Management API token headers

use crate::util::{MASK, SecretString};
use reqwest::RequestBuilder;
use std::fmt;

/// Header carrying the management token
pub const TOKEN_HEADER: &str = "X-KBC-ManageApiToken";

const JSON: &str = "application/json";

/// The three headers attached to every management API request
#[derive(Clone)]
pub struct ManageHeaders<'a> {
    token: &'a SecretString,
}

impl<'a> ManageHeaders<'a> {
    pub fn new(token: &'a SecretString) -> Self {
        Self { token }
    }

    /// Attach all headers to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(TOKEN_HEADER, self.token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, JSON)
            .header(reqwest::header::ACCEPT, JSON)
    }

    /// Header pairs with every token-bearing value replaced by the mask
    ///
    /// Any header whose name contains `Token` counts as token-bearing.
    pub fn redacted(&self) -> Vec<(String, String)> {
        [
            (TOKEN_HEADER, self.token.expose_secret()),
            ("Content-Type", JSON),
            ("Accept", JSON),
        ]
        .into_iter()
        .map(|(name, value)| {
            let value = if name.contains("Token") { MASK } else { value };
            (name.to_string(), value.to_string())
        })
        .collect()
    }
}

impl fmt::Debug for ManageHeaders<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.redacted()).finish()
    }
}
