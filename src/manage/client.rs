//! Management API client
//!
//! Typed wrapper around the four management endpoints this tool needs.
//! Each call is a single request; there are no retries.

use crate::auth::ManageHeaders;
use crate::config::ManageConfig;
use crate::error::{ManageApiError, ManageResult};
use crate::manage::cache::{CacheKey, ResponseCache};
use crate::manage::types::{DeleteOutcome, Project, RawUserRecord, TokenVerification};
use crate::util::{SecretString, encode_segment};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Management API client
pub struct ManageClient {
    http: Client,
    base_url: String,
    cache: ResponseCache,
}

impl ManageClient {
    /// Create a client for `base_url` using the transport settings in `config`
    pub fn new(base_url: impl Into<String>, config: &ManageConfig) -> ManageResult<Self> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(format!("keboola-access/{}", env!("CARGO_PKG_VERSION")));

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build().map_err(ManageApiError::Request)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: ResponseCache::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Point the client at another host, dropping cached responses
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.cache.invalidate();
    }

    /// Full URL for an API endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Drop every cached list response
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn send(&self, request: RequestBuilder, token: &SecretString) -> reqwest::Result<Response> {
        ManageHeaders::new(token).apply(request).send().await
    }

    /// GET a JSON body, failing on any non-success status
    #[instrument(skip(self, token))]
    async fn get_json(&self, endpoint: &str, token: &SecretString) -> ManageResult<Value> {
        let response = self.send(self.http.get(self.url(endpoint)), token).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ManageApiError::from_response(status.as_u16(), &body));
        }

        response.json().await.map_err(|e| {
            ManageApiError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }

    /// GET through the response cache; only well-formed responses are cached
    async fn get_cached<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &SecretString,
    ) -> ManageResult<T> {
        let key = CacheKey::new(self.url(endpoint), token.fingerprint());
        if let Some(value) = self.cache.get(&key) {
            return parse(value);
        }

        let value = self.get_json(endpoint, token).await?;
        let parsed = parse(value.clone())?;
        self.cache.insert(key, value);
        Ok(parsed)
    }

    /// Check a token against `/manage/tokens/verify`
    ///
    /// Never fails; an unreachable host comes back as `valid: false` with
    /// no status code and the transport error as body.
    #[instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &SecretString) -> TokenVerification {
        let url = self.url("/manage/tokens/verify");
        let response = match self.send(self.http.get(&url), token).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token verification request failed");
                return TokenVerification {
                    valid: false,
                    owner_name: None,
                    status_code: None,
                    raw_body: e.to_string(),
                };
            }
        };

        let status = response.status();
        let raw_body = response.text().await.unwrap_or_default();
        let owner_name = if status.is_success() {
            serde_json::from_str::<Value>(&raw_body)
                .ok()
                .and_then(|body| body["owner"]["name"].as_str().map(String::from))
        } else {
            None
        };

        debug!(status = status.as_u16(), "Token verification finished");

        TokenVerification {
            valid: status.is_success(),
            owner_name,
            status_code: Some(status.as_u16()),
            raw_body,
        }
    }

    /// List an organization's projects, reporting failures
    pub async fn try_list_projects(
        &self,
        org_id: &str,
        token: &SecretString,
    ) -> ManageResult<Vec<Project>> {
        let endpoint = format!("/manage/organizations/{}/projects", encode_segment(org_id));
        self.get_cached(&endpoint, token).await
    }

    /// List an organization's projects; any failure yields an empty list
    pub async fn list_projects(&self, org_id: &str, token: &SecretString) -> Vec<Project> {
        self.try_list_projects(org_id, token)
            .await
            .unwrap_or_else(|e| {
                warn!(org_id, error = %e, "Listing projects failed, treating as empty");
                Vec::new()
            })
    }

    /// List a project's users, reporting failures
    pub async fn try_list_users(
        &self,
        project_id: &str,
        token: &SecretString,
    ) -> ManageResult<Vec<RawUserRecord>> {
        let endpoint = format!("/manage/projects/{}/users", encode_segment(project_id));
        self.get_cached(&endpoint, token).await
    }

    /// List a project's users; any failure yields an empty list
    pub async fn list_users(&self, project_id: &str, token: &SecretString) -> Vec<RawUserRecord> {
        self.try_list_users(project_id, token)
            .await
            .unwrap_or_else(|e| {
                warn!(project_id, error = %e, "Listing users failed, treating as empty");
                Vec::new()
            })
    }

    /// URL of the grant-deletion endpoint
    pub fn delete_user_url(&self, project_id: &str, user_id: &str) -> String {
        self.url(&format!(
            "/manage/projects/{}/users/{}",
            encode_segment(project_id),
            encode_segment(user_id)
        ))
    }

    /// Remove a user from a project
    ///
    /// Never fails; the caller inspects `ok`.
    #[instrument(skip(self, token))]
    pub async fn delete_user_from_project(
        &self,
        project_id: &str,
        user_id: &str,
        token: &SecretString,
    ) -> DeleteOutcome {
        let url = self.delete_user_url(project_id, user_id);
        match self.send(self.http.delete(&url), token).await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if !status.is_success() {
                    warn!(status = status.as_u16(), "Deleting user from project failed");
                }
                DeleteOutcome {
                    ok: status.is_success(),
                    status_code: Some(status.as_u16()),
                    body,
                }
            }
            Err(e) => {
                warn!(error = %e, "Delete request failed");
                DeleteOutcome {
                    ok: false,
                    status_code: None,
                    body: e.to_string(),
                }
            }
        }
    }
}

fn parse<T: DeserializeOwned>(value: Value) -> ManageResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ManageApiError::InvalidResponse(format!("Unexpected response shape: {}", e)))
}
