//! Operator session
//!
//! Holds credentials, the loaded access table and the audit log for one
//! operator, and exposes the commands the CLI and dashboard call:
//!
//! - [`Session::on_check_token`]
//! - [`Session::on_load_users`] / [`Session::on_reload`]
//! - [`Session::on_remove_access`]
//! - [`Session::logout`]
//!
//! Nothing here is persisted; a restart starts from the configured presets.

pub mod audit;
pub mod removal;

pub use audit::{AuditEntry, AuditLog, Outcome};
pub use removal::{RemovalReport, RemovalResult, RemovalStatus, remove_access};

use crate::access::{AccessMatrix, AccessTable};
use crate::config::{ManageConfig, Stack, validate_host};
use crate::error::{ConfigError, SessionError};
use crate::manage::{ManageClient, TokenVerification};
use crate::util::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// Message a command wants shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Credential changes; `None` leaves the current value in place
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub stack: Option<Stack>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Outcome of `on_check_token`
#[derive(Debug, Clone, Serialize)]
pub struct TokenCheck {
    pub request: String,
    pub verification: TokenVerification,
    pub notification: Notification,
}

/// Outcome of a load
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub api_host: String,
    pub organization_id: String,
    pub project_count: usize,
    pub grant_count: usize,
    /// Requests that failed and were counted as empty
    pub failed_requests: Vec<String>,
    pub notifications: Vec<Notification>,
}

/// One operator's state
pub struct Session {
    client: ManageClient,
    stack: Stack,
    token: Option<SecretString>,
    organization_id: Option<String>,
    table: Option<AccessTable>,
    audit: AuditLog,
}

impl Session {
    /// Start a session from the configured presets
    pub fn new(config: &ManageConfig) -> Result<Self, SessionError> {
        let api_url = config.api_url()?;
        let client = ManageClient::new(api_url, config).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            stack: config.stack,
            token: config.token.clone().filter(|t| !t.is_empty()),
            organization_id: config.organization_id.clone().filter(|o| !o.is_empty()),
            table: None,
            audit: AuditLog::new(),
        })
    }

    pub fn api_host(&self) -> &str {
        self.client.base_url()
    }

    pub fn stack(&self) -> Stack {
        self.stack
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    pub fn table(&self) -> Option<&AccessTable> {
        self.table.as_ref()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn client(&self) -> &ManageClient {
        &self.client
    }

    /// Role matrix of the loaded table
    pub fn matrix(&self) -> Option<AccessMatrix> {
        self.table
            .as_ref()
            .map(|t| AccessMatrix::build(t, self.client.base_url()))
    }

    /// Apply credential changes
    ///
    /// A new host or token drops cached responses. The loaded table stays
    /// until the next load.
    pub fn set_credentials(&mut self, creds: Credentials) -> Result<(), SessionError> {
        if creds.stack.is_some() || creds.url.is_some() {
            let stack = creds.stack.unwrap_or(self.stack);
            let host = match stack.url() {
                Some(url) => url.to_string(),
                None => creds.url.clone().ok_or_else(|| ConfigError::Missing {
                    field: "url (required for the custom stack)".to_string(),
                })?,
            };
            validate_host(&host)?;
            if host.trim_end_matches('/') != self.client.base_url() {
                info!(host = %host, "Switching API host");
                self.client.set_base_url(host);
            }
            self.stack = stack;
        }

        if let Some(token) = creds.token {
            if self.token.as_ref() != Some(&token) {
                self.client.invalidate_cache();
            }
            self.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(org) = creds.organization_id {
            let org = org.trim().to_string();
            self.organization_id = Some(org).filter(|o| !o.is_empty());
        }

        Ok(())
    }

    fn require_token(&self) -> Result<&SecretString, ConfigError> {
        self.token.as_ref().ok_or_else(|| ConfigError::Missing {
            field: "token".to_string(),
        })
    }

    fn require_org(&self) -> Result<&str, ConfigError> {
        self.organization_id
            .as_deref()
            .ok_or_else(|| ConfigError::Missing {
                field: "organization id".to_string(),
            })
    }

    /// Verify the current token
    pub async fn on_check_token(&self) -> Result<TokenCheck, SessionError> {
        let token = self.require_token()?;
        let request = format!("GET {}", self.client.url("/manage/tokens/verify"));
        let verification = self.client.verify_token(token).await;

        let notification = if verification.valid {
            Notification::success(format!(
                "Token valid for: {}",
                verification.owner_display()
            ))
        } else {
            Notification::error("Invalid token")
        };

        Ok(TokenCheck {
            request,
            verification,
            notification,
        })
    }

    /// Fetch projects and users and replace the access table
    ///
    /// Served from the response cache where possible; see [`Session::on_reload`].
    pub async fn on_load_users(&mut self) -> Result<LoadReport, SessionError> {
        let token = self.require_token()?.clone();
        let org_id = self.require_org()?.to_string();
        let mut failed_requests = Vec::new();

        let projects = match self.client.try_list_projects(&org_id, &token).await {
            Ok(projects) => projects,
            Err(e) => {
                warn!(org_id = %org_id, error = %e, "Listing projects failed, treating as empty");
                failed_requests.push(format!("projects of organization {}: {}", org_id, e));
                Vec::new()
            }
        };

        let mut users_by_project = HashMap::with_capacity(projects.len());
        for project in &projects {
            let users = match self.client.try_list_users(&project.id, &token).await {
                Ok(users) => users,
                Err(e) => {
                    warn!(project_id = %project.id, error = %e, "Listing users failed, treating as empty");
                    failed_requests.push(format!("users of project {}: {}", project.name, e));
                    Vec::new()
                }
            };
            users_by_project.insert(project.id.clone(), users);
        }

        let table = AccessTable::build(projects, &users_by_project, &org_id)?;

        let mut notifications = vec![Notification::info(format!(
            "Loaded {} user assignments from {} projects in org {}.",
            table.len(),
            table.project_count(),
            org_id
        ))];
        notifications.extend(
            failed_requests
                .iter()
                .map(|f| Notification::warning(format!("Request failed, shown as empty: {}", f))),
        );

        info!(
            org_id = %org_id,
            projects = table.project_count(),
            grants = table.len(),
            "Loaded access table"
        );

        let report = LoadReport {
            api_host: self.client.base_url().to_string(),
            organization_id: org_id,
            project_count: table.project_count(),
            grant_count: table.len(),
            failed_requests,
            notifications,
        };
        self.table = Some(table);

        Ok(report)
    }

    /// Drop cached responses, then load
    pub async fn on_reload(&mut self) -> Result<LoadReport, SessionError> {
        self.client.invalidate_cache();
        self.on_load_users().await
    }

    /// Remove `email` from the named projects
    ///
    /// The loaded table is not changed; removed grants disappear on the
    /// next reload.
    pub async fn on_remove_access(
        &mut self,
        email: &str,
        project_names: &[String],
    ) -> Result<RemovalReport, SessionError> {
        if project_names.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        let token = self.token.as_ref().ok_or_else(|| ConfigError::Missing {
            field: "token".to_string(),
        })?;
        let table = self.table.as_ref().ok_or(SessionError::NotLoaded)?;

        Ok(remove_access(
            &self.client,
            token,
            table,
            email,
            project_names,
            &mut self.audit,
        )
        .await)
    }

    /// Forget credentials, loaded data and the audit log
    pub fn logout(&mut self) {
        self.token = None;
        self.organization_id = None;
        self.table = None;
        self.audit = AuditLog::new();
        self.client.invalidate_cache();
        info!("Session cleared");
    }
}
