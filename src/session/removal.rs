//! Access removal workflow
//!
//! Deletes one (user, project) grant per selected project, in selection
//! order, auditing every attempt. Failures never stop the batch and the
//! access table is left untouched: the removed grant stays visible until
//! the next load.

use crate::access::AccessTable;
use crate::auth::ManageHeaders;
use crate::manage::ManageClient;
use crate::session::Notification;
use crate::session::audit::{AuditEntry, AuditLog, Outcome};
use crate::util::SecretString;
use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

/// What happened to one selected project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalStatus {
    Removed,
    Failed,
    /// The user holds no grant on a project with that name
    Unresolved,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalResult {
    pub project_name: String,
    pub status: RemovalStatus,
    pub notification: Notification,
}

/// Per-project results of one removal batch, in selection order
#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    pub email: String,
    pub results: Vec<RemovalResult>,
}

impl RemovalReport {
    pub fn removed(&self) -> usize {
        self.count(RemovalStatus::Removed)
    }

    pub fn failed(&self) -> usize {
        self.count(RemovalStatus::Failed) + self.count(RemovalStatus::Unresolved)
    }

    fn count(&self, status: RemovalStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.results.iter().map(|r| &r.notification)
    }
}

/// Remove `email` from each project in `project_names`
pub async fn remove_access(
    client: &ManageClient,
    token: &SecretString,
    table: &AccessTable,
    email: &str,
    project_names: &[String],
    audit: &mut AuditLog,
) -> RemovalReport {
    let mut results = Vec::with_capacity(project_names.len());

    for project_name in project_names {
        let Some(grant) = table.find_grant(email, project_name) else {
            warn!(email, project = %project_name, "No grant for selected project");
            results.push(RemovalResult {
                project_name: project_name.clone(),
                status: RemovalStatus::Unresolved,
                notification: Notification::error(format!(
                    "{} has no access to {}",
                    email, project_name
                )),
            });
            continue;
        };

        let outcome = client
            .delete_user_from_project(&grant.project_id, &grant.user_id, token)
            .await;

        let (status, audit_outcome, notification, detail) = if outcome.ok {
            info!(
                email,
                project = %project_name,
                user_id = %grant.user_id,
                "Removed user from project"
            );
            (
                RemovalStatus::Removed,
                Outcome::Success,
                Notification::success(format!("Removed from {}", project_name)),
                None,
            )
        } else {
            warn!(
                email,
                project = %project_name,
                status = ?outcome.status_code,
                "Failed to remove user from project"
            );
            (
                RemovalStatus::Failed,
                Outcome::Failure,
                Notification::error(format!("Failed to remove from {}", project_name)),
                Some(outcome.body),
            )
        };

        audit.append(AuditEntry {
            timestamp: Local::now(),
            outcome: audit_outcome,
            user_email: email.to_string(),
            user_id: grant.user_id.clone(),
            project_name: project_name.clone(),
            request: format!(
                "DELETE {}",
                client.delete_user_url(&grant.project_id, &grant.user_id)
            ),
            redacted_headers: ManageHeaders::new(token).redacted(),
            detail,
        });

        results.push(RemovalResult {
            project_name: project_name.clone(),
            status,
            notification,
        });
    }

    RemovalReport {
        email: email.to_string(),
        results,
    }
}
