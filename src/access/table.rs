//! Flat user×project grant table
//!
//! Built fresh from every load; nothing here talks to the network.

use crate::error::TableError;
use crate::manage::{Project, RawUserRecord};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io;

/// Default file name for the CSV export
pub const CSV_FILE_NAME: &str = "keboola_users_projects.csv";

/// Header row of the CSV export
pub const CSV_COLUMNS: [&str; 11] = [
    "user_id",
    "email",
    "role",
    "project",
    "project_id",
    "organization_id",
    "expires",
    "created",
    "reason",
    "invitor",
    "approver",
];

/// Access level attached to a grant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Share,
    Admin,
    Guest,
    ReadOnly,
    /// Anything else, kept verbatim (empty when upstream sent none)
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Share => "Share",
            Role::Admin => "Admin",
            Role::Guest => "Guest",
            Role::ReadOnly => "ReadOnly",
            Role::Other(s) => s,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "Share" => Role::Share,
            "Admin" => Role::Admin,
            "Guest" => Role::Guest,
            "ReadOnly" => Role::ReadOnly,
            other => Role::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One (user, project) access relationship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserGrant {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub project_id: String,
    pub project_name: String,
    pub organization_id: String,
    pub expires: Option<String>,
    pub created: Option<String>,
    /// Upstream `reason`, kept only when it is an object with an `email` key
    pub reason: Option<Value>,
    pub invitor_email: Option<String>,
    pub approver_email: Option<String>,
}

impl UserGrant {
    fn from_raw(user: &RawUserRecord, project: &Project, org_id: &str) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: Role::from(user.role.as_deref().unwrap_or_default()),
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            organization_id: org_id.to_string(),
            expires: user.expires.clone(),
            created: user.created.clone(),
            reason: gated_reason(user.reason.as_ref()),
            invitor_email: nested_email(user.invitor.as_ref()),
            approver_email: nested_email(user.approver.as_ref()),
        }
    }
}

/// The whole `reason` value, but only if it is an object holding `email`.
fn gated_reason(value: Option<&Value>) -> Option<Value> {
    value
        .filter(|v| v.as_object().is_some_and(|o| o.contains_key("email")))
        .cloned()
}

/// The nested `email` of an object-valued field.
fn nested_email(value: Option<&Value>) -> Option<String> {
    let email = value?.as_object()?.get("email")?;
    Some(match email {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Flatten projects and their user lists into one grant per (project, user)
///
/// Rows follow project order, then user order within each project.
pub fn build_table(
    projects: &[Project],
    users_by_project: &HashMap<String, Vec<RawUserRecord>>,
    org_id: &str,
) -> Result<Vec<UserGrant>, TableError> {
    let mut grants = Vec::new();
    for project in projects {
        let users = users_by_project
            .get(&project.id)
            .ok_or_else(|| TableError::MissingUsers {
                project_id: project.id.clone(),
            })?;
        grants.extend(
            users
                .iter()
                .map(|user| UserGrant::from_raw(user, project, org_id)),
        );
    }
    Ok(grants)
}

/// Grants of one load cycle, together with the projects they came from
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccessTable {
    pub organization_id: String,
    pub projects: Vec<Project>,
    pub grants: Vec<UserGrant>,
}

/// CSV row layout of the export
#[derive(Serialize)]
struct CsvRow<'a> {
    user_id: &'a str,
    email: &'a str,
    role: &'a str,
    project: &'a str,
    project_id: &'a str,
    organization_id: &'a str,
    expires: Option<&'a str>,
    created: Option<&'a str>,
    reason: Option<String>,
    invitor: Option<&'a str>,
    approver: Option<&'a str>,
}

impl AccessTable {
    /// Build a table from one fetch cycle
    pub fn build(
        projects: Vec<Project>,
        users_by_project: &HashMap<String, Vec<RawUserRecord>>,
        org_id: &str,
    ) -> Result<Self, TableError> {
        let grants = build_table(&projects, users_by_project, org_id)?;
        Ok(Self {
            organization_id: org_id.to_string(),
            projects,
            grants,
        })
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Sorted, de-duplicated user emails
    pub fn emails(&self) -> Vec<&str> {
        self.grants
            .iter()
            .map(|g| g.email.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All grants held by `email`, in table order
    pub fn grants_for<'a, 'e>(
        &'a self,
        email: &'e str,
    ) -> impl Iterator<Item = &'a UserGrant> + use<'a, 'e> {
        self.grants.iter().filter(move |g| g.email == email)
    }

    /// First grant of `email` on the project called `project_name`
    pub fn find_grant(&self, email: &str, project_name: &str) -> Option<&UserGrant> {
        self.grants_for(email).find(|g| g.project_name == project_name)
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv.write_record(CSV_COLUMNS)?;
        for grant in &self.grants {
            csv.serialize(CsvRow {
                user_id: &grant.user_id,
                email: &grant.email,
                role: grant.role.as_str(),
                project: &grant.project_name,
                project_id: &grant.project_id,
                organization_id: &grant.organization_id,
                expires: grant.expires.as_deref(),
                created: grant.created.as_deref(),
                reason: grant.reason.as_ref().map(Value::to_string),
                invitor: grant.invitor_email.as_deref(),
                approver: grant.approver_email.as_deref(),
            })?;
        }
        csv.flush()?;
        Ok(())
    }

    /// CSV export as a string
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
