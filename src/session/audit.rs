//! Session-scoped audit trail of access removals
//!
//! Entries are appended once per attempted deletion and never persisted.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt;

/// Timestamp format used for display
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of one attempted deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn glyph(self) -> &'static str {
        match self {
            Outcome::Success => "✅",
            Outcome::Failure => "❌",
        }
    }
}

/// One attempted removal
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub outcome: Outcome,
    pub user_email: String,
    pub user_id: String,
    pub project_name: String,
    /// Method and URL, e.g. `DELETE https://…/manage/projects/1/users/2`
    pub request: String,
    /// Request headers with token values masked
    pub redacted_headers: Vec<(String, String)>,
    /// Response body of a failed call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

impl AuditEntry {
    /// First line of the entry
    pub fn summary(&self) -> String {
        let ts = self.timestamp.format(TIMESTAMP_FORMAT);
        match self.outcome {
            Outcome::Success => format!(
                "[{}] {} Removed {} (ID: {}) from {}",
                ts,
                self.outcome.glyph(),
                self.user_email,
                self.user_id,
                self.project_name
            ),
            Outcome::Failure => format!(
                "[{}] {} Failed to remove {} (ID: {}) from {} - {}",
                ts,
                self.outcome.glyph(),
                self.user_email,
                self.user_id,
                self.project_name,
                self.detail.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Header dump, e.g. `{X-KBC-ManageApiToken: ***, Accept: application/json}`
    pub fn headers_line(&self) -> String {
        let pairs: Vec<String> = self
            .redacted_headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        writeln!(f, "{}", self.request)?;
        write!(f, "Headers: {}", self.headers_line())
    }
}

/// Append-only list of audit entries
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    /// Entries for display, most recent first
    pub fn newest_first(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(outcome: Outcome, project: &str) -> AuditEntry {
        AuditEntry {
            timestamp: Local::now(),
            outcome,
            user_email: "a@x.com".to_string(),
            user_id: "u1".to_string(),
            project_name: project.to_string(),
            request: "DELETE https://h/manage/projects/p1/users/u1".to_string(),
            redacted_headers: vec![
                ("X-KBC-ManageApiToken".to_string(), "***".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            detail: (outcome == Outcome::Failure).then(|| "forbidden".to_string()),
        }
    }

    #[test]
    fn test_newest_first() {
        let mut log = AuditLog::new();
        log.append(entry(Outcome::Success, "Alpha"));
        log.append(entry(Outcome::Failure, "Beta"));

        let order: Vec<_> = log.newest_first().map(|e| e.project_name.as_str()).collect();
        assert_eq!(order, vec!["Beta", "Alpha"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_display_success() {
        let text = entry(Outcome::Success, "Alpha").to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("✅ Removed a@x.com (ID: u1) from Alpha"));
        assert_eq!(lines[1], "DELETE https://h/manage/projects/p1/users/u1");
        assert_eq!(
            lines[2],
            "Headers: {X-KBC-ManageApiToken: ***, Accept: application/json}"
        );
    }

    #[test]
    fn test_display_failure_includes_body() {
        let text = entry(Outcome::Failure, "Beta").to_string();
        assert!(text.contains("❌ Failed to remove a@x.com (ID: u1) from Beta - forbidden"));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(entry(Outcome::Success, "Alpha")).unwrap();
        assert_eq!(json["outcome"], "success");
        assert_eq!(json["timestamp"].as_str().unwrap().len(), 19);
        assert!(json.get("detail").is_none());
    }
}
