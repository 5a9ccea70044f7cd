//! User-by-project role matrix
//!
//! A rendering-only derivation of the grant table.

use crate::access::table::{AccessTable, Role};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// Glyph for a role that is not in the fixed icon table
pub const UNKNOWN_GLYPH: &str = "❓";

impl Role {
    /// Display glyph for this role
    pub fn glyph(&self) -> &'static str {
        match self {
            Role::Share => "🤝",
            Role::Admin => "🛠️",
            Role::Guest => "👤",
            Role::ReadOnly => "👁️",
            Role::Other(_) => UNKNOWN_GLYPH,
        }
    }
}

/// One matrix cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixCell {
    Empty,
    Grant(Role),
}

impl MatrixCell {
    /// Glyph, or an empty string for no grant
    pub fn glyph(&self) -> &'static str {
        match self {
            MatrixCell::Empty => "",
            MatrixCell::Grant(role) => role.glyph(),
        }
    }

    pub fn role(&self) -> Option<&Role> {
        match self {
            MatrixCell::Empty => None,
            MatrixCell::Grant(role) => Some(role),
        }
    }
}

impl Serialize for MatrixCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Cell<'a> {
            glyph: &'a str,
            role: Option<&'a str>,
        }

        Cell {
            glyph: self.glyph(),
            role: self.role().map(Role::as_str),
        }
        .serialize(serializer)
    }
}

/// Matrix column header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixColumn {
    pub project_id: String,
    /// Project name, shown as a tooltip
    pub project_name: String,
    /// Admin page of the project on the connected stack
    pub url: String,
}

/// Rows are sorted unique emails, columns sorted unique project ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessMatrix {
    pub users: Vec<String>,
    pub columns: Vec<MatrixColumn>,
    /// `cells[row][column]`
    pub cells: Vec<Vec<MatrixCell>>,
}

impl AccessMatrix {
    /// Pivot the table; `api_host` is used for project links only
    ///
    /// Columns come from the loaded projects plus any project ids seen in
    /// grants, so projects without users still get a column.
    pub fn build(table: &AccessTable, api_host: &str) -> Self {
        let users: Vec<String> = table.emails().into_iter().map(String::from).collect();

        let mut names: BTreeMap<&str, &str> = table
            .projects
            .iter()
            .map(|p| (p.id.as_str(), p.name.as_str()))
            .collect();
        for grant in &table.grants {
            names
                .entry(grant.project_id.as_str())
                .or_insert(grant.project_name.as_str());
        }

        let columns: Vec<MatrixColumn> = names
            .into_iter()
            .map(|(id, name)| MatrixColumn {
                project_id: id.to_string(),
                project_name: name.to_string(),
                url: format!("{}/admin/projects/{}", api_host.trim_end_matches('/'), id),
            })
            .collect();

        let cells = users
            .iter()
            .map(|email| {
                columns
                    .iter()
                    .map(|col| {
                        table
                            .grants_for(email)
                            .find(|g| g.project_id == col.project_id)
                            .map_or(MatrixCell::Empty, |g| MatrixCell::Grant(g.role.clone()))
                    })
                    .collect()
            })
            .collect();

        Self {
            users,
            columns,
            cells,
        }
    }

    pub fn cell(&self, email: &str, project_id: &str) -> Option<&MatrixCell> {
        let row = self.users.iter().position(|u| u == email)?;
        let col = self
            .columns
            .iter()
            .position(|c| c.project_id == project_id)?;
        self.cells.get(row)?.get(col)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Distinct roles present, for a legend
    pub fn roles(&self) -> BTreeSet<&str> {
        self.cells
            .iter()
            .flatten()
            .filter_map(|c| c.role().map(Role::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manage::{Project, RawUserRecord};
    use rstest::rstest;
    use std::collections::HashMap;

    fn user(id: &str, email: &str, role: &str) -> RawUserRecord {
        RawUserRecord {
            id: id.to_string(),
            email: email.to_string(),
            role: Some(role.to_string()),
            ..Default::default()
        }
    }

    fn table(projects: Vec<Project>, users: Vec<(&str, Vec<RawUserRecord>)>) -> AccessTable {
        let users: HashMap<_, _> = users
            .into_iter()
            .map(|(id, list)| (id.to_string(), list))
            .collect();
        AccessTable::build(projects, &users, "1").unwrap()
    }

    #[rstest]
    #[case("Share", "🤝")]
    #[case("Admin", "🛠️")]
    #[case("Guest", "👤")]
    #[case("ReadOnly", "👁️")]
    #[case("admin", UNKNOWN_GLYPH)]
    #[case("", UNKNOWN_GLYPH)]
    fn test_role_glyph(#[case] role: &str, #[case] glyph: &str) {
        assert_eq!(Role::from(role).glyph(), glyph);
    }

    #[test]
    fn test_single_cell_scenario() {
        let t = table(
            vec![Project::new("p1", "Alpha")],
            vec![("p1", vec![user("u1", "a@x.com", "Admin")])],
        );
        let matrix = AccessMatrix::build(&t, "https://connection.keboola.com");

        assert_eq!(matrix.users, vec!["a@x.com"]);
        assert_eq!(matrix.columns.len(), 1);
        assert_eq!(
            matrix.columns[0].url,
            "https://connection.keboola.com/admin/projects/p1"
        );
        assert_eq!(matrix.cell("a@x.com", "p1").unwrap().glyph(), "🛠️");
    }

    #[test]
    fn test_shape_and_blank_cells() {
        let t = table(
            vec![
                Project::new("p2", "Beta"),
                Project::new("p1", "Alpha"),
                Project::new("p3", "Empty"),
            ],
            vec![
                ("p1", vec![user("u2", "b@x.com", "Guest"), user("u1", "a@x.com", "Admin")]),
                ("p2", vec![user("u1", "a@x.com", "Custom")]),
                ("p3", vec![]),
            ],
        );
        let matrix = AccessMatrix::build(&t, "https://h");

        assert_eq!(matrix.users, vec!["a@x.com", "b@x.com"]);
        let ids: Vec<_> = matrix.columns.iter().map(|c| c.project_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(matrix.cells.len(), 2);
        assert!(matrix.cells.iter().all(|row| row.len() == 3));

        assert_eq!(matrix.cell("a@x.com", "p2").unwrap().glyph(), UNKNOWN_GLYPH);
        assert_eq!(matrix.cell("b@x.com", "p2"), Some(&MatrixCell::Empty));
        assert_eq!(matrix.cell("b@x.com", "p3").unwrap().glyph(), "");
        assert_eq!(matrix.roles().len(), 3);
    }

    #[test]
    fn test_duplicate_grant_uses_first() {
        let t = table(
            vec![Project::new("p1", "Alpha")],
            vec![(
                "p1",
                vec![user("u1", "a@x.com", "Guest"), user("u1", "a@x.com", "Admin")],
            )],
        );
        let matrix = AccessMatrix::build(&t, "https://h");
        assert_eq!(matrix.users.len(), 1);
        assert_eq!(
            matrix.cell("a@x.com", "p1"),
            Some(&MatrixCell::Grant(Role::Guest))
        );
    }

    #[test]
    fn test_serialized_cell() {
        let json = serde_json::to_value(MatrixCell::Grant(Role::Share)).unwrap();
        assert_eq!(json["glyph"], "🤝");
        assert_eq!(json["role"], "Share");

        let json = serde_json::to_value(MatrixCell::Empty).unwrap();
        assert_eq!(json["glyph"], "");
        assert!(json["role"].is_null());
    }
}
