//! Post-provisioning introspection.
//!
//! # Responsibility
//! - Query row count, sample rows, table grants and role attributes.
//! - Compare what the server reports with what the config asked for.

use super::config::{ProvisionConfig, TablePrivilege};
use super::executor::SqlExecutor;
use super::plan::{quote_literal, Target};
use super::{ProvisionError, ProvisionResult};
use crate::query::result_set::{CellValue, IntoResultSet, ResultSet};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeSet;

const SAMPLE_ROWS: u32 = 5;

/// One `information_schema.table_privileges` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePrivilegeRow {
    pub grantee: String,
    pub table_schema: String,
    pub table_name: String,
    pub privilege_type: String,
}

/// One `pg_roles` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRow {
    pub rolname: String,
    pub rolsuper: bool,
    pub rolcreaterole: bool,
    pub rolcreatedb: bool,
    pub rolcanlogin: bool,
}

/// Everything the verification queries returned.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub row_count: i64,
    pub sample: ResultSet,
    pub privileges: Vec<TablePrivilegeRow>,
    pub roles: Vec<RoleRow>,
}

impl VerificationReport {
    /// Differences between server state and `config`; empty when consistent.
    pub fn problems(&self, config: &ProvisionConfig) -> Vec<String> {
        let mut problems = Vec::new();

        for group in &config.groups {
            let expected = group
                .privileges
                .iter()
                .map(|privilege| privilege.keyword().to_string())
                .collect::<BTreeSet<_>>();
            let granted = self
                .privileges
                .iter()
                .filter(|row| {
                    row.grantee == group.name
                        && row.table_schema == config.schema
                        && row.table_name == config.table
                })
                .map(|row| row.privilege_type.clone())
                .collect::<BTreeSet<_>>();
            if expected != granted {
                problems.push(format!(
                    "group `{}` holds {:?} on {}, expected {:?}",
                    group.name,
                    granted,
                    config.qualified_table(),
                    expected
                ));
            }
        }

        for name in config.role_names() {
            let is_user = config.users.iter().any(|user| user.name == name);
            match self.roles.iter().find(|role| role.rolname == name) {
                None => problems.push(format!("role `{name}` does not exist")),
                Some(role) => {
                    if role.rolsuper || role.rolcreaterole || role.rolcreatedb {
                        problems.push(format!("role `{name}` has elevated attributes"));
                    }
                    if role.rolcanlogin != is_user {
                        problems.push(format!(
                            "role `{name}` rolcanlogin={} but expected {}",
                            role.rolcanlogin, is_user
                        ));
                    }
                }
            }
        }

        problems
    }
}

/// Runs the verification queries against the provisioned database.
pub fn verify<E: SqlExecutor + ?Sized>(
    executor: &mut E,
    config: &ProvisionConfig,
) -> ProvisionResult<VerificationReport> {
    config.validate()?;
    let table = config.qualified_table();

    let count = executor.query(
        Target::Provisioned,
        &format!("SELECT COUNT(*) AS row_count FROM {table};"),
    )?;
    let row_count = match count.rows.first().and_then(|row| row.first()) {
        Some(CellValue::Text(value)) => value.parse::<i64>().map_err(|_| {
            ProvisionError::InvalidData(format!("row count `{value}` is not an integer"))
        })?,
        Some(CellValue::Integer(value)) => *value,
        other => {
            return Err(ProvisionError::InvalidData(format!(
                "unexpected row count cell {other:?}"
            )))
        }
    };

    let sample = executor.query(
        Target::Provisioned,
        &format!("SELECT * FROM {table} ORDER BY incident_number LIMIT {SAMPLE_ROWS};"),
    )?;

    let groups = in_list(config.groups.iter().map(|group| group.name.as_str()));
    let privilege_rows = executor.query(
        Target::Provisioned,
        &format!(
            "SELECT grantee, table_schema, table_name, privilege_type
             FROM information_schema.table_privileges
             WHERE grantee IN ({groups})
             ORDER BY grantee, table_name, privilege_type;"
        ),
    )?;
    let privileges = parse_privileges(&privilege_rows)?;

    let roles_in = in_list(config.role_names().into_iter());
    let role_rows = executor.query(
        Target::Provisioned,
        &format!(
            "SELECT rolname, rolsuper, rolcreaterole, rolcreatedb, rolcanlogin
             FROM pg_roles
             WHERE rolname IN ({roles_in})
             ORDER BY rolname;"
        ),
    )?;
    let roles = parse_roles(&role_rows)?;

    let report = VerificationReport {
        row_count,
        sample,
        privileges,
        roles,
    };
    let problems = report.problems(config);
    if problems.is_empty() {
        info!(
            "event=provision_verify module=provision status=ok rows={} roles={}",
            report.row_count,
            report.roles.len()
        );
    } else {
        warn!(
            "event=provision_verify module=provision status=mismatch problems={}",
            problems.len()
        );
    }
    Ok(report)
}

fn in_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let quoted = names.map(quote_literal).collect::<Vec<_>>();
    if quoted.is_empty() {
        return "NULL".to_string();
    }
    quoted.join(", ")
}

fn text_cell(result: &ResultSet, row: usize, column: &str) -> ProvisionResult<String> {
    match result.cell(row, column) {
        Some(CellValue::Text(value)) => Ok(value.clone()),
        other => Err(ProvisionError::InvalidData(format!(
            "column `{column}` row {row}: expected text, got {other:?}"
        ))),
    }
}

fn bool_cell(result: &ResultSet, row: usize, column: &str) -> ProvisionResult<bool> {
    let value = text_cell(result, row, column)?;
    match value.as_str() {
        "t" | "true" => Ok(true),
        "f" | "false" => Ok(false),
        other => Err(ProvisionError::InvalidData(format!(
            "column `{column}` row {row}: `{other}` is not a boolean"
        ))),
    }
}

fn parse_privileges(result: &ResultSet) -> ProvisionResult<Vec<TablePrivilegeRow>> {
    (0..result.len())
        .map(|row| {
            let privilege_type = text_cell(result, row, "privilege_type")?;
            if TablePrivilege::parse(&privilege_type).is_none() {
                warn!(
                    "event=provision_verify module=provision status=unexpected_privilege privilege={}",
                    privilege_type
                );
            }
            Ok(TablePrivilegeRow {
                grantee: text_cell(result, row, "grantee")?,
                table_schema: text_cell(result, row, "table_schema")?,
                table_name: text_cell(result, row, "table_name")?,
                privilege_type,
            })
        })
        .collect()
}

fn parse_roles(result: &ResultSet) -> ProvisionResult<Vec<RoleRow>> {
    (0..result.len())
        .map(|row| {
            Ok(RoleRow {
                rolname: text_cell(result, row, "rolname")?,
                rolsuper: bool_cell(result, row, "rolsuper")?,
                rolcreaterole: bool_cell(result, row, "rolcreaterole")?,
                rolcreatedb: bool_cell(result, row, "rolcreatedb")?,
                rolcanlogin: bool_cell(result, row, "rolcanlogin")?,
            })
        })
        .collect()
}

impl IntoResultSet for &[TablePrivilegeRow] {
    fn into_result_set(self) -> ResultSet {
        let mut set =
            ResultSet::with_columns(&["grantee", "table_schema", "table_name", "privilege_type"]);
        for row in self {
            set.push_row(vec![
                row.grantee.as_str().into(),
                row.table_schema.as_str().into(),
                row.table_name.as_str().into(),
                row.privilege_type.as_str().into(),
            ]);
        }
        set
    }
}

impl IntoResultSet for &[RoleRow] {
    fn into_result_set(self) -> ResultSet {
        let mut set = ResultSet::with_columns(&[
            "rolname",
            "rolsuper",
            "rolcreaterole",
            "rolcreatedb",
            "rolcanlogin",
        ]);
        for row in self {
            set.push_row(vec![
                row.rolname.as_str().into(),
                row.rolsuper.into(),
                row.rolcreaterole.into(),
                row.rolcreatedb.into(),
                row.rolcanlogin.into(),
            ]);
        }
        set
    }
}
