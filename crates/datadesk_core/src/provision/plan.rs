//! Ordered provisioning statements.
//!
//! # Responsibility
//! - Turn a validated `ProvisionConfig` into the fixed DDL/DCL sequence.
//! - Tag each step with the connection it must run on.
//!
//! # Invariants
//! - Steps up to and including `CREATE DATABASE` target the maintenance
//!   database; all later steps target the new database.
//! - Teardown drops users before groups, and the database before both.
//! - Passwords only appear in `PlanStep::sql`, never in `redacted_sql`.

use super::config::{ConfigError, ProvisionConfig};
use crate::model::crime::Weekday;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const REDACTED: &str = "'********'";

/// Provisioning phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Teardown,
    CreateDatabase,
    CreateSchema,
    CreateTable,
    Load,
    RevokePublic,
    Groups,
    Users,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Teardown => "teardown",
            Phase::CreateDatabase => "create_database",
            Phase::CreateSchema => "create_schema",
            Phase::CreateTable => "create_table",
            Phase::Load => "load",
            Phase::RevokePublic => "revoke_public",
            Phase::Groups => "groups",
            Phase::Users => "users",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database a step connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Maintenance,
    Provisioned,
}

/// How a step is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Execute,
    /// `COPY … FROM STDIN` fed with the file at `csv_path`.
    CopyIn { csv_path: PathBuf },
}

/// One statement of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub phase: Phase,
    pub target: Target,
    pub kind: StepKind,
    pub sql: String,
    secret: Option<String>,
}

impl PlanStep {
    fn execute(phase: Phase, target: Target, sql: impl Into<String>) -> Self {
        Self {
            phase,
            target,
            kind: StepKind::Execute,
            sql: sql.into(),
            secret: None,
        }
    }

    /// SQL text safe to print or log.
    pub fn redacted_sql(&self) -> String {
        match &self.secret {
            Some(secret) => self.sql.replace(secret.as_str(), REDACTED),
            None => self.sql.clone(),
        }
    }
}

/// Fully ordered provisioning plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub database: String,
    pub steps: Vec<PlanStep>,
}

impl ProvisionPlan {
    /// Builds the plan for `config`, validating it first.
    pub fn build(config: &ProvisionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let database = config.database.as_str();
        let schema = config.schema.as_str();
        let table = config.qualified_table();
        let enum_type = format!("{}.{}", config.schema, config.enum_type);
        let mut steps = Vec::new();

        steps.push(PlanStep::execute(
            Phase::Teardown,
            Target::Maintenance,
            format!("DROP DATABASE IF EXISTS {database};"),
        ));
        for user in &config.users {
            steps.push(PlanStep::execute(
                Phase::Teardown,
                Target::Maintenance,
                format!("DROP ROLE IF EXISTS {};", user.name),
            ));
        }
        for group in &config.groups {
            steps.push(PlanStep::execute(
                Phase::Teardown,
                Target::Maintenance,
                format!("DROP ROLE IF EXISTS {};", group.name),
            ));
        }
        steps.push(PlanStep::execute(
            Phase::CreateDatabase,
            Target::Maintenance,
            format!("CREATE DATABASE {database};"),
        ));

        steps.push(PlanStep::execute(
            Phase::CreateSchema,
            Target::Provisioned,
            format!("CREATE SCHEMA {schema};"),
        ));

        let weekdays = Weekday::ALL
            .iter()
            .map(|day| quote_literal(day.label()))
            .collect::<Vec<_>>()
            .join(", ");
        steps.push(PlanStep::execute(
            Phase::CreateTable,
            Target::Provisioned,
            format!("CREATE TYPE {enum_type} AS ENUM ({weekdays});"),
        ));
        steps.push(PlanStep::execute(
            Phase::CreateTable,
            Target::Provisioned,
            format!(
                "CREATE TABLE {table} (
    incident_number INTEGER PRIMARY KEY,
    offense_code INTEGER,
    description VARCHAR({}),
    date DATE,
    day_of_the_week {enum_type},
    lat DECIMAL,
    long DECIMAL
);",
                config.description_max_len
            ),
        ));

        steps.push(PlanStep {
            phase: Phase::Load,
            target: Target::Provisioned,
            kind: StepKind::CopyIn {
                csv_path: config.csv_path.clone(),
            },
            sql: format!("COPY {table} FROM STDIN WITH CSV HEADER;"),
            secret: None,
        });

        steps.push(PlanStep::execute(
            Phase::RevokePublic,
            Target::Provisioned,
            "REVOKE ALL ON SCHEMA public FROM public;",
        ));
        steps.push(PlanStep::execute(
            Phase::RevokePublic,
            Target::Provisioned,
            format!("REVOKE ALL ON DATABASE {database} FROM public;"),
        ));

        for group in &config.groups {
            let name = group.name.as_str();
            steps.push(PlanStep::execute(
                Phase::Groups,
                Target::Provisioned,
                format!("CREATE ROLE {name} NOLOGIN;"),
            ));
            steps.push(PlanStep::execute(
                Phase::Groups,
                Target::Provisioned,
                format!("GRANT CONNECT ON DATABASE {database} TO {name};"),
            ));
            steps.push(PlanStep::execute(
                Phase::Groups,
                Target::Provisioned,
                format!("GRANT USAGE ON SCHEMA {schema} TO {name};"),
            ));
            if !group.privileges.is_empty() {
                let privileges = group
                    .privileges
                    .iter()
                    .map(|privilege| privilege.keyword())
                    .collect::<Vec<_>>()
                    .join(", ");
                steps.push(PlanStep::execute(
                    Phase::Groups,
                    Target::Provisioned,
                    format!("GRANT {privileges} ON ALL TABLES IN SCHEMA {schema} TO {name};"),
                ));
            }
        }

        for user in &config.users {
            let (sql, secret) = match &user.password {
                Some(password) => {
                    let literal = quote_literal(password);
                    (
                        format!("CREATE USER {} WITH PASSWORD {literal};", user.name),
                        Some(literal),
                    )
                }
                None => (format!("CREATE USER {};", user.name), None),
            };
            steps.push(PlanStep {
                phase: Phase::Users,
                target: Target::Provisioned,
                kind: StepKind::Execute,
                sql,
                secret,
            });
            steps.push(PlanStep::execute(
                Phase::Users,
                Target::Provisioned,
                format!("GRANT {} TO {};", user.group, user.name),
            ));
        }

        Ok(Self {
            database: config.database.clone(),
            steps,
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Printable script with passwords redacted, one step per block.
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        let mut current_target = None;
        for (index, step) in self.steps.iter().enumerate() {
            if current_target != Some(step.target) {
                let database = match step.target {
                    Target::Maintenance => "maintenance database",
                    Target::Provisioned => self.database.as_str(),
                };
                script.push_str(&format!("-- connect: {database}\n"));
                current_target = Some(step.target);
            }
            script.push_str(&format!(
                "-- step {} ({})\n{}\n",
                index + 1,
                step.phase,
                step.redacted_sql()
            ));
        }
        script
    }
}

/// Quotes `value` as a SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::{quote_literal, Phase, ProvisionPlan, StepKind, Target};
    use crate::provision::config::ProvisionConfig;

    #[test]
    fn quote_literal_doubles_single_quotes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn phases_never_go_backwards() {
        let plan = ProvisionPlan::build(&ProvisionConfig::default()).unwrap();
        let phases = plan.steps.iter().map(|step| step.phase).collect::<Vec<_>>();
        let mut sorted = phases.clone();
        sorted.sort();
        assert_eq!(phases, sorted);
    }

    #[test]
    fn targets_switch_once_after_create_database() {
        let plan = ProvisionPlan::build(&ProvisionConfig::default()).unwrap();
        let switch = plan
            .steps
            .iter()
            .position(|step| step.target == Target::Provisioned)
            .unwrap();
        assert_eq!(plan.steps[switch - 1].sql, "CREATE DATABASE crime_db;");
        assert!(plan.steps[switch..]
            .iter()
            .all(|step| step.target == Target::Provisioned));
    }

    #[test]
    fn load_step_copies_configured_csv() {
        let mut config = ProvisionConfig::default();
        config.csv_path = "/data/boston.csv".into();
        let plan = ProvisionPlan::build(&config).unwrap();
        let load = plan
            .steps
            .iter()
            .find(|step| step.phase == Phase::Load)
            .unwrap();
        assert_eq!(
            load.sql,
            "COPY crimes.boston_crimes FROM STDIN WITH CSV HEADER;"
        );
        assert_eq!(
            load.kind,
            StepKind::CopyIn {
                csv_path: "/data/boston.csv".into()
            }
        );
    }

    #[test]
    fn password_is_quoted_and_redacted() {
        let mut config = ProvisionConfig::default();
        config.users[0].password = Some("s3cr'et".to_string());
        let plan = ProvisionPlan::build(&config).unwrap();
        let create = plan
            .steps
            .iter()
            .find(|step| step.sql.starts_with("CREATE USER data_analyst"))
            .unwrap();
        assert_eq!(
            create.sql,
            "CREATE USER data_analyst WITH PASSWORD 's3cr''et';"
        );
        assert_eq!(
            create.redacted_sql(),
            "CREATE USER data_analyst WITH PASSWORD '********';"
        );
        assert!(!plan.to_script().contains("s3cr"));
    }

    #[test]
    fn readwrite_group_gets_write_privileges() {
        let plan = ProvisionPlan::build(&ProvisionConfig::default()).unwrap();
        let sql = plan
            .steps
            .iter()
            .map(|step| step.sql.as_str())
            .collect::<Vec<_>>();
        assert!(sql.contains(&"GRANT SELECT ON ALL TABLES IN SCHEMA crimes TO readonly;"));
        assert!(sql.contains(
            &"GRANT SELECT, INSERT, DELETE, UPDATE ON ALL TABLES IN SCHEMA crimes TO readwrite;"
        ));
        assert!(sql.contains(&"GRANT readonly TO data_analyst;"));
        assert!(sql.contains(&"GRANT readwrite TO data_scientist;"));
    }

    #[test]
    fn enum_type_lists_weekdays_in_order() {
        let plan = ProvisionPlan::build(&ProvisionConfig::default()).unwrap();
        assert!(plan.steps.iter().any(|step| step.sql
            == "CREATE TYPE crimes.weekday AS ENUM ('Monday', 'Tuesday', 'Wednesday', 'Thursday', 'Friday', 'Saturday', 'Sunday');"));
    }

    #[test]
    fn script_marks_connection_switches() {
        let plan = ProvisionPlan::build(&ProvisionConfig::default()).unwrap();
        let script = plan.to_script();
        assert!(script.starts_with("-- connect: maintenance database\n"));
        assert_eq!(script.matches("-- connect:").count(), 2);
        assert!(script.contains("-- connect: crime_db\n"));
    }

    #[test]
    fn invalid_config_yields_no_plan() {
        let mut config = ProvisionConfig::default();
        config.database = "Crime-DB".to_string();
        assert!(ProvisionPlan::build(&config).is_err());
    }
}
