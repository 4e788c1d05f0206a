//! Crime database provisioning over PostgreSQL.
//!
//! # Responsibility
//! - Build the ordered DDL/DCL plan from configuration.
//! - Execute it step by step, aborting on the first failure.
//! - Introspect the server afterwards to confirm tables, grants and roles.
//!
//! # Invariants
//! - No step is retried or skipped; a failed step ends the run.
//! - SQL text in errors and logs is always the redacted form.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod config;
pub mod executor;
pub mod plan;
pub mod verify;

pub use config::{ConfigError, ConnectionConfig, GroupSpec, ProvisionConfig, TablePrivilege, UserSpec};
pub use executor::{run_plan, PostgresExecutor, ProvisionReport, SqlExecutor};
pub use plan::{Phase, PlanStep, ProvisionPlan, StepKind, Target};
pub use verify::{verify, RoleRow, TablePrivilegeRow, VerificationReport};

pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[derive(Debug)]
pub enum ProvisionError {
    Config(ConfigError),
    Postgres(postgres::Error),
    Io { path: PathBuf, source: std::io::Error },
    /// Plan step `index` (1-based) failed.
    Step {
        index: usize,
        phase: Phase,
        sql: String,
        source: Box<ProvisionError>,
    },
    /// Introspection returned a row the verifier cannot interpret.
    InvalidData(String),
}

impl Display for ProvisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Postgres(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "failed to read `{}`: {source}", path.display()),
            Self::Step {
                index,
                phase,
                sql,
                source,
            } => write!(f, "step {index} ({phase}) failed: {source}; sql: {sql}"),
            Self::InvalidData(message) => write!(f, "invalid introspection row: {message}"),
        }
    }
}

impl Error for ProvisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Postgres(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Step { source, .. } => Some(source.as_ref()),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ConfigError> for ProvisionError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<postgres::Error> for ProvisionError {
    fn from(value: postgres::Error) -> Self {
        Self::Postgres(value)
    }
}
