//! Plan execution against a SQL server.
//!
//! # Responsibility
//! - Abstract the three operations provisioning needs (execute, copy-in,
//!   text query) behind `SqlExecutor`.
//! - Drive a `ProvisionPlan` through an executor in order.
//!
//! # Invariants
//! - `PostgresExecutor` opens at most one client per `Target`, lazily, so
//!   the provisioned database is only connected to after it exists.

use super::config::ConnectionConfig;
use super::plan::{PlanStep, ProvisionPlan, StepKind, Target};
use super::{ProvisionError, ProvisionResult};
use crate::query::result_set::{CellValue, ResultSet};
use log::{error, info};
use postgres::{Client, NoTls, SimpleQueryMessage};
use std::fs::File;
use std::io::{BufReader, Read};
use std::time::Instant;

/// Minimal server surface used by provisioning and verification.
pub trait SqlExecutor {
    /// Runs one or more statements without returning rows.
    fn execute(&mut self, target: Target, sql: &str) -> ProvisionResult<()>;
    /// Streams `data` into a `COPY … FROM STDIN` statement; returns rows copied.
    fn copy_in(&mut self, target: Target, sql: &str, data: &mut dyn Read) -> ProvisionResult<u64>;
    /// Runs a query and returns every value in text form.
    fn query(&mut self, target: Target, sql: &str) -> ProvisionResult<ResultSet>;
}

/// `SqlExecutor` over the synchronous `postgres` client.
pub struct PostgresExecutor {
    connection: ConnectionConfig,
    database: String,
    maintenance: Option<Client>,
    provisioned: Option<Client>,
}

impl PostgresExecutor {
    /// Creates an executor; no connection is opened until first use.
    pub fn new(connection: ConnectionConfig, database: impl Into<String>) -> Self {
        Self {
            connection,
            database: database.into(),
            maintenance: None,
            provisioned: None,
        }
    }

    fn client(&mut self, target: Target) -> ProvisionResult<&mut Client> {
        let (slot, dbname) = match target {
            Target::Maintenance => (&mut self.maintenance, self.connection.maintenance_db.as_str()),
            Target::Provisioned => (&mut self.provisioned, self.database.as_str()),
        };

        if slot.is_none() {
            *slot = Some(connect(&self.connection, dbname)?);
        }
        slot.as_mut()
            .ok_or_else(|| ProvisionError::InvalidData(format!("no client for `{dbname}`")))
    }
}

impl SqlExecutor for PostgresExecutor {
    fn execute(&mut self, target: Target, sql: &str) -> ProvisionResult<()> {
        self.client(target)?.batch_execute(sql)?;
        Ok(())
    }

    fn copy_in(&mut self, target: Target, sql: &str, data: &mut dyn Read) -> ProvisionResult<u64> {
        let mut writer = self.client(target)?.copy_in(sql)?;
        std::io::copy(data, &mut writer).map_err(|source| ProvisionError::Io {
            path: "<copy stream>".into(),
            source,
        })?;
        Ok(writer.finish()?)
    }

    fn query(&mut self, target: Target, sql: &str) -> ProvisionResult<ResultSet> {
        let messages = self.client(target)?.simple_query(sql)?;
        Ok(collect_rows(messages))
    }
}

/// Columns come from `RowDescription`, so empty results keep their header.
fn collect_rows(messages: Vec<SimpleQueryMessage>) -> ResultSet {
    let mut result = ResultSet::default();
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                if result.columns.is_empty() {
                    result.columns = columns
                        .iter()
                        .map(|column| column.name().to_string())
                        .collect();
                }
            }
            SimpleQueryMessage::Row(row) => {
                if result.columns.is_empty() {
                    result.columns = row
                        .columns()
                        .iter()
                        .map(|column| column.name().to_string())
                        .collect();
                }
                let cells = (0..row.len())
                    .map(|index| CellValue::from(row.get(index)))
                    .collect();
                result.push_row(cells);
            }
            _ => {}
        }
    }
    result
}

fn connect(connection: &ConnectionConfig, dbname: &str) -> ProvisionResult<Client> {
    let started_at = Instant::now();
    let mut config = postgres::Config::new();
    config
        .host(&connection.host)
        .port(connection.port)
        .user(&connection.user)
        .dbname(dbname)
        .application_name("datadesk");
    if let Some(password) = &connection.password {
        config.password(password);
    }

    match config.connect(NoTls) {
        Ok(client) => {
            info!(
                "event=pg_connect module=provision status=ok host={} port={} dbname={} duration_ms={}",
                connection.host,
                connection.port,
                dbname,
                started_at.elapsed().as_millis()
            );
            Ok(client)
        }
        Err(err) => {
            error!(
                "event=pg_connect module=provision status=error host={} port={} dbname={} error={}",
                connection.host, connection.port, dbname, err
            );
            Err(err.into())
        }
    }
}

/// Outcome of a completed plan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
    pub steps_executed: usize,
    pub rows_loaded: u64,
}

/// Executes every step of `plan` in order.
///
/// # Errors
/// Returns `ProvisionError::Step` for the first failing step; later steps
/// are not attempted.
pub fn run_plan<E: SqlExecutor + ?Sized>(
    executor: &mut E,
    plan: &ProvisionPlan,
) -> ProvisionResult<ProvisionReport> {
    let started_at = Instant::now();
    let mut report = ProvisionReport {
        steps_executed: 0,
        rows_loaded: 0,
    };

    for (offset, step) in plan.steps.iter().enumerate() {
        let index = offset + 1;
        let step_started_at = Instant::now();
        match run_step(executor, step) {
            Ok(rows) => {
                report.steps_executed += 1;
                report.rows_loaded += rows;
                info!(
                    "event=provision_step module=provision status=ok index={} phase={} rows={} duration_ms={}",
                    index,
                    step.phase,
                    rows,
                    step_started_at.elapsed().as_millis()
                );
            }
            Err(err) => {
                error!(
                    "event=provision_step module=provision status=error index={} phase={} error={}",
                    index, step.phase, err
                );
                return Err(ProvisionError::Step {
                    index,
                    phase: step.phase,
                    sql: step.redacted_sql(),
                    source: Box::new(err),
                });
            }
        }
    }

    info!(
        "event=provision_run module=provision status=ok steps={} rows_loaded={} duration_ms={}",
        report.steps_executed,
        report.rows_loaded,
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

fn run_step<E: SqlExecutor + ?Sized>(executor: &mut E, step: &PlanStep) -> ProvisionResult<u64> {
    match &step.kind {
        StepKind::Execute => {
            executor.execute(step.target, &step.sql)?;
            Ok(0)
        }
        StepKind::CopyIn { csv_path } => {
            let file = File::open(csv_path).map_err(|source| ProvisionError::Io {
                path: csv_path.clone(),
                source,
            })?;
            let mut reader = BufReader::new(file);
            executor.copy_in(step.target, &step.sql, &mut reader)
        }
    }
}
