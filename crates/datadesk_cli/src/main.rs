//! `datadesk` command-line entry point.
//!
//! # Responsibility
//! - Expose store reports and crime-database provisioning as subcommands.
//! - Print results to stdout and errors to stderr with a non-zero exit code.

use clap::{Args, Parser, Subcommand};
use datadesk_core::db::{create_store_db, open_store_db};
use datadesk_core::ingest::crime_csv::validate_crime_csv;
use datadesk_core::ingest::profile::{profile_csv, ProfileOptions};
use datadesk_core::provision::{
    run_plan, verify, PostgresExecutor, ProvisionConfig, ProvisionPlan,
};
use datadesk_core::{
    default_log_level, init_logging, render, run_sql, GenreSalesQuery, IntoResultSet,
    OutputFormat, ReportService, ResultSet, SqliteStoreRepository,
};
use log::info;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "datadesk", version, about = "Store reports and crime database provisioning")]
struct Cli {
    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "DATADESK_LOG_LEVEL")]
    log_level: Option<String>,
    /// Directory for rolling log files; logging is off when unset.
    #[arg(long, global = true, env = "DATADESK_LOG_DIR")]
    log_dir: Option<PathBuf>,
    /// table|csv|json
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Business questions over the music-store database.
    Store {
        /// Path to the SQLite store file.
        #[arg(long, env = "DATADESK_STORE_DB")]
        db: PathBuf,
        #[command(subcommand)]
        command: StoreCommand,
    },
    /// Crime database CSV exploration and provisioning.
    Crime {
        #[command(subcommand)]
        command: CrimeCommand,
    },
}

#[derive(Debug, Subcommand)]
enum StoreCommand {
    /// Create an empty store with the full schema.
    Init,
    /// List tables and views.
    Tables,
    /// Tracks sold per genre.
    Genres {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Sales per support agent.
    Employees,
    /// Per-country statistics with single-customer countries as `Other`.
    Countries,
    /// Album vs individual track purchases.
    Albums {
        /// Print the per-invoice classification instead of the summary.
        #[arg(long)]
        details: bool,
    },
    /// Every report section in order.
    Report,
    /// Run one ad-hoc SQL statement.
    Query { sql: String },
}

#[derive(Debug, Subcommand)]
enum CrimeCommand {
    /// Column statistics and suggested SQL types.
    Profile {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = ProfileOptions::default().enum_threshold)]
        enum_threshold: usize,
    },
    /// Check every row loads into the crime table.
    Check {
        #[arg(long)]
        csv: PathBuf,
        #[command(flatten)]
        settings: ProvisionArgs,
    },
    /// Print the provisioning script without running it.
    Plan {
        #[command(flatten)]
        settings: ProvisionArgs,
    },
    /// Run the provisioning script, then verify.
    Provision {
        #[command(flatten)]
        settings: ProvisionArgs,
        /// Skip the CSV pre-flight check.
        #[arg(long)]
        skip_check: bool,
    },
    /// Introspect an already provisioned database.
    Verify {
        #[command(flatten)]
        settings: ProvisionArgs,
    },
}

#[derive(Debug, Args)]
struct ProvisionArgs {
    /// JSON provisioning config; defaults apply to absent keys.
    #[arg(long, env = "DATADESK_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long = "csv-path")]
    csv_path: Option<PathBuf>,
    #[arg(long, env = "PGHOST")]
    host: Option<String>,
    #[arg(long, env = "PGPORT")]
    port: Option<u16>,
    #[arg(long, env = "PGUSER")]
    user: Option<String>,
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long)]
    maintenance_db: Option<String>,
}

impl ProvisionArgs {
    /// Config file (or defaults) with command-line overrides applied.
    fn load(&self) -> Result<ProvisionConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => ProvisionConfig::from_json_file(path)?,
            None => ProvisionConfig::default(),
        };
        if let Some(csv_path) = &self.csv_path {
            config.csv_path = csv_path.clone();
        }
        if let Some(host) = &self.host {
            config.connection.host = host.clone();
        }
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(user) = &self.user {
            config.connection.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.connection.password = Some(password.clone());
        }
        if let Some(maintenance_db) = &self.maintenance_db {
            config.connection.maintenance_db = maintenance_db.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        if let Err(message) = absolute(log_dir).and_then(|dir| init_logging(level, &dir)) {
            eprintln!("warning: logging disabled: {message}");
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| format!("cannot resolve `{}`: {err}", path.display()))
}

fn run(cli: Cli) -> CliResult {
    let format = cli.format;
    match cli.command {
        Command::Store { db, command } => run_store(&db, command, format),
        Command::Crime { command } => run_crime(command, format),
    }
}

fn run_store(db: &Path, command: StoreCommand, format: OutputFormat) -> CliResult {
    // `init` is the only command that writes; everything else opens read-only.
    let conn = match command {
        StoreCommand::Init => {
            drop(create_store_db(db)?);
            println!("initialized store schema at {}", db.display());
            return Ok(());
        }
        _ => open_store_db(db)?,
    };
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    match command {
        StoreCommand::Init => Ok(()),
        StoreCommand::Tables => {
            emit(&service.list_store_objects()?.into_result_set(), format)
        }
        StoreCommand::Genres { country, limit } => {
            let genres = service.genre_sales(&GenreSalesQuery { country, limit })?;
            emit(&genres.into_result_set(), format)
        }
        StoreCommand::Employees => emit(&service.employee_sales()?.into_result_set(), format),
        StoreCommand::Countries => emit(&service.country_sales()?.into_result_set(), format),
        StoreCommand::Albums { details } => {
            let albums = service.album_report()?;
            if details {
                emit(&albums.invoices.into_result_set(), format)
            } else {
                emit(&albums.summary.into_result_set(), format)
            }
        }
        StoreCommand::Report => {
            let report = service.full_report()?;
            emit_section("Genres", &report.genres.into_result_set(), format)?;
            emit_section("Employees", &report.employees.into_result_set(), format)?;
            emit_section("Countries", &report.countries.into_result_set(), format)?;
            emit_section("Albums", &report.albums.summary.into_result_set(), format)
        }
        StoreCommand::Query { sql } => emit(&run_sql(&conn, &sql)?, format),
    }
}

fn run_crime(command: CrimeCommand, format: OutputFormat) -> CliResult {
    match command {
        CrimeCommand::Profile {
            csv,
            enum_threshold,
        } => {
            let profile = profile_csv(&csv, ProfileOptions { enum_threshold })?;
            let mut columns = ResultSet::with_columns(&[
                "column",
                "kind",
                "distinct",
                "max_len",
                "empty",
                "suggested_type",
                "first_value",
            ]);
            for (index, column) in profile.columns.iter().enumerate() {
                let first_value = profile
                    .first_row
                    .as_ref()
                    .and_then(|row| row.get(index))
                    .map(String::as_str);
                columns.push_row(vec![
                    column.name.as_str().into(),
                    format!("{:?}", column.kind).to_ascii_lowercase().into(),
                    (column.distinct_count as i64).into(),
                    (column.max_len as i64).into(),
                    (column.empty_count as i64).into(),
                    column.suggested_sql_type().into(),
                    first_value.into(),
                ]);
            }
            println!("rows: {}", profile.row_count);
            emit(&columns, format)
        }
        CrimeCommand::Check { csv, settings } => {
            let config = settings.load()?;
            let summary = validate_crime_csv(&csv, config.description_max_len)?;
            println!(
                "ok: {} rows, longest description {} chars, dates {} .. {}",
                summary.row_count,
                summary.max_description_len,
                summary.first_date.as_deref().unwrap_or("-"),
                summary.last_date.as_deref().unwrap_or("-")
            );
            Ok(())
        }
        CrimeCommand::Plan { settings } => {
            let config = settings.load()?;
            print!("{}", ProvisionPlan::build(&config)?.to_script());
            Ok(())
        }
        CrimeCommand::Provision {
            settings,
            skip_check,
        } => {
            let config = settings.load()?;
            if !skip_check {
                validate_crime_csv(&config.csv_path, config.description_max_len)?;
            }
            let plan = ProvisionPlan::build(&config)?;
            let mut executor =
                PostgresExecutor::new(config.connection.clone(), config.database.clone());
            let report = run_plan(&mut executor, &plan)?;
            info!(
                "event=cli_provision module=cli status=ok steps={} rows={}",
                report.steps_executed, report.rows_loaded
            );
            println!(
                "provisioned {}: {} steps, {} rows loaded",
                config.database, report.steps_executed, report.rows_loaded
            );
            print_verification(&mut executor, &config, format)
        }
        CrimeCommand::Verify { settings } => {
            let config = settings.load()?;
            let mut executor =
                PostgresExecutor::new(config.connection.clone(), config.database.clone());
            print_verification(&mut executor, &config, format)
        }
    }
}

fn print_verification(
    executor: &mut PostgresExecutor,
    config: &ProvisionConfig,
    format: OutputFormat,
) -> CliResult {
    let report = verify(executor, config)?;
    println!("{}: {} rows", config.qualified_table(), report.row_count);
    emit_section("Sample rows", &report.sample, format)?;
    emit_section("Table privileges", &report.privileges.into_result_set(), format)?;
    emit_section("Roles", &report.roles.into_result_set(), format)?;

    let problems = report.problems(config);
    if problems.is_empty() {
        return Ok(());
    }
    for problem in &problems {
        eprintln!("mismatch: {problem}");
    }
    Err(format!("{} verification mismatches", problems.len()).into())
}

fn emit(result: &ResultSet, format: OutputFormat) -> CliResult {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(result, format, &mut out)?;
    out.flush()?;
    Ok(())
}

fn emit_section(title: &str, result: &ResultSet, format: OutputFormat) -> CliResult {
    if format == OutputFormat::Table {
        println!("\n== {title} ==");
    }
    emit(result, format)
}
