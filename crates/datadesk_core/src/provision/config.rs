//! Provisioning configuration and validation.
//!
//! # Invariants
//! - Every identifier that reaches SQL text matched `IDENTIFIER_RE`.
//! - Every user belongs to a declared group.
//! - Role names (groups and users) are unique.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("valid identifier regex"));

const MAX_VARCHAR_LEN: usize = 10_485_760;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    /// Identifiers are restricted to lowercase ASCII, digits and `_`.
    InvalidIdentifier { field: &'static str, value: String },
    UnknownGroup { user: String, group: String },
    DuplicateRole(String),
    InvalidDescriptionLength(usize),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidIdentifier { field, value } => {
                write!(f, "invalid identifier `{value}` for `{field}`")
            }
            Self::UnknownGroup { user, group } => {
                write!(f, "user `{user}` references undeclared group `{group}`")
            }
            Self::DuplicateRole(name) => write!(f, "role `{name}` is declared more than once"),
            Self::InvalidDescriptionLength(len) => write!(
                f,
                "description length {len} must be between 1 and {MAX_VARCHAR_LEN}"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Table privilege granted to a group role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TablePrivilege {
    Select,
    Insert,
    Update,
    Delete,
}

impl TablePrivilege {
    pub fn keyword(self) -> &'static str {
        match self {
            TablePrivilege::Select => "SELECT",
            TablePrivilege::Insert => "INSERT",
            TablePrivilege::Update => "UPDATE",
            TablePrivilege::Delete => "DELETE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SELECT" => Some(TablePrivilege::Select),
            "INSERT" => Some(TablePrivilege::Insert),
            "UPDATE" => Some(TablePrivilege::Update),
            "DELETE" => Some(TablePrivilege::Delete),
            _ => None,
        }
    }
}

/// Server connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Database used before the target database exists.
    pub maintenance_db: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            maintenance_db: "postgres".to_string(),
        }
    }
}

/// NOLOGIN group role and the table privileges it receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub privileges: Vec<TablePrivilege>,
}

/// Login role placed in one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    pub group: String,
}

/// Full provisioning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub connection: ConnectionConfig,
    pub database: String,
    pub schema: String,
    pub table: String,
    pub enum_type: String,
    /// Width of the `description` VARCHAR column.
    pub description_max_len: usize,
    pub csv_path: PathBuf,
    pub groups: Vec<GroupSpec>,
    pub users: Vec<UserSpec>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            database: "crime_db".to_string(),
            schema: "crimes".to_string(),
            table: "boston_crimes".to_string(),
            enum_type: "weekday".to_string(),
            description_max_len: 100,
            csv_path: PathBuf::from("boston.csv"),
            groups: vec![
                GroupSpec {
                    name: "readonly".to_string(),
                    privileges: vec![TablePrivilege::Select],
                },
                GroupSpec {
                    name: "readwrite".to_string(),
                    privileges: vec![
                        TablePrivilege::Select,
                        TablePrivilege::Insert,
                        TablePrivilege::Delete,
                        TablePrivilege::Update,
                    ],
                },
            ],
            users: vec![
                UserSpec {
                    name: "data_analyst".to_string(),
                    password: None,
                    group: "readonly".to_string(),
                },
                UserSpec {
                    name: "data_scientist".to_string(),
                    password: None,
                    group: "readwrite".to_string(),
                },
            ],
        }
    }
}

impl ProvisionConfig {
    /// Reads and validates a JSON config; absent keys take default values.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks identifier syntax and role references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_identifier("database", &self.database)?;
        check_identifier("schema", &self.schema)?;
        check_identifier("table", &self.table)?;
        check_identifier("enum_type", &self.enum_type)?;

        if self.description_max_len == 0 || self.description_max_len > MAX_VARCHAR_LEN {
            return Err(ConfigError::InvalidDescriptionLength(
                self.description_max_len,
            ));
        }

        let mut roles = BTreeSet::new();
        for group in &self.groups {
            check_identifier("groups.name", &group.name)?;
            if !roles.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateRole(group.name.clone()));
            }
        }
        for user in &self.users {
            check_identifier("users.name", &user.name)?;
            if !roles.insert(user.name.as_str()) {
                return Err(ConfigError::DuplicateRole(user.name.clone()));
            }
            if !self.groups.iter().any(|group| group.name == user.group) {
                return Err(ConfigError::UnknownGroup {
                    user: user.name.clone(),
                    group: user.group.clone(),
                });
            }
        }

        Ok(())
    }

    /// Group names followed by user names, in declaration order.
    pub fn role_names(&self) -> Vec<&str> {
        self.groups
            .iter()
            .map(|group| group.name.as_str())
            .chain(self.users.iter().map(|user| user.name.as_str()))
            .collect()
    }

    /// Schema-qualified table name.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if IDENTIFIER_RE.is_match(value) {
        return Ok(());
    }
    Err(ConfigError::InvalidIdentifier {
        field,
        value: value.to_string(),
    })
}
