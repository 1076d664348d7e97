use std::env;

use rewind_core::{AppError, AppResult, AuditLogId};
use tracing_subscriber::EnvFilter;

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct AuditCtlConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl AuditCtlConfig {
    pub fn load() -> AppResult<Self> {
        let database_url = required_non_empty_env("DATABASE_URL")?;
        let max_connections = parse_env_u32("AUDIT_DB_MAX_CONNECTIONS", 5)?;

        if max_connections == 0 {
            return Err(AppError::Validation(
                "AUDIT_DB_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

/// Subcommand selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Applies pending migrations.
    Migrate,
    /// Prints the audit tree rooted at one entry.
    Tree(AuditLogId),
}

impl Command {
    pub fn parse(mut args: impl Iterator<Item = String>) -> AppResult<Self> {
        match args.next().as_deref() {
            Some("migrate") => Ok(Self::Migrate),
            Some("tree") => {
                let id = args.next().ok_or_else(|| {
                    AppError::Validation("usage: auditctl tree <audit-log-id>".to_owned())
                })?;
                Ok(Self::Tree(AuditLogId::new(id)?))
            }
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'migrate' or 'tree'"
            ))),
            None => Err(AppError::Validation(
                "usage: auditctl <migrate | tree <audit-log-id>>".to_owned(),
            )),
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty_env(name: &str) -> AppResult<String> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
