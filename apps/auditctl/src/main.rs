//! Audit trail maintenance command line.

#![forbid(unsafe_code)]

mod config;

use std::env;
use std::sync::Arc;

use rewind_application::{AuditTree, AuditTreeService};
use rewind_core::{AppError, AppResult, AuditLogId};
use rewind_infrastructure::PostgresAuditLogStore;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::{AuditCtlConfig, Command, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = Command::parse(env::args().skip(1))?;
    let config = AuditCtlConfig::load()?;
    let pool = connect_pool(&config).await?;

    match command {
        Command::Migrate => migrate(&pool).await,
        Command::Tree(id) => print_tree(pool, &id).await,
    }
}

async fn connect_pool(config: &AuditCtlConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

async fn migrate(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    info!("database migrations applied successfully");
    Ok(())
}

async fn print_tree(pool: PgPool, id: &AuditLogId) -> AppResult<()> {
    let service = AuditTreeService::new(Arc::new(PostgresAuditLogStore::new(pool)));
    let tree = service.load_tree(id).await?;

    for line in render_tree(&tree) {
        println!("{line}");
    }
    info!(audit_log_id = %id, entries = tree.size(), "audit tree loaded");
    Ok(())
}

fn render_tree(tree: &AuditTree) -> Vec<String> {
    tree.flatten()
        .into_iter()
        .map(|(depth, entry)| {
            let subject = match (entry.target.entity_type(), entry.target.entity_id()) {
                (Some(entity_type), Some(entity_id)) => format!("{entity_type} '{entity_id}'"),
                (Some(entity_type), None) => format!("{entity_type} batch"),
                (None, _) => "batch".to_owned(),
            };
            format!(
                "{indent}{id} {action} {subject} at {timestamp}",
                indent = "  ".repeat(depth),
                id = entry.id,
                action = entry.action,
                timestamp = entry.timestamp.to_rfc3339(),
            )
        })
        .collect()
}
