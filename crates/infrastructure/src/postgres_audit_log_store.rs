use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rewind_application::{AuditLogEntry, AuditLogStore, NewAuditLogEntry};
use rewind_core::{AppError, AppResult, AuditLogId};
use rewind_domain::{AuditAction, AuditLogTarget, EntityType};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed audit log store.
///
/// Ids are UUIDs; the `sequence` column orders siblings by creation.
#[derive(Clone)]
pub struct PostgresAuditLogStore {
    pool: PgPool,
}

impl PostgresAuditLogStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditTrailRow {
    id: Uuid,
    entity_type: Option<String>,
    entity_id: Option<String>,
    display_name: Option<String>,
    action: String,
    backward_data: Option<String>,
    forward_data: Option<String>,
    created_at: DateTime<Utc>,
    parent_id: Option<Uuid>,
}

impl TryFrom<AuditTrailRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditTrailRow) -> Result<Self, Self::Error> {
        let entity_type = row
            .entity_type
            .as_deref()
            .map(EntityType::from_str)
            .transpose()?;

        Ok(Self {
            id: AuditLogId::new(row.id.to_string())?,
            target: AuditLogTarget::from_parts(entity_type, row.entity_id, row.display_name),
            action: AuditAction::from_str(row.action.as_str())?,
            backward_data: row.backward_data,
            forward_data: row.forward_data,
            timestamp: row.created_at,
            parent_id: row
                .parent_id
                .map(|parent_id| AuditLogId::new(parent_id.to_string()))
                .transpose()?,
        })
    }
}

/// Parses a stored id; ids that are not UUIDs cannot exist in this store.
fn parse_id(id: &AuditLogId) -> Option<Uuid> {
    Uuid::parse_str(id.as_str()).ok()
}

fn ids_from_rows(rows: Vec<(Uuid,)>) -> AppResult<Vec<AuditLogId>> {
    rows.into_iter()
        .map(|(id,)| AuditLogId::new(id.to_string()))
        .collect()
}

#[async_trait]
impl AuditLogStore for PostgresAuditLogStore {
    async fn create(&self, entry: NewAuditLogEntry) -> AppResult<AuditLogId> {
        let parent_id = match &entry.parent_id {
            Some(parent_id) => Some(parse_id(parent_id).ok_or_else(|| {
                AppError::NotFound(format!(
                    "parent audit log entry '{parent_id}' does not exist"
                ))
            })?),
            None => None,
        };

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO audit_trail_entries (
                id,
                entity_type,
                entity_id,
                display_name,
                action,
                backward_data,
                forward_data,
                created_at,
                parent_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(entry.target.entity_type().map(|entity_type| entity_type.as_str()))
        .bind(entry.target.entity_id())
        .bind(entry.target.display_name())
        .bind(entry.action.as_str())
        .bind(entry.backward_data.as_deref())
        .bind(entry.forward_data.as_deref())
        .bind(entry.timestamp)
        .bind(parent_id)
        .execute(&self.pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(database_error) if database_error.is_foreign_key_violation() => {
                AppError::NotFound(format!(
                    "parent audit log entry '{}' does not exist",
                    entry
                        .parent_id
                        .as_ref()
                        .map(AuditLogId::as_str)
                        .unwrap_or_default()
                ))
            }
            error => AppError::Internal(format!("failed to create audit log entry: {error}")),
        })?;

        AuditLogId::new(id.to_string())
    }

    async fn find(&self, id: &AuditLogId) -> AppResult<Option<AuditLogEntry>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, AuditTrailRow>(
            r#"
            SELECT
                id,
                entity_type,
                entity_id,
                display_name,
                action,
                backward_data,
                forward_data,
                created_at,
                parent_id
            FROM audit_trail_entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find audit log entry: {error}")))?;

        row.map(AuditLogEntry::try_from).transpose()
    }

    async fn child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>> {
        let Some(id) = parse_id(id) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, (Uuid,)>(
            r#"
            SELECT id
            FROM audit_trail_entries
            WHERE parent_id = $1
            ORDER BY sequence
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log children: {error}"))
        })?;

        ids_from_rows(rows)
    }

    async fn recursive_child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>> {
        let Some(id) = parse_id(id) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, (Uuid,)>(
            r#"
            WITH RECURSIVE descendants (id, path) AS (
                SELECT id, ARRAY[sequence]
                FROM audit_trail_entries
                WHERE parent_id = $1
                UNION ALL
                SELECT child.id, descendants.path || child.sequence
                FROM audit_trail_entries child
                INNER JOIN descendants ON child.parent_id = descendants.id
            )
            SELECT id
            FROM descendants
            ORDER BY path
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log descendants: {error}"))
        })?;

        ids_from_rows(rows)
    }
}
