use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rewind_core::{AppResult, AuditLogId};
use rewind_domain::AuditedEntity;

/// Result of restoring an entity from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome<E> {
    /// The entity was recreated.
    Restored {
        /// Time the restore took effect.
        timestamp: DateTime<Utc>,
        /// Identifier of the restored entity.
        id: String,
        /// State after the restore.
        snapshot: E,
    },
    /// Nothing was restored.
    Skipped {
        /// Why the restore was a no-op.
        reason: String,
    },
}

/// Result of removing an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The entity no longer exists.
    Removed {
        /// Identifier of the removed entity.
        id: String,
    },
    /// Nothing was removed.
    Skipped {
        /// Why the removal was a no-op.
        reason: String,
    },
}

/// Domain use cases for one entity kind.
///
/// Implementations own their persistence and authorization; `update` also
/// owns logging of its forward `UPDATE` entry under `audit_parent_id`.
#[async_trait]
pub trait EntityUseCases<E: AuditedEntity>: Send + Sync {
    /// Finds the live entity by id.
    async fn find(&self, id: &str) -> AppResult<Option<E>>;

    /// Replaces the live entity with `entity`.
    async fn update(&self, entity: E, audit_parent_id: Option<AuditLogId>) -> AppResult<E>;

    /// Removes the entity by id.
    async fn remove(&self, id: &str) -> AppResult<RemoveOutcome>;

    /// Recreates the entity from a snapshot.
    async fn restore(&self, snapshot: E) -> AppResult<RestoreOutcome<E>>;
}
