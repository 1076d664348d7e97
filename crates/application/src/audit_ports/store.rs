use async_trait::async_trait;
use rewind_core::{AppResult, AuditLogId};

use super::entries::{AuditLogEntry, NewAuditLogEntry};

/// Port for persisting and traversing audit log entries.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Persists one entry and returns its id.
    async fn create(&self, entry: NewAuditLogEntry) -> AppResult<AuditLogId>;

    /// Finds one entry by id.
    async fn find(&self, id: &AuditLogId) -> AppResult<Option<AuditLogEntry>>;

    /// Returns direct children in creation order.
    async fn child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>>;

    /// Returns every descendant in pre-order, children in creation order.
    async fn recursive_child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>>;
}
