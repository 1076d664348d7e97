use async_trait::async_trait;
use rewind_application::{AuditLogEntry, AuditLogStore, NewAuditLogEntry};
use rewind_core::{AppError, AppResult, AuditLogId};
use tokio::sync::RwLock;

/// In-memory audit log store with sequential ids.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every entry in creation order.
    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }
}

fn direct_children(entries: &[AuditLogEntry], id: &AuditLogId) -> Vec<AuditLogId> {
    entries
        .iter()
        .filter(|entry| entry.parent_id.as_ref() == Some(id))
        .map(|entry| entry.id.clone())
        .collect()
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn create(&self, entry: NewAuditLogEntry) -> AppResult<AuditLogId> {
        let mut entries = self.entries.write().await;

        if let Some(parent_id) = &entry.parent_id
            && !entries.iter().any(|existing| &existing.id == parent_id)
        {
            return Err(AppError::NotFound(format!(
                "parent audit log entry '{parent_id}' does not exist"
            )));
        }

        let id = AuditLogId::new((entries.len() + 1).to_string())?;
        entries.push(entry.into_entry(id.clone()));
        Ok(id)
    }

    async fn find(&self, id: &AuditLogId) -> AppResult<Option<AuditLogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|entry| &entry.id == id)
            .cloned())
    }

    async fn child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>> {
        Ok(direct_children(&self.entries.read().await, id))
    }

    async fn recursive_child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>> {
        let entries = self.entries.read().await;

        let mut ordered = Vec::new();
        let mut pending: Vec<AuditLogId> = direct_children(&entries, id).into_iter().rev().collect();
        while let Some(next) = pending.pop() {
            pending.extend(direct_children(&entries, &next).into_iter().rev());
            ordered.push(next);
        }

        Ok(ordered)
    }
}
