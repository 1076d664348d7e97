use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rewind_application::{
    AuditTrailFactory, EntityUseCases, NO_PAYLOAD, RemoveOutcome, RestoreOutcome,
};
use rewind_core::{AppError, AppResult, AuditLogId};
use rewind_domain::{AuditAction, AuditedEntity, reverse_merge_patch};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory entity store that records its own forward audit entries.
pub struct InMemoryEntityStore<E> {
    entities: RwLock<BTreeMap<String, E>>,
    audit_trail: AuditTrailFactory,
}

impl<E: AuditedEntity> InMemoryEntityStore<E> {
    /// Creates an empty store writing audit entries through `audit_trail`.
    #[must_use]
    pub fn new(audit_trail: AuditTrailFactory) -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            audit_trail,
        }
    }

    /// Returns the live entity with the given id.
    pub async fn get(&self, id: &str) -> Option<E> {
        self.entities.read().await.get(id).cloned()
    }

    /// Returns every live entity ordered by id.
    pub async fn list(&self) -> Vec<E> {
        self.entities.read().await.values().cloned().collect()
    }

    /// Adds an entity and records a `CREATE` entry.
    pub async fn create(
        &self,
        entity: E,
        audit_parent_id: Option<AuditLogId>,
    ) -> AppResult<AuditLogId> {
        let mut entities = self.entities.write().await;
        if entities.contains_key(entity.entity_id()) {
            return Err(AppError::Conflict(format!(
                "{} '{}' already exists",
                E::ENTITY_TYPE,
                entity.entity_id()
            )));
        }

        let trail = self.audit_trail.begin(audit_parent_id);
        let audit_log_id = trail
            .create_log(
                entity.audit_target(),
                AuditAction::Create,
                NO_PAYLOAD,
                Some(&entity),
            )
            .await?;
        entities.insert(entity.entity_id().to_owned(), entity);
        Ok(audit_log_id)
    }

    /// Removes the entities and records one `REMOVE` entry per removal,
    /// grouped under a `BATCH_REMOVE` marker when more than one entity is
    /// actually removed.
    ///
    /// Repeated and absent ids are ignored. A built-in entity anywhere in
    /// `ids` rejects the whole call before anything is written.
    ///
    /// Returns the marker id, or the single entry id, or `None` when nothing
    /// was recorded.
    pub async fn remove_with_audit(
        &self,
        ids: &[String],
        audit_parent_id: Option<AuditLogId>,
    ) -> AppResult<Option<AuditLogId>> {
        let mut entities = self.entities.write().await;
        let mut present: Vec<&String> = Vec::with_capacity(ids.len());
        for id in ids {
            if present.contains(&id) {
                continue;
            }
            match entities.get(id) {
                None => {
                    debug!(entity_type = %E::ENTITY_TYPE, entity_id = %id, "entity already absent");
                }
                Some(entity) if entity.is_protected() => {
                    return Err(AppError::Conflict(format!(
                        "{} '{id}' is built-in and cannot be removed",
                        E::ENTITY_TYPE
                    )));
                }
                Some(_) => present.push(id),
            }
        }

        let mut trail = self.audit_trail.begin(audit_parent_id);
        let marker_id = trail
            .group_subjects(present.len(), Some(E::ENTITY_TYPE), AuditAction::BatchRemove)
            .await?;

        let mut last_entry_id = None;
        for id in present {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            let entry_id = trail
                .create_log(
                    entity.audit_target(),
                    AuditAction::Remove,
                    Some(entity),
                    NO_PAYLOAD,
                )
                .await?;
            entities.remove(id);
            last_entry_id = Some(entry_id);
        }

        Ok(marker_id.or(last_entry_id))
    }
}

fn to_document<E: AuditedEntity>(entity: &E) -> AppResult<Value> {
    serde_json::to_value(entity).map_err(|error| {
        AppError::Internal(format!(
            "failed to serialize {} '{}': {error}",
            E::ENTITY_TYPE,
            entity.entity_id()
        ))
    })
}

#[async_trait]
impl<E: AuditedEntity> EntityUseCases<E> for InMemoryEntityStore<E> {
    async fn find(&self, id: &str) -> AppResult<Option<E>> {
        Ok(self.get(id).await)
    }

    async fn update(&self, entity: E, audit_parent_id: Option<AuditLogId>) -> AppResult<E> {
        let mut entities = self.entities.write().await;
        let Some(current) = entities.get(entity.entity_id()) else {
            return Err(AppError::NotFound(format!(
                "{} '{}' does not exist",
                E::ENTITY_TYPE,
                entity.entity_id()
            )));
        };

        let before = to_document(current)?;
        let after = to_document(&entity)?;
        if before == after {
            return Ok(entity);
        }

        let trail = self.audit_trail.begin(audit_parent_id);
        trail
            .create_log(
                entity.audit_target(),
                AuditAction::Update,
                Some(&reverse_merge_patch(&before, &after)),
                Some(&reverse_merge_patch(&after, &before)),
            )
            .await?;
        entities.insert(entity.entity_id().to_owned(), entity.clone());
        Ok(entity)
    }

    async fn remove(&self, id: &str) -> AppResult<RemoveOutcome> {
        let mut entities = self.entities.write().await;
        match entities.get(id) {
            None => Ok(RemoveOutcome::Skipped {
                reason: format!("{} '{id}' does not exist", E::ENTITY_TYPE),
            }),
            Some(entity) if entity.is_protected() => Ok(RemoveOutcome::Skipped {
                reason: format!("{} '{id}' is built-in", E::ENTITY_TYPE),
            }),
            Some(_) => {
                entities.remove(id);
                Ok(RemoveOutcome::Removed { id: id.to_owned() })
            }
        }
    }

    async fn restore(&self, snapshot: E) -> AppResult<RestoreOutcome<E>> {
        let id = snapshot.entity_id().to_owned();
        if snapshot.is_protected() {
            return Ok(RestoreOutcome::Skipped {
                reason: format!("{} '{id}' is built-in", E::ENTITY_TYPE),
            });
        }

        let mut entities = self.entities.write().await;
        if entities.contains_key(&id) {
            return Ok(RestoreOutcome::Skipped {
                reason: format!("{} '{id}' already exists", E::ENTITY_TYPE),
            });
        }

        entities.insert(id.clone(), snapshot.clone());
        Ok(RestoreOutcome::Restored {
            timestamp: Utc::now(),
            id,
            snapshot,
        })
    }
}
