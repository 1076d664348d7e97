//! Hand-written fakes shared by the application tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rewind_core::{AppError, AppResult, AuditLogId};
use rewind_domain::{AuditAction, AuditLogTarget, AuditedEntity, Label, Privilege, Role, User};
use tokio::sync::Mutex;

use crate::{
    AssignmentOutcome, AssignmentSubject, AssignmentUseCases, AuditLogEntry, AuditLogStore,
    AuditTrailFactory, EntityUseCases, NewAuditLogEntry, RemoveOutcome, RestoreOutcome,
    ReversalDependencies,
};

pub(crate) fn audit_id(value: &str) -> AuditLogId {
    AuditLogId::new(value).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

#[derive(Default)]
pub(crate) struct FakeAuditLogStore {
    next_id: AtomicU64,
    entries: Mutex<Vec<AuditLogEntry>>,
    child_order: Mutex<HashMap<AuditLogId, Vec<AuditLogId>>>,
    fail_writes: AtomicBool,
}

impl FakeAuditLogStore {
    pub(crate) async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().await.clone()
    }

    pub(crate) async fn entries_after(&self, count: usize) -> Vec<AuditLogEntry> {
        self.entries.lock().await.iter().skip(count).cloned().collect()
    }

    pub(crate) async fn find_entry(&self, id: &AuditLogId) -> Option<AuditLogEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|entry| &entry.id == id)
            .cloned()
    }

    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub(crate) async fn override_recursive_children(
        &self,
        id: &AuditLogId,
        children: Vec<AuditLogId>,
    ) {
        self.child_order.lock().await.insert(id.clone(), children);
    }

    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Writes an entry directly, bypassing any builder.
    pub(crate) async fn seed(
        &self,
        target: AuditLogTarget,
        action: AuditAction,
        backward_data: Option<&str>,
        parent_id: Option<&AuditLogId>,
    ) -> AuditLogId {
        self.create(NewAuditLogEntry {
            target,
            action,
            backward_data: backward_data.map(str::to_owned),
            forward_data: None,
            timestamp: fixed_timestamp(),
            parent_id: parent_id.cloned(),
        })
        .await
        .unwrap_or_else(|_| unreachable!())
    }
}

#[async_trait]
impl AuditLogStore for FakeAuditLogStore {
    async fn create(&self, entry: NewAuditLogEntry) -> AppResult<AuditLogId> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }

        let id = audit_id(
            (self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
                .to_string()
                .as_str(),
        );
        self.entries.lock().await.push(entry.into_entry(id.clone()));
        Ok(id)
    }

    async fn find(&self, id: &AuditLogId) -> AppResult<Option<AuditLogEntry>> {
        Ok(self.find_entry(id).await)
    }

    async fn child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.parent_id.as_ref() == Some(id))
            .map(|entry| entry.id.clone())
            .collect())
    }

    async fn recursive_child_ids(&self, id: &AuditLogId) -> AppResult<Vec<AuditLogId>> {
        if let Some(children) = self.child_order.lock().await.get(id) {
            return Ok(children.clone());
        }

        let entries = self.entries.lock().await.clone();
        let mut ordered = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(parent) = stack.pop() {
            let children: Vec<AuditLogId> = entries
                .iter()
                .filter(|entry| entry.parent_id.as_ref() == Some(&parent))
                .map(|entry| entry.id.clone())
                .collect();
            if parent != *id {
                ordered.push(parent);
            }
            stack.extend(children.into_iter().rev());
        }
        Ok(ordered)
    }
}

pub(crate) struct FakeEntities<E> {
    live: Mutex<BTreeMap<String, E>>,
    calls: Mutex<Vec<String>>,
}

impl<E: AuditedEntity> FakeEntities<E> {
    pub(crate) fn new() -> Self {
        Self {
            live: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) async fn insert(&self, entity: E) {
        self.live
            .lock()
            .await
            .insert(entity.entity_id().to_owned(), entity);
    }

    pub(crate) async fn get(&self, id: &str) -> Option<E> {
        self.live.lock().await.get(id).cloned()
    }

    pub(crate) async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl<E: AuditedEntity> EntityUseCases<E> for FakeEntities<E> {
    async fn find(&self, id: &str) -> AppResult<Option<E>> {
        Ok(self.live.lock().await.get(id).cloned())
    }

    async fn update(&self, entity: E, _audit_parent_id: Option<AuditLogId>) -> AppResult<E> {
        self.calls
            .lock()
            .await
            .push(format!("update:{}", entity.entity_id()));
        self.live
            .lock()
            .await
            .insert(entity.entity_id().to_owned(), entity.clone());
        Ok(entity)
    }

    async fn remove(&self, id: &str) -> AppResult<RemoveOutcome> {
        self.calls.lock().await.push(format!("remove:{id}"));
        match self.live.lock().await.remove(id) {
            Some(_) => Ok(RemoveOutcome::Removed { id: id.to_owned() }),
            None => Ok(RemoveOutcome::Skipped {
                reason: "already absent".to_owned(),
            }),
        }
    }

    async fn restore(&self, snapshot: E) -> AppResult<RestoreOutcome<E>> {
        let id = snapshot.entity_id().to_owned();
        self.calls.lock().await.push(format!("restore:{id}"));
        let mut live = self.live.lock().await;
        if live.contains_key(&id) {
            return Ok(RestoreOutcome::Skipped {
                reason: "already present".to_owned(),
            });
        }
        live.insert(id.clone(), snapshot.clone());
        Ok(RestoreOutcome::Restored {
            timestamp: fixed_timestamp(),
            id,
            snapshot,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssignmentCall {
    pub(crate) operation: &'static str,
    pub(crate) subject: AssignmentSubject,
    pub(crate) related_ids: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeAssignments {
    relations: Mutex<BTreeMap<AssignmentSubject, BTreeSet<String>>>,
    calls: Mutex<Vec<AssignmentCall>>,
}

impl FakeAssignments {
    pub(crate) async fn calls(&self) -> Vec<AssignmentCall> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn related(&self, subject: &AssignmentSubject) -> Vec<String> {
        self.relations
            .lock()
            .await
            .get(subject)
            .map(|related| related.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) async fn set(&self, subject: AssignmentSubject, related_ids: &[&str]) {
        self.relations.lock().await.insert(
            subject,
            related_ids.iter().map(|id| (*id).to_owned()).collect(),
        );
    }

    async fn record(
        &self,
        operation: &'static str,
        subject: &AssignmentSubject,
        related_ids: &[String],
    ) {
        self.calls.lock().await.push(AssignmentCall {
            operation,
            subject: subject.clone(),
            related_ids: related_ids.to_vec(),
        });
    }
}

#[async_trait]
impl AssignmentUseCases for FakeAssignments {
    async fn assign(
        &self,
        subject: &AssignmentSubject,
        related_ids: &[String],
    ) -> AppResult<AssignmentOutcome> {
        self.record("assign", subject, related_ids).await;
        let mut relations = self.relations.lock().await;
        let related = relations.entry(subject.clone()).or_default();
        let mut changed = false;
        for id in related_ids {
            changed |= related.insert(id.clone());
        }
        Ok(outcome(changed, related_ids))
    }

    async fn unassign(
        &self,
        subject: &AssignmentSubject,
        related_ids: &[String],
    ) -> AppResult<AssignmentOutcome> {
        self.record("unassign", subject, related_ids).await;
        let mut relations = self.relations.lock().await;
        let related = relations.entry(subject.clone()).or_default();
        let mut changed = false;
        for id in related_ids {
            changed |= related.remove(id);
        }
        Ok(outcome(changed, related_ids))
    }
}

fn outcome(changed: bool, related_ids: &[String]) -> AssignmentOutcome {
    if changed {
        AssignmentOutcome::Changed {
            related_ids: related_ids.to_vec(),
        }
    } else {
        AssignmentOutcome::Skipped {
            reason: "relations already in requested state".to_owned(),
        }
    }
}

/// Fakes for every collaborator of the standard registry.
pub(crate) struct Fixture {
    pub(crate) store: Arc<FakeAuditLogStore>,
    pub(crate) users: Arc<FakeEntities<User>>,
    pub(crate) roles: Arc<FakeEntities<Role>>,
    pub(crate) privileges: Arc<FakeEntities<Privilege>>,
    pub(crate) labels: Arc<FakeEntities<Label>>,
    pub(crate) user_roles: Arc<FakeAssignments>,
    pub(crate) role_privileges: Arc<FakeAssignments>,
    pub(crate) entity_labels: Arc<FakeAssignments>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            store: Arc::new(FakeAuditLogStore::default()),
            users: Arc::new(FakeEntities::new()),
            roles: Arc::new(FakeEntities::new()),
            privileges: Arc::new(FakeEntities::new()),
            labels: Arc::new(FakeEntities::new()),
            user_roles: Arc::new(FakeAssignments::default()),
            role_privileges: Arc::new(FakeAssignments::default()),
            entity_labels: Arc::new(FakeAssignments::default()),
        }
    }

    pub(crate) fn dependencies(&self) -> ReversalDependencies {
        ReversalDependencies {
            audit_log_store: self.store.clone(),
            users: self.users.clone(),
            roles: self.roles.clone(),
            privileges: self.privileges.clone(),
            labels: self.labels.clone(),
            user_roles: self.user_roles.clone(),
            role_privileges: self.role_privileges.clone(),
            entity_labels: self.entity_labels.clone(),
        }
    }

    pub(crate) fn trail_factory(&self) -> AuditTrailFactory {
        AuditTrailFactory::new(self.store.clone())
    }
}
