use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use rewind_application::{
    AssignmentOutcome, AssignmentSubject, AssignmentUseCases, AuditTrailFactory,
};
use rewind_core::{AppError, AppResult, AuditLogId};
use rewind_domain::{AuditAction, AuditLogTarget};
use tokio::sync::RwLock;
use tracing::debug;

/// Relation kinds kept by [`InMemoryAssignmentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Users holding roles.
    UserRoles,
    /// Roles granting privileges.
    RolePrivileges,
    /// Any entity carrying labels.
    EntityLabels,
}

impl RelationKind {
    fn assign_action(self) -> AuditAction {
        match self {
            Self::UserRoles => AuditAction::AssignRoles,
            Self::RolePrivileges => AuditAction::AssignPrivileges,
            Self::EntityLabels => AuditAction::AssignLabels,
        }
    }

    fn unassign_action(self) -> AuditAction {
        match self {
            Self::UserRoles => AuditAction::UnassignRoles,
            Self::RolePrivileges => AuditAction::UnassignPrivileges,
            Self::EntityLabels => AuditAction::UnassignLabels,
        }
    }

    /// Marker action used when one call touches several subjects.
    fn batch_action(self, assign: bool) -> Option<AuditAction> {
        match (self, assign) {
            (Self::EntityLabels, true) => Some(AuditAction::BatchAssignLabels),
            (Self::EntityLabels, false) => Some(AuditAction::BatchUnassignLabels),
            _ => None,
        }
    }
}

/// In-memory relation store with set semantics per subject.
pub struct InMemoryAssignmentStore {
    kind: RelationKind,
    relations: RwLock<BTreeMap<AssignmentSubject, BTreeSet<String>>>,
    audit_trail: AuditTrailFactory,
}

impl InMemoryAssignmentStore {
    /// Creates an empty relation store.
    #[must_use]
    pub fn new(kind: RelationKind, audit_trail: AuditTrailFactory) -> Self {
        Self {
            kind,
            relations: RwLock::new(BTreeMap::new()),
            audit_trail,
        }
    }

    /// Returns the ids related to the subject in sorted order.
    pub async fn related(&self, subject: &AssignmentSubject) -> Vec<String> {
        self.relations
            .read()
            .await
            .get(subject)
            .map(|related| related.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Assigns `related_ids` to every subject and records the change.
    ///
    /// Returns the id of the top-level entry written, if any.
    pub async fn assign_with_audit(
        &self,
        subjects: &[AssignmentSubject],
        related_ids: &[String],
        audit_parent_id: Option<AuditLogId>,
    ) -> AppResult<Option<AuditLogId>> {
        self.change_with_audit(subjects, related_ids, true, audit_parent_id)
            .await
    }

    /// Unassigns `related_ids` from every subject and records the change.
    ///
    /// Returns the id of the top-level entry written, if any.
    pub async fn unassign_with_audit(
        &self,
        subjects: &[AssignmentSubject],
        related_ids: &[String],
        audit_parent_id: Option<AuditLogId>,
    ) -> AppResult<Option<AuditLogId>> {
        self.change_with_audit(subjects, related_ids, false, audit_parent_id)
            .await
    }

    async fn change_with_audit(
        &self,
        subjects: &[AssignmentSubject],
        related_ids: &[String],
        assign: bool,
        audit_parent_id: Option<AuditLogId>,
    ) -> AppResult<Option<AuditLogId>> {
        let mut relations = self.relations.write().await;
        let mut planned: Vec<(&AssignmentSubject, Vec<String>)> = Vec::new();
        for subject in subjects {
            if planned.iter().any(|(seen, _)| *seen == subject) {
                continue;
            }
            let changes = pending_changes(relations.get(subject), related_ids, assign);
            if changes.is_empty() {
                debug!(
                    entity_type = %subject.entity_type,
                    entity_id = %subject.entity_id,
                    "relations already in the requested state"
                );
                continue;
            }
            planned.push((subject, changes));
        }

        let mut trail = self.audit_trail.begin(audit_parent_id);
        let marker_id = match (planned.len(), self.kind.batch_action(assign)) {
            (0 | 1, _) => None,
            (count, Some(batch_action)) => {
                trail.group_subjects(count, None, batch_action).await?
            }
            (count, None) => {
                return Err(AppError::Validation(format!(
                    "{:?} changes apply to one subject at a time, got {count}",
                    self.kind
                )));
            }
        };

        let action = if assign {
            self.kind.assign_action()
        } else {
            self.kind.unassign_action()
        };

        let mut last_entry_id = None;
        for (subject, changes) in planned {
            let entry_id = trail
                .create_log(
                    AuditLogTarget::entity(subject.entity_type, subject.entity_id.clone()),
                    action,
                    Some(&changes),
                    Some(&changes),
                )
                .await?;
            write_changes(&mut relations, subject, &changes, assign);
            last_entry_id = Some(entry_id);
        }

        Ok(marker_id.or(last_entry_id))
    }

    async fn apply(
        &self,
        subject: &AssignmentSubject,
        related_ids: &[String],
        assign: bool,
    ) -> AssignmentOutcome {
        let mut relations = self.relations.write().await;
        let changes = pending_changes(relations.get(subject), related_ids, assign);
        if changes.is_empty() {
            return AssignmentOutcome::Skipped {
                reason: format!(
                    "{} '{}' already in the requested state",
                    subject.entity_type, subject.entity_id
                ),
            };
        }

        write_changes(&mut relations, subject, &changes, assign);
        AssignmentOutcome::Changed {
            related_ids: changes,
        }
    }
}

/// Ids from `related_ids` that would actually flip, first occurrence only.
fn pending_changes(
    current: Option<&BTreeSet<String>>,
    related_ids: &[String],
    assign: bool,
) -> Vec<String> {
    let mut changes: Vec<String> = Vec::new();
    for id in related_ids {
        let held = current.is_some_and(|related| related.contains(id));
        if held != assign && !changes.contains(id) {
            changes.push(id.clone());
        }
    }
    changes
}

fn write_changes(
    relations: &mut BTreeMap<AssignmentSubject, BTreeSet<String>>,
    subject: &AssignmentSubject,
    changes: &[String],
    assign: bool,
) {
    let related = relations.entry(subject.clone()).or_default();
    for id in changes {
        if assign {
            related.insert(id.clone());
        } else {
            related.remove(id);
        }
    }
}

#[async_trait]
impl AssignmentUseCases for InMemoryAssignmentStore {
    async fn assign(
        &self,
        subject: &AssignmentSubject,
        related_ids: &[String],
    ) -> AppResult<AssignmentOutcome> {
        Ok(self.apply(subject, related_ids, true).await)
    }

    async fn unassign(
        &self,
        subject: &AssignmentSubject,
        related_ids: &[String],
    ) -> AppResult<AssignmentOutcome> {
        Ok(self.apply(subject, related_ids, false).await)
    }
}
