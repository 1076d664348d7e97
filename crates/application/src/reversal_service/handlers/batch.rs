use std::sync::Arc;

use async_trait::async_trait;
use rewind_core::AuditLogId;
use rewind_domain::{AuditAction, AuditedEntity, EntityType};
use tracing::{debug, info, instrument};

use crate::audit_ports::{AuditLogEntry, AuditLogStore};
use crate::directory_ports::{AssignmentSubject, AssignmentUseCases, EntityUseCases};
use crate::{AuditTrailBuilder, AuditTrailError};

use super::super::RevertRequest;
use super::ActionHandler;
use super::assignment::{compensate_assignment, inverse_action};
use super::lifecycle::restore_snapshot;

/// Undoes a batch removal by restoring every descendant `REMOVE` entry.
pub struct BatchRemoveReversal<E> {
    audit_log_store: Arc<dyn AuditLogStore>,
    entities: Arc<dyn EntityUseCases<E>>,
}

impl<E: AuditedEntity> BatchRemoveReversal<E> {
    /// Creates the handler.
    #[must_use]
    pub fn new(
        audit_log_store: Arc<dyn AuditLogStore>,
        entities: Arc<dyn EntityUseCases<E>>,
    ) -> Self {
        Self {
            audit_log_store,
            entities,
        }
    }
}

#[async_trait]
impl<E: AuditedEntity> ActionHandler for BatchRemoveReversal<E> {
    #[instrument(skip_all, fields(audit_log_id = %request.id, entity_type = %E::ENTITY_TYPE))]
    async fn revert(
        &self,
        request: &RevertRequest,
        trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError> {
        let children = load_children(self.audit_log_store.as_ref(), request).await?;
        if children.is_empty() {
            debug!("batch marker has no children");
            return Ok(());
        }

        let marker_id = open_revert_batch(
            trail,
            request,
            Some(E::ENTITY_TYPE),
            AuditAction::RevertBatchRemove,
        )
        .await?;

        let mut restored = 0_usize;
        for child in children {
            let child_request = child_revert_request(child, &marker_id, AuditAction::Remove)?;
            let Some(child_request) = child_request else {
                continue;
            };

            let snapshot: E = child_request.decode_backward_data()?;
            if restore_snapshot(self.entities.as_ref(), snapshot, trail).await? {
                restored += 1;
            }
        }

        info!(restored, "batch removal reverted");
        Ok(())
    }
}

/// Undoes a batch of label assignments (or removals) recorded against
/// heterogeneous entities.
pub struct BatchAssignmentReversal {
    audit_log_store: Arc<dyn AuditLogStore>,
    assignments: Arc<dyn AssignmentUseCases>,
}

impl BatchAssignmentReversal {
    /// Creates the handler for one relation kind.
    #[must_use]
    pub fn new(
        audit_log_store: Arc<dyn AuditLogStore>,
        assignments: Arc<dyn AssignmentUseCases>,
    ) -> Self {
        Self {
            audit_log_store,
            assignments,
        }
    }
}

#[async_trait]
impl ActionHandler for BatchAssignmentReversal {
    #[instrument(skip_all, fields(audit_log_id = %request.id, action = %request.action))]
    async fn revert(
        &self,
        request: &RevertRequest,
        trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError> {
        let (child_action, marker_action) = match request.action {
            AuditAction::BatchAssignLabels => (
                AuditAction::AssignLabels,
                AuditAction::RevertBatchAssignLabels,
            ),
            AuditAction::BatchUnassignLabels => (
                AuditAction::UnassignLabels,
                AuditAction::RevertBatchUnassignLabels,
            ),
            other => {
                return Err(AuditTrailError::revert_failed_without_cause(
                    request,
                    format!("'{other}' is not a batch assignment action"),
                ));
            }
        };

        let children = load_children(self.audit_log_store.as_ref(), request).await?;
        if children.is_empty() {
            debug!("batch marker has no children");
            return Ok(());
        }

        let marker_id =
            open_revert_batch(trail, request, request.target.entity_type(), marker_action).await?;

        let mut changed = 0_usize;
        for child in children {
            let Some(child_request) = child_revert_request(child, &marker_id, child_action)? else {
                continue;
            };

            let inverse = inverse_action(&child_request)?;
            let subject = AssignmentSubject::new(
                child_request.entity_type()?,
                child_request.entity_id()?,
            );
            let related_ids: Vec<String> = child_request.decode_backward_data()?;

            if compensate_assignment(
                self.assignments.as_ref(),
                trail,
                child_request.target.clone(),
                subject,
                inverse,
                related_ids,
            )
            .await?
            {
                changed += 1;
            }
        }

        info!(changed, "batch assignment reverted");
        Ok(())
    }
}

/// Loads every descendant of the batch marker in store order.
async fn load_children(
    audit_log_store: &dyn AuditLogStore,
    request: &RevertRequest,
) -> Result<Vec<AuditLogEntry>, AuditTrailError> {
    let child_ids = audit_log_store.recursive_child_ids(&request.id).await?;

    let mut children = Vec::with_capacity(child_ids.len());
    for child_id in child_ids {
        let Some(child) = audit_log_store.find(&child_id).await? else {
            return Err(AuditTrailError::revert_failed_without_cause(
                request,
                format!("child audit log entry '{child_id}' not found"),
            ));
        };
        children.push(child);
    }

    Ok(children)
}

/// Writes the outer revert marker under the request parent and rebinds the
/// trail to it.
async fn open_revert_batch(
    trail: &mut AuditTrailBuilder,
    request: &RevertRequest,
    entity_type: Option<EntityType>,
    marker_action: AuditAction,
) -> Result<AuditLogId, AuditTrailError> {
    trail.update_parent_id(request.parent_id.clone());
    let marker_id = trail.create_batch_log(entity_type, marker_action).await?;
    trail.update_parent_id(Some(marker_id.clone()));
    Ok(marker_id)
}

/// Builds the request for one child, skipping nested markers.
fn child_revert_request(
    child: AuditLogEntry,
    marker_id: &AuditLogId,
    expected_action: AuditAction,
) -> Result<Option<RevertRequest>, AuditTrailError> {
    if child.target.is_batch_marker() {
        return Ok(None);
    }

    let request = RevertRequest::from_entry(child, Some(marker_id.clone()));
    if request.action != expected_action {
        return Err(AuditTrailError::revert_failed_without_cause(
            &request,
            format!(
                "expected a '{expected_action}' child entry, found '{}'",
                request.action
            ),
        ));
    }

    Ok(Some(request))
}
