use std::sync::Arc;

use async_trait::async_trait;
use rewind_domain::{AuditAction, AuditedEntity, apply_merge_patch};
use serde_json::Value;
use tracing::debug;

use crate::directory_ports::{EntityUseCases, RemoveOutcome, RestoreOutcome};
use crate::{AuditTrailBuilder, AuditTrailError, NO_PAYLOAD};

use super::super::RevertRequest;
use super::ActionHandler;

/// Undoes a create (or a restore) by removing the entity again.
///
/// The removal is authoritative history and is not logged here.
pub struct CreateReversal<E> {
    entities: Arc<dyn EntityUseCases<E>>,
}

impl<E: AuditedEntity> CreateReversal<E> {
    /// Creates the handler.
    #[must_use]
    pub fn new(entities: Arc<dyn EntityUseCases<E>>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl<E: AuditedEntity> ActionHandler for CreateReversal<E> {
    async fn revert(
        &self,
        request: &RevertRequest,
        _trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError> {
        let entity_id = request.entity_id()?;

        match self.entities.remove(entity_id).await? {
            RemoveOutcome::Removed { id } => {
                debug!(entity_type = %E::ENTITY_TYPE, entity_id = %id, "entity removed");
            }
            RemoveOutcome::Skipped { reason } => {
                debug!(
                    entity_type = %E::ENTITY_TYPE,
                    entity_id,
                    reason = %reason,
                    "removal skipped"
                );
            }
        }

        Ok(())
    }
}

/// Undoes a removal by restoring the recorded snapshot.
pub struct RemoveReversal<E> {
    entities: Arc<dyn EntityUseCases<E>>,
}

impl<E: AuditedEntity> RemoveReversal<E> {
    /// Creates the handler.
    #[must_use]
    pub fn new(entities: Arc<dyn EntityUseCases<E>>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl<E: AuditedEntity> ActionHandler for RemoveReversal<E> {
    async fn revert(
        &self,
        request: &RevertRequest,
        trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError> {
        let snapshot: E = request.decode_backward_data()?;

        trail.update_parent_id(request.parent_id.clone());
        restore_snapshot(self.entities.as_ref(), snapshot, trail).await?;
        Ok(())
    }
}

/// Restores one snapshot and records a `RESTORE` entry stamped with the
/// restore time when it took effect.
///
/// Returns whether a restoration happened.
pub(super) async fn restore_snapshot<E: AuditedEntity>(
    entities: &dyn EntityUseCases<E>,
    snapshot: E,
    trail: &AuditTrailBuilder,
) -> Result<bool, AuditTrailError> {
    match entities.restore(snapshot).await? {
        RestoreOutcome::Restored {
            timestamp,
            id,
            snapshot,
        } => {
            debug!(
                entity_type = %E::ENTITY_TYPE,
                entity_id = %id,
                restored_at = %timestamp,
                "entity restored"
            );
            trail
                .create_log_at(
                    timestamp,
                    snapshot.audit_target(),
                    AuditAction::Restore,
                    NO_PAYLOAD,
                    Some(&snapshot),
                )
                .await?;
            Ok(true)
        }
        RestoreOutcome::Skipped { reason } => {
            debug!(entity_type = %E::ENTITY_TYPE, reason = %reason, "restore skipped");
            Ok(false)
        }
    }
}

/// Undoes an update by applying the recorded reverse merge patch to the
/// current entity.
///
/// The live entity is patched as it is now; edits made after the original
/// update are not detected.
pub struct UpdateReversal<E> {
    entities: Arc<dyn EntityUseCases<E>>,
}

impl<E: AuditedEntity> UpdateReversal<E> {
    /// Creates the handler.
    #[must_use]
    pub fn new(entities: Arc<dyn EntityUseCases<E>>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl<E: AuditedEntity> ActionHandler for UpdateReversal<E> {
    async fn revert(
        &self,
        request: &RevertRequest,
        _trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError> {
        let entity_id = request.entity_id()?;
        let patch: Value = request.decode_backward_data()?;

        let Some(current) = self.entities.find(entity_id).await? else {
            return Err(AuditTrailError::revert_failed_without_cause(
                request,
                format!("{} '{entity_id}' not found", E::ENTITY_TYPE),
            ));
        };

        let current = serde_json::to_value(&current).map_err(|error| {
            AuditTrailError::revert_failed(request, "failed to serialize current entity", error)
        })?;
        let reverted: E = serde_json::from_value(apply_merge_patch(&current, &patch))
            .map_err(|error| {
                AuditTrailError::revert_failed(request, "patched entity is not valid", error)
            })?;

        self.entities
            .update(reverted, request.parent_id.clone())
            .await?;
        Ok(())
    }
}
