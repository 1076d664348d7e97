//! Entry point that reverts one or more recorded audit entries.

use std::sync::Arc;

use rewind_core::AuditLogId;
use rewind_domain::AuditAction;
use tracing::{info, instrument, warn};

use crate::audit_ports::AuditLogStore;
use crate::reversal_service::{ReversalRegistry, RevertRequest};
use crate::{AuditTrailBuilder, AuditTrailError, AuditTrailFactory};

/// Application service reverting audit log entries through the registry.
#[derive(Clone)]
pub struct RevertActionsService {
    audit_log_store: Arc<dyn AuditLogStore>,
    registry: Arc<ReversalRegistry>,
    trail_factory: AuditTrailFactory,
}

impl RevertActionsService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        audit_log_store: Arc<dyn AuditLogStore>,
        registry: Arc<ReversalRegistry>,
        trail_factory: AuditTrailFactory,
    ) -> Self {
        Self {
            audit_log_store,
            registry,
            trail_factory,
        }
    }

    /// Reverts the entries in the given order, filing compensation under
    /// `audit_parent_id`.
    ///
    /// More than one id groups the compensation under a `REVERT_BATCH`
    /// marker. The first failure aborts the remaining ids.
    pub async fn revert(
        &self,
        audit_log_ids: &[AuditLogId],
        audit_parent_id: Option<AuditLogId>,
    ) -> Result<(), AuditTrailError> {
        let mut trail = self.trail_factory.begin(audit_parent_id);
        self.revert_with_trail(&mut trail, audit_log_ids).await
    }

    /// Reverts the entries inside an already running audit session.
    #[instrument(skip_all, fields(count = audit_log_ids.len()))]
    pub async fn revert_with_trail(
        &self,
        trail: &mut AuditTrailBuilder,
        audit_log_ids: &[AuditLogId],
    ) -> Result<(), AuditTrailError> {
        trail
            .group_subjects(audit_log_ids.len(), None, AuditAction::RevertBatch)
            .await?;
        let effective_parent_id = trail.parent_id().cloned();

        for audit_log_id in audit_log_ids {
            if let Err(error) = self
                .revert_one(trail, audit_log_id, effective_parent_id.clone())
                .await
            {
                warn!(audit_log_id = %audit_log_id, error = %error, "revert aborted");
                return Err(error);
            }
        }

        info!(
            parent_id = ?effective_parent_id.as_ref().map(AuditLogId::as_str),
            "audit log entries reverted"
        );
        Ok(())
    }

    async fn revert_one(
        &self,
        trail: &mut AuditTrailBuilder,
        audit_log_id: &AuditLogId,
        parent_id: Option<AuditLogId>,
    ) -> Result<(), AuditTrailError> {
        let entry = self
            .audit_log_store
            .find(audit_log_id)
            .await?
            .ok_or_else(|| AuditTrailError::AuditEntryNotFound(audit_log_id.clone()))?;

        let handler = self.registry.handler_for_target(&entry.target)?;
        handler
            .revert(&RevertRequest::from_entry(entry, parent_id), trail)
            .await
    }
}
