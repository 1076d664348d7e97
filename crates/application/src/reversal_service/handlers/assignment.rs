use std::sync::Arc;

use async_trait::async_trait;
use rewind_core::{AppError, AppResult};
use rewind_domain::{AuditAction, AuditLogTarget};
use tracing::debug;

use crate::directory_ports::{AssignmentOutcome, AssignmentSubject, AssignmentUseCases};
use crate::{AuditTrailBuilder, AuditTrailError};

use super::super::RevertRequest;
use super::ActionHandler;

/// Undoes an assign or unassign by applying the opposite relation change
/// with the recorded id list.
pub struct AssignmentReversal {
    assignments: Arc<dyn AssignmentUseCases>,
}

impl AssignmentReversal {
    /// Creates the handler for one relation kind.
    #[must_use]
    pub fn new(assignments: Arc<dyn AssignmentUseCases>) -> Self {
        Self { assignments }
    }
}

#[async_trait]
impl ActionHandler for AssignmentReversal {
    async fn revert(
        &self,
        request: &RevertRequest,
        trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError> {
        let inverse = inverse_action(request)?;
        let subject = AssignmentSubject::new(request.entity_type()?, request.entity_id()?);
        let related_ids: Vec<String> = request.decode_backward_data()?;

        trail.update_parent_id(request.parent_id.clone());
        compensate_assignment(
            self.assignments.as_ref(),
            trail,
            request.target.clone(),
            subject,
            inverse,
            related_ids,
        )
        .await?;
        Ok(())
    }
}

pub(super) fn inverse_action(request: &RevertRequest) -> Result<AuditAction, AuditTrailError> {
    request.action.inverse_assignment().ok_or_else(|| {
        AuditTrailError::revert_failed_without_cause(
            request,
            format!("'{}' is not an assignment action", request.action),
        )
    })
}

/// Applies `action` to the subject and records one compensating entry when
/// the relation set changed.
///
/// Returns whether the relation set changed.
pub(super) async fn compensate_assignment(
    assignments: &dyn AssignmentUseCases,
    trail: &AuditTrailBuilder,
    target: AuditLogTarget,
    subject: AssignmentSubject,
    action: AuditAction,
    related_ids: Vec<String>,
) -> Result<bool, AuditTrailError> {
    match apply_assignment(assignments, action, &subject, &related_ids).await? {
        AssignmentOutcome::Changed { related_ids } => {
            trail
                .create_log(target, action, Some(&related_ids), Some(&related_ids))
                .await?;
            Ok(true)
        }
        AssignmentOutcome::Skipped { reason } => {
            debug!(
                entity_type = %subject.entity_type,
                entity_id = %subject.entity_id,
                action = %action,
                reason = %reason,
                "assignment compensation skipped"
            );
            Ok(false)
        }
    }
}

async fn apply_assignment(
    assignments: &dyn AssignmentUseCases,
    action: AuditAction,
    subject: &AssignmentSubject,
    related_ids: &[String],
) -> AppResult<AssignmentOutcome> {
    match action {
        AuditAction::AssignRoles | AuditAction::AssignPrivileges | AuditAction::AssignLabels => {
            assignments.assign(subject, related_ids).await
        }
        AuditAction::UnassignRoles
        | AuditAction::UnassignPrivileges
        | AuditAction::UnassignLabels => assignments.unassign(subject, related_ids).await,
        other => Err(AppError::Internal(format!(
            "'{other}' is not an assignment action"
        ))),
    }
}
